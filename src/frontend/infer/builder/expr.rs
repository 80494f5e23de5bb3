//! 表达式的构建

use super::super::function::CallArgs;
use super::super::graph::{Graph, NodeId};
use super::super::ops::Op;
use super::super::value::{DictObj, Prim, SeqObj, TupleObj, Value, ValueId, ValueKey};
use super::super::Interpreter;
use super::stmt::const_str;
use super::{BuildCtx, FuncBody, Tag};
use crate::frontend::parser::ast::*;

impl Interpreter {
    /// 为表达式创建节点
    pub(crate) fn build_expr(
        &mut self,
        ctx: &mut BuildCtx,
        expr: &Expr,
    ) -> NodeId {
        let frame = ctx.frame;
        let line = expr.line;
        match &expr.kind {
            ExprKind::Name(name) => self.load_name(ctx, name, line),
            ExprKind::Const(constant) => {
                let prim = match constant {
                    Constant::Int(_) => Prim::Int,
                    Constant::Long(_) => Prim::Long,
                    Constant::Float(_) => Prim::Float,
                    Constant::Complex(_) => Prim::Complex,
                    Constant::Str(_) => Prim::Str,
                    Constant::Unicode(_) => Prim::Unicode,
                };
                self.prim_node(prim)
            }
            ExprKind::Call {
                func,
                args,
                keywords,
                star,
                dstar,
            } => {
                let callee = self.build_expr(ctx, func);
                let mut call = CallArgs::new(frame, line, expr.id);
                for arg in args {
                    let node = self.build_expr(ctx, arg);
                    call.args.push(node);
                    call.const_strs.push(const_str(arg));
                }
                for (keyword, value) in keywords {
                    let node = self.build_expr(ctx, value);
                    call.kwargs.push((keyword.clone(), node));
                }
                call.star = star.as_deref().map(|s| self.build_expr(ctx, s));
                call.dstar = dstar.as_deref().map(|s| self.build_expr(ctx, s));
                self.call_node(call, callee)
            }
            ExprKind::Attribute { value, attr } => {
                let obj = self.build_expr(ctx, value);
                self.attr_node(frame, line, expr.id, obj, attr, false)
            }
            ExprKind::Subscript { value, index } => {
                let obj = self.build_expr(ctx, value);
                let target = self.graph.new_node();
                if let ExprKind::SliceObj { .. } = index.kind {
                    self.build_expr(ctx, index);
                    self.attach(
                        obj,
                        Op::Slice {
                            frame,
                            line,
                            site: expr.id,
                            target,
                        },
                    );
                } else {
                    let index_node = self.build_expr(ctx, index);
                    self.attach(
                        obj,
                        Op::Subscript {
                            frame,
                            line,
                            index: index_node,
                            const_index: index.const_int(),
                            target,
                        },
                    );
                }
                target
            }
            ExprKind::Slice {
                value,
                lower,
                upper,
            } => {
                let obj = self.build_expr(ctx, value);
                for bound in lower.iter().chain(upper) {
                    let node = self.build_expr(ctx, bound);
                    self.check_arg(
                        frame,
                        line,
                        node,
                        super::super::checker::INT,
                        "slice index".to_string(),
                    );
                }
                let target = self.graph.new_node();
                self.attach(
                    obj,
                    Op::Slice {
                        frame,
                        line,
                        site: expr.id,
                        target,
                    },
                );
                target
            }
            ExprKind::SliceObj { lower, upper, step } => {
                for part in lower.iter().chain(upper).chain(step) {
                    self.build_expr(ctx, part);
                }
                self.prim_node(Prim::Object)
            }
            ExprKind::Tuple(items) => {
                let nodes = self.build_all(ctx, items);
                let tuple = self.literal_tuple(expr.id, nodes);
                self.graph.simple_node(tuple)
            }
            ExprKind::List(items) => {
                let nodes = self.build_all(ctx, items);
                let list = self.intern(ValueKey::Site(expr.id, "list"), |interp| {
                    Value::List(SeqObj {
                        elemall: interp.graph.new_node(),
                    })
                });
                self.feed_elements(list, &nodes);
                self.graph.simple_node(list)
            }
            ExprKind::Set(items) => {
                let nodes = self.build_all(ctx, items);
                let set = self.intern(ValueKey::Site(expr.id, "set"), |interp| Value::Set {
                    seq: SeqObj {
                        elemall: interp.graph.new_node(),
                    },
                    frozen: false,
                });
                self.feed_elements(set, &nodes);
                self.graph.simple_node(set)
            }
            ExprKind::Dict(pairs) => {
                let dict = self.intern(ValueKey::Site(expr.id, "dict"), |interp| {
                    Value::Dict(DictObj {
                        key: interp.graph.new_node(),
                        value: interp.graph.new_node(),
                    })
                });
                let (keys, values) = match self.value(dict) {
                    Value::Dict(d) => (d.key, d.value),
                    _ => return Graph::UNDEFINED,
                };
                for (k, v) in pairs {
                    let k = self.build_expr(ctx, k);
                    let v = self.build_expr(ctx, v);
                    self.graph.connect_nodes(k, keys);
                    self.graph.connect_nodes(v, values);
                }
                self.graph.simple_node(dict)
            }
            ExprKind::BinOp { op, left, right } => {
                let l = self.build_expr(ctx, left);
                let r = self.build_expr(ctx, right);
                self.binary_node(frame, line, expr.id, *op, l, r)
            }
            ExprKind::Compare { left, ops } => {
                self.build_expr(ctx, left);
                let comparisons: Vec<(CmpOp, NodeId)> = ops
                    .iter()
                    .map(|(op, right)| (*op, self.build_expr(ctx, right)))
                    .collect();
                self.compare_node(frame, line, &comparisons)
            }
            ExprKind::BoolOp { values, .. } => {
                // `and` / `or` 的结果是某个操作数
                let join = self.graph.new_node();
                for value in values {
                    let node = self.build_expr(ctx, value);
                    self.graph.connect_nodes(node, join);
                }
                join
            }
            ExprKind::UnaryOp { op, operand } => {
                let node = self.build_expr(ctx, operand);
                self.unary_node(frame, line, (*op).into(), node)
            }
            ExprKind::Lambda { args, body } => {
                let func = self.build_function(
                    ctx,
                    expr.id,
                    "<lambda>",
                    args,
                    FuncBody::Expr(&**body),
                    line,
                );
                self.graph.simple_node(func)
            }
            ExprKind::ListComp { elt, generators } => {
                let list = self.intern(ValueKey::Site(expr.id, "listcomp"), |interp| {
                    Value::List(SeqObj {
                        elemall: interp.graph.new_node(),
                    })
                });
                self.build_comprehension(ctx, generators);
                let node = self.build_expr(ctx, elt);
                self.feed_elements(list, &[node]);
                self.graph.simple_node(list)
            }
            ExprKind::GeneratorExp { elt, generators } => {
                let gen = self.site_generator(expr.id);
                self.build_comprehension(ctx, generators);
                let node = self.build_expr(ctx, elt);
                self.feed_elements(gen, &[node]);
                self.graph.simple_node(gen)
            }
            ExprKind::IfExp { test, body, orelse } => {
                self.build_expr(ctx, test);
                let join = self.graph.new_node();
                for branch in [body, orelse] {
                    let node = self.build_expr(ctx, branch);
                    self.graph.connect_nodes(node, join);
                }
                join
            }
            ExprKind::Backquote(inner) => {
                self.build_expr(ctx, inner);
                self.prim_node(Prim::Str)
            }
            ExprKind::Yield(value) => {
                let node = match value {
                    Some(value) => self.build_expr(ctx, value),
                    None => self.prim_node(Prim::None),
                };
                ctx.evals.push((Tag::Yield, node));
                match ctx.generator {
                    Some(gen) => match self.value(gen) {
                        Value::Generator(g) => {
                            let (elemall, sent) = (g.elemall, g.sent);
                            self.graph.connect_nodes(node, elemall);
                            sent
                        }
                        _ => Graph::UNDEFINED,
                    },
                    None => Graph::UNDEFINED,
                }
            }
        }
    }

    fn build_all(
        &mut self,
        ctx: &mut BuildCtx,
        items: &[Expr],
    ) -> Vec<NodeId> {
        items.iter().map(|item| self.build_expr(ctx, item)).collect()
    }

    /// 字面量元组：记住每个位置的元素
    fn literal_tuple(
        &mut self,
        site: AstId,
        nodes: Vec<NodeId>,
    ) -> ValueId {
        let elements = nodes.clone();
        let tuple = self.intern(ValueKey::Site(site, "tuple"), |interp| {
            Value::Tuple(TupleObj {
                elemall: interp.graph.new_node(),
                elements: Some(elements),
            })
        });
        self.feed_elements(tuple, &nodes);
        tuple
    }

    fn feed_elements(
        &mut self,
        seq: ValueId,
        nodes: &[NodeId],
    ) {
        let elemall = self.seq_elemall(seq);
        for &node in nodes {
            self.graph.connect_nodes(node, elemall);
        }
    }

    /// 推导式的 `for ... in ... if ...`，在当前作用域中展开
    fn build_comprehension(
        &mut self,
        ctx: &mut BuildCtx,
        generators: &[Comprehension],
    ) {
        for comp in generators {
            let src = self.build_expr(ctx, &comp.iter);
            let elems = self.iter_node(ctx.frame, comp.iter.line, src);
            self.build_target(ctx, &comp.target, elems);
            for cond in &comp.ifs {
                self.build_expr(ctx, cond);
            }
        }
    }
}
