//! 语句的构建

use super::super::aggregate::PROTOCOL_SITE;
use super::super::checker::PostCheck;
use super::super::errors::ErrorConfig;
use super::super::frame::{FrameKind, Handler};
use super::super::function::CallArgs;
use super::super::graph::NodeId;
use super::super::ops::Op;
use super::super::value::Prim;
use super::super::Interpreter;
use super::{BuildCtx, Tag};
use crate::frontend::parser::ast::*;

impl Interpreter {
    pub(crate) fn build_block(
        &mut self,
        ctx: &mut BuildCtx,
        body: &[Stmt],
    ) {
        for stmt in body {
            self.build_stmt(ctx, stmt);
        }
    }

    fn build_stmt(
        &mut self,
        ctx: &mut BuildCtx,
        stmt: &Stmt,
    ) {
        let line = stmt.line;
        match &stmt.kind {
            StmtKind::FunctionDef(def) => self.build_def(ctx, def),
            StmtKind::ClassDef(def) => self.build_class(ctx, def),
            StmtKind::If { test, body, orelse } | StmtKind::While { test, body, orelse } => {
                self.build_expr(ctx, test);
                self.build_block(ctx, body);
                self.build_block(ctx, orelse);
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let src = self.build_expr(ctx, iter);
                let elems = self.iter_node(ctx.frame, line, src);
                self.build_target(ctx, target, elems);
                self.build_block(ctx, body);
                self.build_block(ctx, orelse);
            }
            StmtKind::TryExcept {
                body,
                handlers,
                orelse,
            } => self.build_try(ctx, body, handlers, orelse, line),
            StmtKind::TryFinally { body, finalbody } => {
                self.build_block(ctx, body);
                self.build_block(ctx, finalbody);
            }
            StmtKind::Raise { expt, arg, traceback } => {
                self.build_raise(ctx, expt.as_ref(), arg.as_ref(), line);
                if let Some(tb) = traceback {
                    self.build_expr(ctx, tb);
                }
            }
            StmtKind::Import(aliases) => self.build_import(ctx, aliases, line),
            StmtKind::ImportFrom {
                module,
                names,
                level,
            } => self.build_import_from(ctx, module, names, *level, line),
            StmtKind::Print { dest, values } => {
                if let Some(dest) = dest {
                    let node = self.build_expr(ctx, dest);
                    self.attr_node(ctx.frame, line, dest.id, node, "write", false);
                }
                for value in values {
                    self.build_expr(ctx, value);
                }
            }
            StmtKind::Assign { targets, value } => {
                let node = self.build_expr(ctx, value);
                for target in targets {
                    self.build_target(ctx, target, node);
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                self.build_aug_assign(ctx, target, *op, value, line)
            }
            StmtKind::Return(value) => {
                let node = match value {
                    Some(value) => self.build_expr(ctx, value),
                    None => self.prim_node(Prim::None),
                };
                ctx.evals.push((Tag::Return, node));
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Pass | StmtKind::Global(_) => {}
            StmtKind::Assert { test, msg } => self.build_assert(ctx, test, msg.as_ref(), line),
            StmtKind::Exec {
                code,
                globals,
                locals,
            } => {
                let code = self.build_expr(ctx, code);
                self.check_arg(
                    ctx.frame,
                    line,
                    code,
                    super::super::checker::STR,
                    "exec code".to_string(),
                );
                for scope in globals.iter().chain(locals) {
                    self.build_expr(ctx, scope);
                }
            }
            StmtKind::Delete(targets) => {
                for target in targets {
                    if !matches!(target.kind, ExprKind::Name(_)) {
                        self.build_expr(ctx, target);
                    }
                }
            }
            StmtKind::With {
                context,
                target,
                body,
            } => {
                let manager = self.build_expr(ctx, context);
                let enter = self.attr_node(ctx.frame, line, context.id, manager, "__enter__", false);
                let entered = self.call_node(CallArgs::new(ctx.frame, line, context.id), enter);
                if let Some(target) = target {
                    self.build_target(ctx, target, entered);
                }
                self.build_block(ctx, body);
            }
            StmtKind::Expr(e) => {
                let node = self.build_expr(ctx, e);
                ctx.evals.push((Tag::Effect, node));
            }
        }
    }

    /// 把值节点赋给赋值目标
    pub(crate) fn build_target(
        &mut self,
        ctx: &mut BuildCtx,
        target: &Expr,
        value: NodeId,
    ) {
        let line = target.line;
        match &target.kind {
            ExprKind::Name(name) => self.bind_name(ctx.space, name, value),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                let parts = self.unpack_node(ctx.frame, line, value, items.len());
                for (item, part) in items.iter().zip(parts) {
                    self.build_target(ctx, item, part);
                }
            }
            ExprKind::Attribute { value: obj, attr } => {
                let obj = self.build_expr(ctx, obj);
                self.attr_assign(ctx.frame, line, obj, attr, value);
            }
            ExprKind::Subscript { value: obj, index } => {
                let obj = self.build_expr(ctx, obj);
                if let ExprKind::SliceObj { .. } = index.kind {
                    self.build_expr(ctx, index);
                    self.attach(
                        obj,
                        Op::SliceAssign {
                            frame: ctx.frame,
                            line,
                            value,
                        },
                    );
                } else {
                    let index = self.build_expr(ctx, index);
                    self.attach(
                        obj,
                        Op::SubAssign {
                            frame: ctx.frame,
                            line,
                            index,
                            value,
                        },
                    );
                }
            }
            ExprKind::Slice { value: obj, lower, upper } => {
                let obj = self.build_expr(ctx, obj);
                for bound in lower.iter().chain(upper) {
                    self.build_expr(ctx, bound);
                }
                self.attach(
                    obj,
                    Op::SliceAssign {
                        frame: ctx.frame,
                        line,
                        value,
                    },
                );
            }
            _ => {
                tracing::warn!("{}:{}: unsupported assignment target", ctx.module, line);
            }
        }
    }

    /// `a op= b`：读取、运算、写回同一个位置
    fn build_aug_assign(
        &mut self,
        ctx: &mut BuildCtx,
        target: &Expr,
        op: BinOp,
        value: &Expr,
        line: usize,
    ) {
        let frame = ctx.frame;
        let rhs = self.build_expr(ctx, value);
        match &target.kind {
            ExprKind::Name(name) => {
                let current = self.load_name(ctx, name, line);
                let result = self.inplace_node(frame, line, target.id, op, current, rhs);
                self.bind_name(ctx.space, name, result);
            }
            ExprKind::Attribute { value: obj, attr } => {
                let obj = self.build_expr(ctx, obj);
                let current = self.attr_node(frame, line, target.id, obj, attr, false);
                let result = self.inplace_node(frame, line, target.id, op, current, rhs);
                self.attr_assign(frame, line, obj, attr, result);
            }
            ExprKind::Subscript { value: obj, index } => {
                let obj = self.build_expr(ctx, obj);
                let index_node = self.build_expr(ctx, index);
                let current = self.graph.new_node();
                self.attach(
                    obj,
                    Op::Subscript {
                        frame,
                        line,
                        index: index_node,
                        const_index: index.const_int(),
                        target: current,
                    },
                );
                let result = self.inplace_node(frame, line, target.id, op, current, rhs);
                self.attach(
                    obj,
                    Op::SubAssign {
                        frame,
                        line,
                        index: index_node,
                        value: result,
                    },
                );
            }
            _ => {
                let current = self.build_expr(ctx, target);
                self.inplace_node(frame, line, target.id, op, current, rhs);
            }
        }
    }

    /// `try`/`except`：体在捕获帧中构建，处理器在外层帧中构建
    fn build_try(
        &mut self,
        ctx: &mut BuildCtx,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        line: usize,
    ) {
        let outer = ctx.frame;
        let scope = self.frame(outer).scope.clone();
        let try_frame = self.new_frame(Some(outer), FrameKind::Try, &ctx.module, &scope);
        ctx.frame = try_frame;
        self.build_block(ctx, body);
        ctx.frame = outer;

        let mut built = Vec::with_capacity(handlers.len());
        for handler in handlers {
            let classes = handler.class.as_ref().map(|c| self.build_expr(ctx, c));
            let caught = self.graph.new_node();
            if let Some(target) = &handler.target {
                self.build_target(ctx, target, caught);
            }
            let saved = ctx.caught.replace(caught);
            self.build_block(ctx, &handler.body);
            ctx.caught = saved;
            built.push(Handler { classes, caught });
        }
        tracing::trace!("try at {}:{} with {} handlers", ctx.module, line, built.len());
        self.add_catcher(try_frame, outer, built);
        self.build_block(ctx, orelse);
    }

    fn build_raise(
        &mut self,
        ctx: &mut BuildCtx,
        expt: Option<&Expr>,
        arg: Option<&Expr>,
        line: usize,
    ) {
        let Some(expt) = expt else {
            match ctx.caught {
                Some(caught) => {
                    self.attach(
                        caught,
                        Op::Raise {
                            frame: ctx.frame,
                            line,
                            site: PROTOCOL_SITE,
                            args: Vec::new(),
                            message: None,
                        },
                    );
                }
                None => self.raise_spec(ctx.frame, line, &ErrorConfig::bare_raise()),
            }
            return;
        };
        // `raise E, "msg"` 或 `raise E("msg")` 的常量消息
        let message = match (arg, &expt.kind) {
            (Some(arg), _) => const_str(arg),
            (None, ExprKind::Call { args, .. }) => args.first().and_then(const_str),
            _ => None,
        };
        let node = self.build_expr(ctx, expt);
        let args: Vec<NodeId> = arg.iter().map(|a| self.build_expr(ctx, a)).collect();
        self.attach(
            node,
            Op::Raise {
                frame: ctx.frame,
                line,
                site: expt.id,
                args,
                message,
            },
        );
    }

    /// `assert`：只识别 `isinstance` 声明（含 `and` 连接的）
    fn build_assert(
        &mut self,
        ctx: &mut BuildCtx,
        test: &Expr,
        msg: Option<&Expr>,
        line: usize,
    ) {
        let mut claims = Vec::new();
        isinstance_claims(test, &mut claims);
        if claims.is_empty() {
            self.build_expr(ctx, test);
        }
        for (subject, classes) in claims {
            let node = self.build_expr(ctx, subject);
            let classes = self.build_expr(ctx, classes);
            let blame = match &subject.kind {
                ExprKind::Name(name) => format!("isinstance({})", name),
                _ => "isinstance()".to_string(),
            };
            self.add_post_check(PostCheck::IsInstance {
                node,
                classes,
                frame: ctx.frame,
                line,
                blame,
            });
        }
        if let Some(msg) = msg {
            self.build_expr(ctx, msg);
        }
        self.raise_spec(ctx.frame, line, &ErrorConfig::assertion_failed());
    }
}

/// 字符串字面量
pub(super) fn const_str(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Const(Constant::Str(s) | Constant::Unicode(s)) => Some(s.clone()),
        _ => None,
    }
}

fn isinstance_claims<'a>(
    test: &'a Expr,
    out: &mut Vec<(&'a Expr, &'a Expr)>,
) {
    match &test.kind {
        ExprKind::BoolOp {
            op: BoolOp::And,
            values,
        } => {
            for value in values {
                isinstance_claims(value, out);
            }
        }
        ExprKind::Call { func, args, .. } if args.len() == 2 => {
            if let ExprKind::Name(name) = &func.kind {
                if name == "isinstance" {
                    out.push((&args[0], &args[1]));
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_expression;

    #[test]
    fn test_isinstance_claims_in_conjunction() {
        let test = parse_expression("isinstance(a, int) and isinstance(b, str) and c").expect("parse");
        let mut claims = Vec::new();
        isinstance_claims(&test, &mut claims);
        assert_eq!(claims.len(), 2);
    }

    #[test]
    fn test_const_str() {
        let expr = parse_expression("'boom'").expect("parse");
        assert_eq!(const_str(&expr), Some("boom".to_string()));
        let expr = parse_expression("1").expect("parse");
        assert_eq!(const_str(&expr), None);
    }
}
