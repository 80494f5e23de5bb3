//! 构建器：把语法树降为图节点
//!
//! 构建只创建节点、连接边并挂上操作；所有值的传播都在 [`Interpreter::run`]
//! 中进行。函数体在 `def` 处构建一次，调用时只连接形参与返回节点。
//!
//! [`Interpreter::run`]: super::Interpreter::run

mod expr;
mod stmt;

use super::frame::{FrameId, FrameKind};
use super::graph::{Graph, NodeId};
use super::namespace::{SpaceId, SpaceKind};
use super::value::{DictObj, FuncObj, GenObj, ParamSlot, Prim, TupleObj, Value, ValueId, ValueKey};
use super::Interpreter;
use crate::frontend::parser::ast::*;

/// 求值记录的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// 表达式语句
    Effect,
    Return,
    Yield,
}

/// 构建上下文：当前帧、作用域与收集的求值记录
#[derive(Debug)]
pub struct BuildCtx {
    pub frame: FrameId,
    pub space: SpaceId,
    pub module: String,
    /// 限定名前缀（模块级为空）
    pub scope: String,
    pub evals: Vec<(Tag, NodeId)>,
    /// 处理器体中被捕获的异常（裸 `raise` 用）
    pub caught: Option<NodeId>,
    pub generator: Option<ValueId>,
}

impl BuildCtx {
    pub fn new(
        frame: FrameId,
        space: SpaceId,
        module: &str,
        scope: &str,
    ) -> Self {
        Self {
            frame,
            space,
            module: module.to_string(),
            scope: scope.to_string(),
            evals: Vec::new(),
            caught: None,
            generator: None,
        }
    }

    fn qualify(
        &self,
        name: &str,
    ) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scope, name)
        }
    }
}

/// 函数体：`def` 的语句块或 `lambda` 的表达式
#[derive(Debug, Clone, Copy)]
pub enum FuncBody<'a> {
    Block(&'a [Stmt]),
    Expr(&'a Expr),
}

impl Interpreter {
    /// 在模块的帧与命名空间中构建语句块
    pub(crate) fn build_module_body(
        &mut self,
        module: ValueId,
        body: &[Stmt],
    ) {
        let Some((name, space, frame)) = self
            .module_obj(module)
            .map(|m| (m.name.clone(), m.space, m.frame))
        else {
            return;
        };
        tracing::debug!("building module {} ({} statements)", name, body.len());
        let mut ctx = BuildCtx::new(frame, space, &name, "");
        self.register_names(space, body);
        self.build_block(&mut ctx, body);
    }

    /// 构建函数对象（`def` 与 `lambda` 共用）
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build_function(
        &mut self,
        ctx: &mut BuildCtx,
        site: AstId,
        name: &str,
        args: &Arguments,
        body: FuncBody<'_>,
        line: usize,
    ) -> ValueId {
        let qualname = ctx.qualify(name);
        let space = self.new_space(&qualname, SpaceKind::Function, Some(ctx.space));
        // 帧需要函数值，先占位再回填
        let func = self.push_value(Value::Prim(Prim::Object));
        let frame = self.new_frame(None, FrameKind::Function(func), &ctx.module, &qualname);
        tracing::trace!("def {} at {}:{} ({:?})", qualname, ctx.module, line, site);

        let params: Vec<ParamSlot> = args
            .params
            .iter()
            .map(|p| self.param_slot(space, p))
            .collect();
        // 默认值在定义处求值
        let first_default = params.len().saturating_sub(args.defaults.len());
        for (i, default) in args.defaults.iter().enumerate() {
            let node = self.build_expr(ctx, default);
            if let Some(slot) = params.get(first_default + i) {
                self.bind_slot(ctx.frame, default.line, slot, node);
            }
        }

        let vararg = args.vararg.as_ref().map(|vname| {
            let tuple = self.intern(ValueKey::Owned(func, "varargs"), |interp| {
                Value::Tuple(TupleObj {
                    elemall: interp.graph.new_node(),
                    elements: None,
                })
            });
            let var = self.get_or_create_var(space, vname);
            self.graph.add(var, tuple);
            (vname.clone(), tuple)
        });
        let kwarg = args.kwarg.as_ref().map(|kname| {
            let dict = self.intern(ValueKey::Owned(func, "kwargs"), |interp| {
                Value::Dict(DictObj {
                    key: interp.graph.new_node(),
                    value: interp.graph.new_node(),
                })
            });
            if let Value::Dict(d) = self.value(dict) {
                let key = d.key;
                let string = self.prim(Prim::Str);
                self.graph.add(key, string);
            }
            let var = self.get_or_create_var(space, kname);
            self.graph.add(var, dict);
            (kname.clone(), dict)
        });
        let is_generator = match body {
            FuncBody::Block(stmts) => stmts.iter().any(stmt_has_yield),
            FuncBody::Expr(e) => expr_has_yield(e),
        };
        let generator = is_generator.then(|| {
            self.intern(ValueKey::Owned(func, "generator"), |interp| {
                Value::Generator(GenObj {
                    elemall: interp.graph.new_node(),
                    sent: interp.graph.new_node(),
                })
            })
        });
        let body_node = self.graph.new_node();

        *self.value_mut(func) = Value::Function(Box::new(FuncObj {
            name: name.to_string(),
            qualname: qualname.clone(),
            module: ctx.module.clone(),
            line,
            space,
            frame,
            params,
            defaults: args.defaults.len(),
            vararg,
            kwarg,
            body: body_node,
            generator,
            is_lambda: matches!(body, FuncBody::Expr(_)),
            callers: Default::default(),
            caller_frames: Default::default(),
        }));

        let mut inner = BuildCtx::new(frame, space, &ctx.module, &qualname);
        inner.generator = generator;
        match body {
            FuncBody::Block(stmts) => {
                self.register_names(space, stmts);
                self.build_block(&mut inner, stmts);
            }
            FuncBody::Expr(e) => {
                let node = self.build_expr(&mut inner, e);
                inner.evals.push((Tag::Return, node));
            }
        }

        let mut returns = 0;
        for &(tag, node) in &inner.evals {
            if tag == Tag::Return {
                returns += 1;
                self.graph.connect_nodes(node, body_node);
            }
        }
        // 没有 `return` 语句时隐式返回 None
        if returns == 0 {
            let none = self.prim(Prim::None);
            self.graph.add(body_node, none);
        }
        func
    }

    fn param_slot(
        &mut self,
        space: SpaceId,
        param: &Param,
    ) -> ParamSlot {
        match param {
            Param::Name(name) => ParamSlot::Name(name.clone(), self.get_or_create_var(space, name)),
            Param::Tuple(items) => {
                ParamSlot::Tuple(items.iter().map(|p| self.param_slot(space, p)).collect())
            }
        }
    }

    /// 依次应用装饰器（最内层先应用）
    fn decorate(
        &mut self,
        ctx: &mut BuildCtx,
        decorators: &[Expr],
        site: AstId,
        line: usize,
        value: ValueId,
    ) -> NodeId {
        let mut node = self.graph.simple_node(value);
        for decorator in decorators.iter().rev() {
            let callee = self.build_expr(ctx, decorator);
            let mut call = super::function::CallArgs::new(ctx.frame, line, site);
            call.args.push(node);
            node = self.call_node(call, callee);
        }
        node
    }

    /// `def name(...)`
    fn build_def(
        &mut self,
        ctx: &mut BuildCtx,
        def: &FuncDef,
    ) {
        let func = self.build_function(
            ctx,
            def.id,
            &def.name,
            &def.args,
            FuncBody::Block(&def.body),
            def.line,
        );
        let node = self.decorate(ctx, &def.decorators, def.id, def.line, func);
        self.bind_name(ctx.space, &def.name, node);
        self.spaces[ctx.space.index()].defs.push(func);
    }

    /// `class Name(bases): body`
    fn build_class(
        &mut self,
        ctx: &mut BuildCtx,
        def: &ClassDef,
    ) {
        let qualname = ctx.qualify(&def.name);
        let bases: Vec<NodeId> = def.bases.iter().map(|b| self.build_expr(ctx, b)).collect();
        let baseklass = self.graph.new_node();
        for (base, expr) in bases.iter().zip(&def.bases) {
            self.check_arg(
                ctx.frame,
                expr.line,
                *base,
                super::checker::ArgSpec::Type(super::value::BuiltinType::Type),
                format!("base of class {}", def.name),
            );
            self.graph.connect_nodes(*base, baseklass);
        }

        let space = self.new_space(&qualname, SpaceKind::Class, Some(ctx.space));
        let instance = self.push_value(Value::Prim(Prim::Object));
        let class = self.push_value(Value::Class(Box::new(super::value::ClassObj {
            name: def.name.clone(),
            qualname: qualname.clone(),
            module: ctx.module.clone(),
            line: def.line,
            bases,
            baseklass,
            space,
            instance,
            builtin: false,
        })));
        *self.value_mut(instance) = Value::Instance(super::value::InstanceObj {
            class,
            attrs: Default::default(),
        });

        let frame = self.new_frame(Some(ctx.frame), FrameKind::Class, &ctx.module, &qualname);
        let mut inner = BuildCtx::new(frame, space, &ctx.module, &qualname);
        self.register_names(space, &def.body);
        self.build_block(&mut inner, &def.body);

        let node = self.decorate(ctx, &def.decorators, def.id, def.line, class);
        self.bind_name(ctx.space, &def.name, node);
        self.spaces[ctx.space.index()].defs.push(class);
    }

    /// 名字读取；未定义时报告并返回未定义节点
    fn load_name(
        &mut self,
        ctx: &BuildCtx,
        name: &str,
        line: usize,
    ) -> NodeId {
        match self.lookup(ctx.space, name) {
            Some(var) => var,
            None => {
                let spec = super::errors::ErrorConfig::name_not_defined(name);
                self.raise_spec(ctx.frame, line, &spec);
                Graph::UNDEFINED
            }
        }
    }
}

/// 语句（不进入嵌套的函数、类与 lambda）中是否含有 `yield`
fn stmt_has_yield(stmt: &Stmt) -> bool {
    let block = |body: &[Stmt]| body.iter().any(stmt_has_yield);
    let opt = |e: &Option<Expr>| e.as_ref().is_some_and(expr_has_yield);
    match &stmt.kind {
        StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) => false,
        StmtKind::If { test, body, orelse } | StmtKind::While { test, body, orelse } => {
            expr_has_yield(test) || block(body) || block(orelse)
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => expr_has_yield(target) || expr_has_yield(iter) || block(body) || block(orelse),
        StmtKind::TryExcept {
            body,
            handlers,
            orelse,
        } => {
            block(body)
                || block(orelse)
                || handlers
                    .iter()
                    .any(|h| opt(&h.class) || opt(&h.target) || block(&h.body))
        }
        StmtKind::TryFinally { body, finalbody } => block(body) || block(finalbody),
        StmtKind::Raise {
            expt,
            arg,
            traceback,
        } => opt(expt) || opt(arg) || opt(traceback),
        StmtKind::Print { dest, values } => opt(dest) || values.iter().any(expr_has_yield),
        StmtKind::Assign { targets, value } => {
            expr_has_yield(value) || targets.iter().any(expr_has_yield)
        }
        StmtKind::AugAssign { target, value, .. } => {
            expr_has_yield(target) || expr_has_yield(value)
        }
        StmtKind::Return(value) => opt(value),
        StmtKind::Assert { test, msg } => expr_has_yield(test) || opt(msg),
        StmtKind::Exec {
            code,
            globals,
            locals,
        } => expr_has_yield(code) || opt(globals) || opt(locals),
        StmtKind::Delete(targets) => targets.iter().any(expr_has_yield),
        StmtKind::With {
            context,
            target,
            body,
        } => expr_has_yield(context) || opt(target) || block(body),
        StmtKind::Expr(e) => expr_has_yield(e),
        StmtKind::Import(_)
        | StmtKind::ImportFrom { .. }
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Pass
        | StmtKind::Global(_) => false,
    }
}

fn expr_has_yield(expr: &Expr) -> bool {
    let boxed = |e: &Option<Box<Expr>>| e.as_deref().is_some_and(expr_has_yield);
    let comps = |generators: &[Comprehension]| {
        generators.iter().any(|c| {
            expr_has_yield(&c.target) || expr_has_yield(&c.iter) || c.ifs.iter().any(expr_has_yield)
        })
    };
    match &expr.kind {
        ExprKind::Yield(_) => true,
        ExprKind::Lambda { .. } | ExprKind::Name(_) | ExprKind::Const(_) => false,
        ExprKind::Call {
            func,
            args,
            keywords,
            star,
            dstar,
        } => {
            expr_has_yield(func)
                || args.iter().any(expr_has_yield)
                || keywords.iter().any(|(_, e)| expr_has_yield(e))
                || boxed(star)
                || boxed(dstar)
        }
        ExprKind::Attribute { value, .. } => expr_has_yield(value),
        ExprKind::Subscript { value, index } => expr_has_yield(value) || expr_has_yield(index),
        ExprKind::Slice {
            value,
            lower,
            upper,
        } => expr_has_yield(value) || boxed(lower) || boxed(upper),
        ExprKind::SliceObj { lower, upper, step } => boxed(lower) || boxed(upper) || boxed(step),
        ExprKind::Tuple(items) | ExprKind::List(items) | ExprKind::Set(items) => {
            items.iter().any(expr_has_yield)
        }
        ExprKind::Dict(pairs) => pairs
            .iter()
            .any(|(k, v)| expr_has_yield(k) || expr_has_yield(v)),
        ExprKind::BinOp { left, right, .. } => expr_has_yield(left) || expr_has_yield(right),
        ExprKind::Compare { left, ops } => {
            expr_has_yield(left) || ops.iter().any(|(_, e)| expr_has_yield(e))
        }
        ExprKind::BoolOp { values, .. } => values.iter().any(expr_has_yield),
        ExprKind::UnaryOp { operand, .. } => expr_has_yield(operand),
        // 生成器表达式有自己的作用域
        ExprKind::GeneratorExp { .. } => false,
        ExprKind::ListComp { elt, generators } => expr_has_yield(elt) || comps(generators),
        ExprKind::IfExp { test, body, orelse } => {
            expr_has_yield(test) || expr_has_yield(body) || expr_has_yield(orelse)
        }
        ExprKind::Backquote(e) => expr_has_yield(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;

    fn first_def(source: &str) -> FuncDef {
        let module = parse_source(source, "m").expect("parse");
        match module.body.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::FunctionDef(def)) => def,
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_yield_detected_in_nested_blocks() {
        let def = first_def("def g():\n    for x in y:\n        if x:\n            yield x\n");
        assert!(def.body.iter().any(stmt_has_yield));
    }

    #[test]
    fn test_yield_in_nested_def_ignored() {
        let def = first_def("def f():\n    def g():\n        yield 1\n    return g\n");
        assert!(!def.body.iter().any(stmt_has_yield));
    }

    #[test]
    fn test_qualify() {
        let ctx = BuildCtx::new(FrameId(0), SpaceId(0), "m", "C");
        assert_eq!(ctx.qualify("f"), "C.f");
        let top = BuildCtx::new(FrameId(0), SpaceId(0), "m", "");
        assert_eq!(top.qualify("f"), "f");
    }
}
