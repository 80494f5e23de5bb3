//! 调用与形参绑定
//!
//! 调用操作对被调用节点中的每个值分派一次 [`Interpreter::call_value`]。
//! 用户函数的绑定分四步：关键字、位置、`*args` 展开、收尾检查；
//! 任何一步出错都在调用者的帧上抛出诊断，而不是中止绑定。

use smallvec::SmallVec;

use super::errors::{ErrorConfig, NodeError, NodeResult};
use super::frame::FrameId;
use super::graph::{Graph, NodeId};
use super::ops::Op;
use super::value::{ParamSlot, Value, ValueId};
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

/// 一次调用的实参
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub frame: FrameId,
    pub line: usize,
    /// 调用表达式
    pub site: AstId,
    pub args: SmallVec<[NodeId; 4]>,
    pub kwargs: Vec<(String, NodeId)>,
    pub star: Option<NodeId>,
    pub dstar: Option<NodeId>,
    /// 位置实参中的字符串字面量（`getattr(o, "name")` 用）
    pub const_strs: Vec<Option<String>>,
}

impl CallArgs {
    /// 不带实参的调用
    pub fn new(
        frame: FrameId,
        line: usize,
        site: AstId,
    ) -> Self {
        Self {
            frame,
            line,
            site,
            args: SmallVec::new(),
            kwargs: Vec::new(),
            star: None,
            dstar: None,
            const_strs: Vec::new(),
        }
    }

    /// 在位置实参前插入接收者
    pub fn with_receiver(
        &self,
        recv: NodeId,
    ) -> Self {
        let mut call = self.clone();
        call.args.insert(0, recv);
        if !call.const_strs.is_empty() {
            call.const_strs.insert(0, None);
        }
        call
    }

    pub fn has_arguments(&self) -> bool {
        !self.args.is_empty() || !self.kwargs.is_empty() || self.star.is_some() || self.dstar.is_some()
    }
}

impl Interpreter {
    /// 调用一个值；返回结果节点
    pub(crate) fn call_value(
        &mut self,
        call: &CallArgs,
        callee: ValueId,
    ) -> NodeResult<NodeId> {
        match self.value(callee) {
            Value::Function(_) => Ok(self.call_function(call, callee)),
            Value::BoundMethod { recv, func } => {
                let (recv, func) = (*recv, *func);
                let recv = self.graph.simple_node(recv);
                let call = call.with_receiver(recv);
                self.call_value(&call, func)
            }
            Value::Class(_) => Ok(self.instantiate(call, callee)),
            Value::Type(ty) => {
                let ty = *ty;
                self.call_type(call, ty)
            }
            Value::BuiltinFunc(name) => {
                let name = *name;
                self.call_builtin_func(call, name)
            }
            Value::BuiltinMethod { recv, name } => {
                let (recv, name) = (*recv, *name);
                self.call_builtin_method(call, recv, name)
            }
            Value::Instance(inst) => {
                let class = inst.class;
                let method = self.instance_attr(call.frame, call.line, call.site, callee, "__call__");
                let spec = ErrorConfig::not_callable(&self.short_name(callee));
                self.must_be_defined(method, call.frame, call.line, spec, Some(class));
                let target = self.graph.new_node();
                self.attach(
                    method,
                    Op::Call {
                        call: call.clone(),
                        target,
                    },
                );
                Ok(target)
            }
            _ => Err(NodeError::Type(
                ErrorConfig::not_callable(&self.short_name(callee)).message,
            )),
        }
    }

    /// 绑定形参并返回函数体节点
    fn call_function(
        &mut self,
        call: &CallArgs,
        func: ValueId,
    ) -> NodeId {
        let Some(f) = self.func_obj(func) else {
            return Graph::UNDEFINED;
        };
        let params = f.params.clone();
        let required = f.required();
        let vararg = f.vararg.as_ref().map(|(_, tuple)| *tuple);
        let kwarg = f.kwarg.as_ref().map(|(_, dict)| *dict);
        let callee_frame = f.frame;
        let body = f.body;
        let generator = f.generator;
        tracing::trace!("bind {} at line {}", f.name, call.line);

        let frame = call.frame;
        let line = call.line;
        let mut bound = vec![false; params.len()];
        let mut given = 0;

        // 关键字
        for (keyword, node) in &call.kwargs {
            let slot = params
                .iter()
                .enumerate()
                .position(|(i, p)| !bound[i] && p.keyword_name() == Some(keyword.as_str()));
            match (slot, kwarg) {
                (Some(i), _) => {
                    bound[i] = true;
                    given += 1;
                    self.bind_slot(frame, line, &params[i], *node);
                }
                (None, Some(dict)) => {
                    if let Value::Dict(d) = self.value(dict) {
                        let values = d.value;
                        self.graph.connect_nodes(*node, values);
                    }
                }
                (None, None) => {
                    self.raise_spec(frame, line, &ErrorConfig::invalid_keyword(keyword));
                }
            }
        }

        // 位置
        let mut overflow = 0;
        for &node in &call.args {
            match bound.iter().position(|b| !b) {
                Some(i) => {
                    bound[i] = true;
                    given += 1;
                    self.bind_slot(frame, line, &params[i], node);
                }
                None => match vararg {
                    Some(tuple) => {
                        let elemall = self.seq_elemall(tuple);
                        self.graph.connect_nodes(node, elemall);
                    }
                    None => overflow += 1,
                },
            }
        }
        if overflow > 0 {
            let spec = ErrorConfig::too_many_args(given + overflow, params.len());
            self.raise_spec(frame, line, &spec);
        }

        // `*args`：按剩余形参个数解包
        if let Some(star) = call.star {
            let residual: Vec<usize> = (0..params.len()).filter(|&i| !bound[i]).collect();
            let targets: Vec<NodeId> = residual.iter().map(|_| self.graph.new_node()).collect();
            let rest = vararg.map(|tuple| self.seq_elemall(tuple));
            self.attach(
                star,
                Op::StarArgs {
                    frame,
                    line,
                    targets: targets.clone(),
                    required: residual.iter().filter(|&&i| i < required).count(),
                    given,
                    allowed: params.len(),
                    rest,
                },
            );
            for (i, target) in residual.into_iter().zip(targets) {
                bound[i] = true;
                self.bind_slot(frame, line, &params[i], target);
            }
        }

        // `**kwargs`：键名静态不可知，字典的值流向所有未绑定的形参（含带默认值者），
        // 这些形参随即视为已绑定，不再报参数过少
        if let Some(dstar) = call.dstar {
            let sink = self.graph.new_node();
            self.attach(
                dstar,
                Op::DictUpdate {
                    frame,
                    line,
                    key: Graph::UNDEFINED,
                    value: sink,
                },
            );
            for i in 0..params.len() {
                if !bound[i] {
                    bound[i] = true;
                    self.bind_slot(frame, line, &params[i], sink);
                }
            }
            if let Some(Value::Dict(d)) = kwarg.map(|dict| self.value(dict)) {
                let values = d.value;
                self.graph.connect_nodes(sink, values);
            }
        }

        if bound.iter().take(required).any(|b| !b) {
            self.raise_spec(frame, line, &ErrorConfig::too_few_args(given, required));
        }

        let module = self.frame(frame).module.clone();
        if let Some(f) = self.func_obj_mut(func) {
            f.callers.insert((module, line));
            f.caller_frames.insert(frame);
        }
        self.connect_frames(callee_frame, frame);

        match generator {
            Some(gen) => self.graph.simple_node(gen),
            None => body,
        }
    }

    /// 把实参节点绑定到形参槽位，元组形参递归解包
    pub(crate) fn bind_slot(
        &mut self,
        frame: FrameId,
        line: usize,
        slot: &ParamSlot,
        node: NodeId,
    ) {
        match slot {
            ParamSlot::Name(_, var) => self.graph.connect_nodes(node, *var),
            ParamSlot::Tuple(items) => {
                let targets = self.unpack_node(frame, line, node, items.len());
                for (item, target) in items.iter().zip(targets) {
                    self.bind_slot(frame, line, item, target);
                }
            }
        }
    }

    /// 实例化：以实例为接收者调用 `__init__`，返回唯一的实例值
    fn instantiate(
        &mut self,
        call: &CallArgs,
        class: ValueId,
    ) -> NodeId {
        let Some(instance) = self.class_obj(class).map(|c| c.instance) else {
            return Graph::UNDEFINED;
        };
        let init = self.class_lookup(class, "__init__");
        let bound = self.graph.new_node();
        self.attach(
            init,
            Op::Bind {
                recv: instance,
                class_level: false,
                frame: call.frame,
                line: call.line,
                site: call.site,
                target: bound,
            },
        );
        let result = self.graph.new_node();
        self.attach(
            bound,
            Op::Call {
                call: call.clone(),
                target: result,
            },
        );
        if call.has_arguments() {
            // 没有 `__init__` 的类不接受实参
            let given = call.args.len() + call.kwargs.len();
            let spec = ErrorConfig::too_many_args(given, 0);
            self.must_be_defined(init, call.frame, call.line, spec, Some(class));
        }
        self.graph.simple_node(instance)
    }

    /// 在调用位置上调用节点中的每个值，返回结果节点
    pub(crate) fn call_node(
        &mut self,
        call: CallArgs,
        callee: NodeId,
    ) -> NodeId {
        let target = self.graph.new_node();
        self.attach(callee, Op::Call { call, target });
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_receiver_shifts_const_strs() {
        let mut call = CallArgs::new(FrameId(0), 1, AstId(1));
        call.args.push(NodeId(5));
        call.const_strs.push(Some("name".to_string()));
        let bound = call.with_receiver(NodeId(9));
        assert_eq!(bound.args.as_slice(), &[NodeId(9), NodeId(5)]);
        assert_eq!(bound.const_strs, vec![None, Some("name".to_string())]);
    }

    #[test]
    fn test_has_arguments() {
        let mut call = CallArgs::new(FrameId(0), 1, AstId(1));
        assert!(!call.has_arguments());
        call.kwargs.push(("x".to_string(), NodeId(3)));
        assert!(call.has_arguments());
    }
}
