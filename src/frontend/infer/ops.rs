//! 操作：图中对每个流入值做出反应的计算
//!
//! 操作存放在解释器的操作表中，以 [`OpId`] 被边引用。投递时把操作从表中
//! 取出（留下 [`Op::Done`] 占位），处理完再放回；处理过程中只会新建节点、
//! 连接边与排队投递，因此不会重入同一个操作。

use super::checker::ArgSpec;
use super::errors::NodeResult;
use super::frame::{Catcher, FrameId};
use super::function::CallArgs;
use super::graph::{NodeId, OpId, Receiver};
use super::operators::{BinaryState, UnaryKind};
use super::value::{Value, ValueId, ValueKey, WrapKind};
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

/// 操作
#[derive(Debug, Clone)]
pub enum Op {
    /// 已取出处理中
    Done,
    /// 调用流入的每个值
    Call { call: CallArgs, target: NodeId },
    /// `obj.name`
    AttrRef {
        frame: FrameId,
        line: usize,
        site: AstId,
        name: String,
        quiet: bool,
        target: NodeId,
    },
    /// `obj.name = value`
    AttrAssign {
        frame: FrameId,
        line: usize,
        name: String,
        value: NodeId,
    },
    /// 把类上的原始属性绑定到接收者
    Bind {
        recv: ValueId,
        class_level: bool,
        frame: FrameId,
        line: usize,
        site: AstId,
        target: NodeId,
    },
    /// 在流入的基类上查找
    BaseLookup { name: String, target: NodeId },
    Subscript {
        frame: FrameId,
        line: usize,
        index: NodeId,
        const_index: Option<i64>,
        target: NodeId,
    },
    SubAssign {
        frame: FrameId,
        line: usize,
        index: NodeId,
        value: NodeId,
    },
    Slice {
        frame: FrameId,
        line: usize,
        site: AstId,
        target: NodeId,
    },
    SliceAssign {
        frame: FrameId,
        line: usize,
        value: NodeId,
    },
    /// `for` 循环等的迭代元素
    IterElement {
        frame: FrameId,
        line: usize,
        target: NodeId,
    },
    /// `next()`
    IterNext {
        frame: FrameId,
        line: usize,
        target: NodeId,
    },
    TupleUnpack {
        frame: FrameId,
        line: usize,
        targets: Vec<NodeId>,
    },
    /// 调用中的 `*args`
    StarArgs {
        frame: FrameId,
        line: usize,
        targets: Vec<NodeId>,
        required: usize,
        given: usize,
        allowed: usize,
        rest: Option<NodeId>,
    },
    /// 槽 0 为左操作数，槽 1 为右操作数
    Binary(Box<BinaryState>),
    Unary {
        frame: FrameId,
        line: usize,
        op: UnaryKind,
        target: NodeId,
    },
    /// `in` 的右操作数
    Contains { frame: FrameId, line: usize },
    TypeCheck {
        frame: FrameId,
        line: usize,
        spec: ArgSpec,
        blame: String,
    },
    /// `raise` 流入的每个值
    Raise {
        frame: FrameId,
        line: usize,
        site: AstId,
        args: Vec<NodeId>,
        message: Option<String>,
    },
    Catcher(Catcher),
    /// `staticmethod` / `classmethod` / `property`
    Wrap { kind: WrapKind, target: NodeId },
    /// `type(x)`
    TypeOf { target: NodeId },
    /// 字典构造、`update` 与 `**kwargs`
    DictUpdate {
        frame: FrameId,
        line: usize,
        key: NodeId,
        value: NodeId,
    },
    /// 可迭代对象中的一个 (键, 值) 元素
    DictPair {
        frame: FrameId,
        line: usize,
        key: NodeId,
        value: NodeId,
    },
    /// 集合交集，槽 0 / 槽 1 为两侧元素
    SetMix {
        lseen: Vec<ValueId>,
        rseen: Vec<ValueId>,
        target: NodeId,
    },
    Len {
        frame: FrameId,
        line: usize,
        target: NodeId,
    },
    /// `super(C, x)`，槽 0 为类，槽 1 为接收者
    MakeSuper {
        classes: Vec<ValueId>,
        recvs: Vec<ValueId>,
        target: NodeId,
    },
}

impl Interpreter {
    pub(crate) fn new_op(
        &mut self,
        op: Op,
    ) -> OpId {
        let id = OpId(self.ops.len() as u32);
        self.ops.push(op);
        id
    }

    pub(crate) fn take_op(
        &mut self,
        id: OpId,
    ) -> Op {
        std::mem::replace(&mut self.ops[id.index()], Op::Done)
    }

    pub(crate) fn put_op(
        &mut self,
        id: OpId,
        op: Op,
    ) {
        self.ops[id.index()] = op;
    }

    /// 在 `src` 上挂一个单输入操作
    pub(crate) fn attach(
        &mut self,
        src: NodeId,
        op: Op,
    ) -> OpId {
        let id = self.new_op(op);
        self.graph.connect(src, Receiver::Op(id, 0));
        id
    }

    /// 处理投递直到图中没有待处理的值
    pub(crate) fn saturate(&mut self) {
        let before = self.graph.deliveries();
        while let Some((id, slot, value)) = self.graph.step() {
            self.dispatch(id, slot, value);
        }
        tracing::trace!(
            "saturated after {} deliveries",
            self.graph.deliveries() - before
        );
    }

    fn dispatch(
        &mut self,
        id: OpId,
        slot: u8,
        value: ValueId,
    ) {
        let mut op = self.take_op(id);
        self.apply(&mut op, slot, value);
        self.put_op(id, op);
    }

    /// 结果节点并入目标；失败时在帧上抛出（`None` 按配置跳过）
    fn deliver(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        result: NodeResult<NodeId>,
        target: NodeId,
    ) {
        match result {
            Ok(node) => self.graph.connect_nodes(node, target),
            Err(e) => self.fail(frame, line, value, &e),
        }
    }

    fn fail(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        error: &super::errors::NodeError,
    ) {
        if self.config.ignore_none && self.is_none(value) {
            return;
        }
        self.raise_spec(frame, line, &error.to_spec());
    }

    fn apply(
        &mut self,
        op: &mut Op,
        slot: u8,
        value: ValueId,
    ) {
        match op {
            Op::Done => {}
            Op::Call { call, target } => {
                let result = self.call_value(call, value);
                self.deliver(call.frame, call.line, value, result, *target);
            }
            Op::AttrRef {
                frame,
                line,
                site,
                name,
                quiet,
                target,
            } => self.attr_ref_value(*frame, *line, *site, value, name, *quiet, *target),
            Op::AttrAssign {
                frame,
                line,
                name,
                value: item,
            } => {
                if let Err(e) = self.attr_assign_value(value, name, *item) {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::Bind {
                recv,
                class_level,
                frame,
                line,
                site,
                target,
            } => {
                let call = CallArgs::new(*frame, *line, *site);
                self.bind_value(*recv, *class_level, call, value, *target);
            }
            Op::BaseLookup { name, target } => self.base_lookup_value(value, name, *target),
            Op::Subscript {
                frame,
                line,
                index,
                const_index,
                target,
            } => {
                let result = self.subscript_value(*frame, *line, value, *index, *const_index);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::SubAssign {
                frame,
                line,
                index,
                value: item,
            } => {
                if let Err(e) = self.sub_assign_value(*frame, *line, value, *index, *item) {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::Slice {
                frame,
                line,
                site,
                target,
            } => {
                let result = self.slice_value(*frame, *line, *site, value);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::SliceAssign {
                frame,
                line,
                value: items,
            } => {
                if let Err(e) = self.slice_assign_value(*frame, *line, value, *items) {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::IterElement {
                frame,
                line,
                target,
            } => {
                let result = self.iter_element_at(*frame, *line, value);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::IterNext {
                frame,
                line,
                target,
            } => {
                let result = self.iter_next_value(*frame, *line, value);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::TupleUnpack {
                frame,
                line,
                targets,
            } => {
                if self.config.ignore_none && self.is_none(value) {
                    return;
                }
                self.tuple_unpack_value(*frame, *line, value, targets);
            }
            Op::StarArgs {
                frame,
                line,
                targets,
                required,
                given,
                allowed,
                rest,
            } => self.star_args_value(
                *frame, *line, value, targets, *required, *given, *allowed, *rest,
            ),
            Op::Binary(state) => self.binary_input(state, slot, value),
            Op::Unary {
                frame,
                line,
                op,
                target,
            } => {
                let result = self.unary_value(*frame, *line, *op, value);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::Contains { frame, line } => {
                if let Err(e) = self.contains_value(value) {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::TypeCheck {
                frame,
                line,
                spec,
                blame,
            } => self.type_check_value(*frame, *line, *spec, blame, value),
            Op::Raise {
                frame,
                line,
                site,
                args,
                message,
            } => {
                if let Err(e) = self.raise_value(*frame, *line, *site, args, message.as_deref(), value)
                {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::Catcher(catcher) => self.catch(catcher, value),
            Op::Wrap { kind, target } => {
                let kind = *kind;
                let wrapped = self.intern(ValueKey::Wrapper(kind, value), |_| match kind {
                    WrapKind::ClassMethod => Value::ClassMethod(value),
                    WrapKind::StaticMethod => Value::StaticMethod(value),
                    WrapKind::Property => Value::Property(value),
                });
                self.graph.add(*target, wrapped);
            }
            Op::TypeOf { target } => {
                let class = self.class_of(value);
                self.graph.add(*target, class);
            }
            Op::DictUpdate {
                frame,
                line,
                key,
                value: values,
            } => {
                if let Err(e) = self.dict_update_value(*frame, *line, value, *key, *values) {
                    self.fail(*frame, *line, value, &e);
                }
            }
            Op::DictPair {
                frame,
                line,
                key,
                value: values,
            } => self.dict_pair_value(*frame, *line, value, *key, *values),
            Op::SetMix {
                lseen,
                rseen,
                target,
            } => {
                if slot == 0 {
                    self.set_mix_value(lseen, rseen, value, *target);
                } else {
                    self.set_mix_value(rseen, lseen, value, *target);
                }
            }
            Op::Len {
                frame,
                line,
                target,
            } => {
                let result = self.len_value(*frame, *line, value);
                self.deliver(*frame, *line, value, result, *target);
            }
            Op::MakeSuper {
                classes,
                recvs,
                target,
            } => {
                let pairs: Vec<(ValueId, ValueId)> = if slot == 0 {
                    if classes.contains(&value) {
                        return;
                    }
                    classes.push(value);
                    recvs.iter().map(|&r| (value, r)).collect()
                } else {
                    if recvs.contains(&value) {
                        return;
                    }
                    recvs.push(value);
                    classes.iter().map(|&c| (c, value)).collect()
                };
                for (class, recv) in pairs {
                    if !matches!(self.value(class), Value::Class(_)) {
                        continue;
                    }
                    let sup = self.intern(ValueKey::Super(class, recv), |_| Value::Super { class, recv });
                    self.graph.add(*target, sup);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::AnalyzerConfig;

    #[test]
    fn test_take_and_put_op() {
        let mut interp = Interpreter::new(&AnalyzerConfig::default());
        let target = interp.graph.new_node();
        let id = interp.new_op(Op::TypeOf { target });
        assert!(matches!(interp.take_op(id), Op::TypeOf { .. }));
        assert!(matches!(interp.ops[id.index()], Op::Done));
        interp.put_op(id, Op::TypeOf { target });
        assert!(matches!(interp.ops[id.index()], Op::TypeOf { .. }));
    }

    #[test]
    fn test_type_of_delivers_class() {
        let mut interp = Interpreter::new(&AnalyzerConfig::default());
        let int = interp.prim_node(super::super::value::Prim::Int);
        let target = interp.graph.new_node();
        interp.attach(int, Op::TypeOf { target });
        interp.saturate();
        let ty = interp.type_value(super::super::value::BuiltinType::Int);
        assert!(interp.graph.contains(target, ty));
    }
}
