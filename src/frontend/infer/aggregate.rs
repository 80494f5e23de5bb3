//! 聚合对象的协议：迭代、下标、切片、解包、字典转换与集合交集

use super::checker::INT;
use super::errors::{ErrorConfig, ExcSpec, NodeError, NodeResult};
use super::frame::FrameId;
use super::function::CallArgs;
use super::graph::{Graph, NodeId, Receiver};
use super::ops::Op;
use super::value::{Prim, SeqObj, TupleObj, Value, ValueId, ValueKey};
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

/// 由协议方法（`__iter__`、`__getitem__` 等）发起的调用使用的位置
pub const PROTOCOL_SITE: AstId = AstId(0);

impl Interpreter {
    /// 序列的元素汇合节点
    pub(crate) fn seq_elemall(
        &self,
        value: ValueId,
    ) -> NodeId {
        match self.value(value) {
            Value::List(s) | Value::Iter(s) | Value::Set { seq: s, .. } => s.elemall,
            Value::Tuple(t) => t.elemall,
            Value::Generator(g) => g.elemall,
            _ => Graph::UNDEFINED,
        }
    }

    /// 接收者的元素（`pop`、`next` 的返回值）
    pub(crate) fn element_node(
        &mut self,
        recv: ValueId,
    ) -> NodeId {
        match self.value(recv) {
            Value::Dict(d) => d.key,
            Value::Prim(p) if p.is_string() => self.graph.simple_node(recv),
            _ => self.seq_elemall(recv),
        }
    }

    /// 方法副作用写入的位置
    pub(crate) fn element_sink(
        &self,
        recv: ValueId,
    ) -> Option<NodeId> {
        match self.value(recv) {
            Value::List(s) | Value::Iter(s) | Value::Set { seq: s, .. } => Some(s.elemall),
            Value::Dict(d) => Some(d.key),
            Value::Generator(g) => Some(g.sent),
            _ => None,
        }
    }

    /// 内建值迭代产生的元素
    pub(crate) fn iter_element(
        &mut self,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        match self.value(value) {
            Value::List(s) | Value::Iter(s) | Value::Set { seq: s, .. } => Ok(s.elemall),
            Value::Tuple(t) => Ok(t.elemall),
            Value::Generator(g) => Ok(g.elemall),
            Value::Dict(d) => Ok(d.key),
            Value::Prim(Prim::Str | Prim::Unicode) => Ok(self.graph.simple_node(value)),
            Value::Prim(Prim::File) => Ok(self.prim_node(Prim::Str)),
            Value::Prim(Prim::XRange) => Ok(self.prim_node(Prim::Int)),
            _ => Err(NodeError::Type(
                ErrorConfig::not_iterable(&self.type_name(value)).message,
            )),
        }
    }

    /// 迭代产生的元素，实例走 `__iter__` / `next` 协议
    pub(crate) fn iter_element_at(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        if !matches!(self.value(value), Value::Instance(_)) {
            return self.iter_element(value);
        }
        let missing = ErrorConfig::not_iterable(&self.type_name(value));
        let iter = self.dunder_call(frame, line, value, "__iter__", Vec::new(), missing);
        let elems = self.graph.new_node();
        self.attach(
            iter,
            Op::IterNext {
                frame,
                line,
                target: elems,
            },
        );
        Ok(elems)
    }

    /// 构建期：`for x in src` 中 x 的节点
    pub(crate) fn iter_node(
        &mut self,
        frame: FrameId,
        line: usize,
        src: NodeId,
    ) -> NodeId {
        let target = self.graph.new_node();
        self.attach(src, Op::IterElement { frame, line, target });
        target
    }

    /// 构建期：把 `src` 解包为 `count` 个目标节点
    pub(crate) fn unpack_node(
        &mut self,
        frame: FrameId,
        line: usize,
        src: NodeId,
        count: usize,
    ) -> Vec<NodeId> {
        let targets: Vec<NodeId> = (0..count).map(|_| self.graph.new_node()).collect();
        self.attach(
            src,
            Op::TupleUnpack {
                frame,
                line,
                targets: targets.clone(),
            },
        );
        targets
    }

    /// 调用实例的协议方法；方法不存在时在饱和后报告 `missing`
    pub(crate) fn dunder_call(
        &mut self,
        frame: FrameId,
        line: usize,
        instance: ValueId,
        name: &str,
        args: Vec<NodeId>,
        missing: ExcSpec,
    ) -> NodeId {
        let class = self.class_of(instance);
        let method = self.instance_attr(frame, line, PROTOCOL_SITE, instance, name);
        self.must_be_defined(method, frame, line, missing, Some(class));
        let mut call = CallArgs::new(frame, line, PROTOCOL_SITE);
        call.args.extend(args);
        self.call_node(call, method)
    }

    /// `next()` 一个迭代器
    pub(crate) fn iter_next_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        match self.value(value) {
            Value::Iter(s) => Ok(s.elemall),
            Value::Generator(g) => Ok(g.elemall),
            Value::Prim(Prim::File) => Ok(self.prim_node(Prim::Str)),
            Value::Instance(_) => {
                let missing = ErrorConfig::not_an_iterator(&self.type_name(value));
                Ok(self.dunder_call(frame, line, value, "next", Vec::new(), missing))
            }
            _ => Err(NodeError::Type(
                ErrorConfig::not_an_iterator(&self.type_name(value)).message,
            )),
        }
    }

    /// `value[index]`
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn subscript_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        index: NodeId,
        const_index: Option<i64>,
    ) -> NodeResult<NodeId> {
        let maybe_index_error = |interp: &mut Self| {
            interp.raise_spec(frame, line, &ErrorConfig::index_out_of_range());
        };
        match self.value(value) {
            Value::List(s) => {
                let elemall = s.elemall;
                self.check_arg(frame, line, index, INT, "list indices".to_string());
                maybe_index_error(self);
                Ok(elemall)
            }
            Value::Tuple(t) => {
                let elemall = t.elemall;
                if let (Some(i), Some(elements)) = (const_index, t.elements.clone()) {
                    let len = elements.len() as i64;
                    let pos = if i < 0 { i + len } else { i };
                    if pos < 0 || pos >= len {
                        let spec = ErrorConfig::tuple_index_out_of_range(i, elements.len());
                        self.raise_spec(frame, line, &spec);
                        return Ok(Graph::UNDEFINED);
                    }
                    return Ok(elements[pos as usize]);
                }
                self.check_arg(frame, line, index, INT, "tuple indices".to_string());
                maybe_index_error(self);
                Ok(elemall)
            }
            Value::Prim(Prim::Str | Prim::Unicode) => {
                self.check_arg(frame, line, index, INT, "string indices".to_string());
                maybe_index_error(self);
                Ok(self.graph.simple_node(value))
            }
            Value::Prim(Prim::XRange) => {
                maybe_index_error(self);
                Ok(self.prim_node(Prim::Int))
            }
            Value::Dict(d) => {
                let values = d.value;
                self.raise_spec(frame, line, &ErrorConfig::key_not_found());
                Ok(values)
            }
            Value::Instance(_) => {
                let missing = ErrorConfig::unsubscriptable(&self.type_name(value));
                Ok(self.dunder_call(frame, line, value, "__getitem__", vec![index], missing))
            }
            _ => Err(NodeError::Type(
                ErrorConfig::unsubscriptable(&self.type_name(value)).message,
            )),
        }
    }

    /// `value[index] = item`
    pub(crate) fn sub_assign_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        index: NodeId,
        item: NodeId,
    ) -> NodeResult<()> {
        match self.value(value) {
            Value::List(s) => {
                let elemall = s.elemall;
                self.check_arg(frame, line, index, INT, "list indices".to_string());
                self.graph.connect_nodes(item, elemall);
                Ok(())
            }
            Value::Dict(d) => {
                let (key, values) = (d.key, d.value);
                self.graph.connect_nodes(index, key);
                self.graph.connect_nodes(item, values);
                Ok(())
            }
            Value::Instance(_) => {
                let missing = ErrorConfig::item_not_assignable(&self.type_name(value));
                self.dunder_call(frame, line, value, "__setitem__", vec![index, item], missing);
                Ok(())
            }
            _ => Err(NodeError::Type(
                ErrorConfig::item_not_assignable(&self.type_name(value)).message,
            )),
        }
    }

    /// `value[lo:hi]`：列表与元组产生新的对象
    pub(crate) fn slice_value(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        match self.value(value) {
            Value::List(s) => {
                let elemall = s.elemall;
                let list = self.intern(ValueKey::Derived(site, "slice", value, value), |interp| {
                    Value::List(SeqObj {
                        elemall: interp.graph.new_node(),
                    })
                });
                let sliced = self.seq_elemall(list);
                self.graph.connect_nodes(elemall, sliced);
                Ok(self.graph.simple_node(list))
            }
            Value::Tuple(t) => {
                let elemall = t.elemall;
                let tuple = self.intern(ValueKey::Derived(site, "slice", value, value), |interp| {
                    Value::Tuple(TupleObj {
                        elemall: interp.graph.new_node(),
                        elements: None,
                    })
                });
                let sliced = self.seq_elemall(tuple);
                self.graph.connect_nodes(elemall, sliced);
                Ok(self.graph.simple_node(tuple))
            }
            Value::Prim(Prim::Str | Prim::Unicode) => Ok(self.graph.simple_node(value)),
            Value::Instance(_) => {
                let int = self.prim_node(Prim::Int);
                let missing = ErrorConfig::unsubscriptable(&self.type_name(value));
                Ok(self.dunder_call(frame, line, value, "__getslice__", vec![int, int], missing))
            }
            _ => Err(NodeError::Type(
                ErrorConfig::unsubscriptable(&self.type_name(value)).message,
            )),
        }
    }

    /// `value[lo:hi] = items`
    pub(crate) fn slice_assign_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        items: NodeId,
    ) -> NodeResult<()> {
        match self.value(value) {
            Value::List(s) => {
                let elemall = s.elemall;
                let elems = self.iter_node(frame, line, items);
                self.graph.connect_nodes(elems, elemall);
                Ok(())
            }
            Value::Instance(_) => Ok(()),
            _ => Err(NodeError::Type(
                ErrorConfig::item_not_assignable(&self.type_name(value)).message,
            )),
        }
    }

    /// 赋值解包：定长元组逐个对应并检查个数，其余回退到迭代元素
    pub(crate) fn tuple_unpack_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        targets: &[NodeId],
    ) {
        if let Value::Tuple(TupleObj {
            elements: Some(elements),
            ..
        }) = self.value(value)
        {
            if elements.len() != targets.len() {
                let spec = ErrorConfig::unpack_mismatch(targets.len(), elements.len());
                self.raise_spec(frame, line, &spec);
                return;
            }
            let pairs: Vec<(NodeId, NodeId)> =
                elements.iter().copied().zip(targets.iter().copied()).collect();
            for (src, dst) in pairs {
                self.graph.connect_nodes(src, dst);
            }
            return;
        }
        match self.iter_element_at(frame, line, value) {
            Ok(elems) => {
                for &target in targets {
                    self.graph.connect_nodes(elems, target);
                }
                self.raise_spec(frame, line, &ErrorConfig::unpack_unknown(targets.len()));
            }
            Err(e) => self.raise_spec(frame, line, &e.to_spec()),
        }
    }

    /// 调用中的 `*args` 展开
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn star_args_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        targets: &[NodeId],
        required: usize,
        given: usize,
        allowed: usize,
        rest: Option<NodeId>,
    ) {
        if let Value::Tuple(TupleObj {
            elements: Some(elements),
            ..
        }) = self.value(value)
        {
            let elements = elements.clone();
            for (src, dst) in elements.iter().zip(targets) {
                self.graph.connect_nodes(*src, *dst);
            }
            if elements.len() > targets.len() {
                match rest {
                    Some(rest) => {
                        for &src in &elements[targets.len()..] {
                            self.graph.connect_nodes(src, rest);
                        }
                    }
                    None => {
                        let spec = ErrorConfig::too_many_args(given + elements.len(), allowed);
                        self.raise_spec(frame, line, &spec);
                    }
                }
            }
            if elements.len() < required {
                let spec = ErrorConfig::too_few_args(given + elements.len(), given + required);
                self.raise_spec(frame, line, &spec);
            }
            return;
        }
        match self.iter_element_at(frame, line, value) {
            Ok(elems) => {
                for &target in targets.iter().chain(rest.iter()) {
                    self.graph.connect_nodes(elems, target);
                }
            }
            Err(e) => self.raise_spec(frame, line, &e.to_spec()),
        }
    }

    /// `len(value)`
    pub(crate) fn len_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        match self.value(value) {
            Value::List(_) | Value::Tuple(_) | Value::Set { .. } | Value::Dict(_) => {
                Ok(self.prim_node(Prim::Int))
            }
            Value::Prim(Prim::Str | Prim::Unicode | Prim::XRange) => Ok(self.prim_node(Prim::Int)),
            Value::Instance(_) => {
                let missing = ErrorConfig::no_len(&self.type_name(value));
                self.dunder_call(frame, line, value, "__len__", Vec::new(), missing);
                Ok(self.prim_node(Prim::Int))
            }
            _ => Err(NodeError::Type(
                ErrorConfig::no_len(&self.type_name(value)).message,
            )),
        }
    }

    /// `x in value` 要求 value 是容器
    pub(crate) fn contains_value(
        &self,
        value: ValueId,
    ) -> NodeResult<()> {
        match self.value(value) {
            Value::List(_)
            | Value::Tuple(_)
            | Value::Set { .. }
            | Value::Dict(_)
            | Value::Iter(_)
            | Value::Generator(_)
            | Value::Instance(_) => Ok(()),
            Value::Prim(Prim::Str | Prim::Unicode | Prim::XRange | Prim::File) => Ok(()),
            _ => Err(NodeError::Type(
                ErrorConfig::not_container(&self.type_name(value)).message,
            )),
        }
    }

    /// 字典构造与 `update`：映射直接合并，可迭代对象逐个转换元素
    pub(crate) fn dict_update_value(
        &mut self,
        frame: FrameId,
        line: usize,
        value: ValueId,
        key: NodeId,
        values: NodeId,
    ) -> NodeResult<()> {
        match self.value(value) {
            Value::Dict(d) => {
                let (k, v) = (d.key, d.value);
                self.graph.connect_nodes(k, key);
                self.graph.connect_nodes(v, values);
                Ok(())
            }
            Value::Instance(_) => Ok(()),
            _ => {
                let elems = self.iter_element_at(frame, line, value)?;
                self.attach(
                    elems,
                    Op::DictPair {
                        frame,
                        line,
                        key,
                        value: values,
                    },
                );
                Ok(())
            }
        }
    }

    /// 可迭代对象的一个元素转换为 (键, 值)
    pub(crate) fn dict_pair_value(
        &mut self,
        frame: FrameId,
        line: usize,
        item: ValueId,
        key: NodeId,
        values: NodeId,
    ) {
        let pair = match self.value(item) {
            Value::Tuple(TupleObj {
                elements: Some(elements),
                ..
            }) => {
                if elements.len() != 2 {
                    let spec = ErrorConfig::bad_dict_length(elements.len());
                    self.raise_spec(frame, line, &spec);
                    return;
                }
                (elements[0], elements[1])
            }
            Value::Tuple(TupleObj { elemall, .. }) | Value::List(SeqObj { elemall }) => {
                (*elemall, *elemall)
            }
            Value::Prim(Prim::Str | Prim::Unicode) => {
                let node = self.graph.simple_node(item);
                (node, node)
            }
            _ => {
                let spec = ErrorConfig::bad_dict_element(&self.type_name(item));
                self.raise_spec(frame, line, &spec);
                return;
            }
        };
        self.graph.connect_nodes(pair.0, key);
        self.graph.connect_nodes(pair.1, values);
    }

    /// 集合交集：只保留两侧都出现过其类型的元素
    pub(crate) fn mixed_set(
        &mut self,
        site: AstId,
        recv: ValueId,
        frozen: bool,
        own: NodeId,
        other: NodeId,
    ) -> ValueId {
        let set = self.intern(ValueKey::Derived(site, "intersection", recv, recv), |interp| {
            Value::Set {
                seq: SeqObj {
                    elemall: interp.graph.new_node(),
                },
                frozen,
            }
        });
        let target = self.seq_elemall(set);
        let op = self.new_op(Op::SetMix {
            lseen: Vec::new(),
            rseen: Vec::new(),
            target,
        });
        self.graph.connect(own, Receiver::Op(op, 0));
        self.graph.connect(other, Receiver::Op(op, 1));
        set
    }

    /// 交集混合器收到一侧的元素
    pub(crate) fn set_mix_value(
        &mut self,
        mine: &mut Vec<ValueId>,
        other: &[ValueId],
        value: ValueId,
        target: NodeId,
    ) {
        if mine.contains(&value) {
            return;
        }
        mine.push(value);
        let class = self.class_of(value);
        let matches: Vec<ValueId> = other
            .iter()
            .copied()
            .filter(|&o| self.class_of(o) == class)
            .collect();
        if matches.is_empty() {
            return;
        }
        self.graph.add(target, value);
        for o in matches {
            self.graph.add(target, o);
        }
    }
}
