//! 运算符
//!
//! 二元运算对左右操作数的每一对值分别求结果（见 [`BinaryState`]），
//! 数值按等级提升，容器运算产生按位置驻留的新对象，
//! 用户实例走 `__add__` / `__radd__` 等协议方法。

use super::errors::{ErrorConfig, NodeError, NodeResult};
use super::frame::FrameId;
use super::function::CallArgs;
use super::graph::{NodeId, Receiver};
use super::ops::Op;
use super::value::{Prim, SeqObj, TupleObj, Value, ValueId, ValueKey};
use super::Interpreter;
use crate::frontend::parser::ast::{AstId, BinOp, CmpOp, UnaryOp};

/// 一元运算（含 `abs()`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    Neg,
    Pos,
    Invert,
    Not,
    Abs,
}

impl From<UnaryOp> for UnaryKind {
    fn from(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Neg => UnaryKind::Neg,
            UnaryOp::Pos => UnaryKind::Pos,
            UnaryOp::Invert => UnaryKind::Invert,
            UnaryOp::Not => UnaryKind::Not,
        }
    }
}

impl UnaryKind {
    pub fn dunder(self) -> Option<&'static str> {
        match self {
            UnaryKind::Neg => Some("__neg__"),
            UnaryKind::Pos => Some("__pos__"),
            UnaryKind::Invert => Some("__invert__"),
            UnaryKind::Abs => Some("__abs__"),
            UnaryKind::Not => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryKind::Neg => "-",
            UnaryKind::Pos => "+",
            UnaryKind::Invert => "~",
            UnaryKind::Not => "not",
            UnaryKind::Abs => "abs()",
        }
    }
}

/// 二元运算操作的状态：两侧已见过的值
#[derive(Debug, Clone)]
pub struct BinaryState {
    pub frame: FrameId,
    pub line: usize,
    pub site: AstId,
    pub op: BinOp,
    /// 增量赋值（`+=` 等）
    pub inplace: bool,
    pub target: NodeId,
    pub lseen: Vec<ValueId>,
    pub rseen: Vec<ValueId>,
}

fn is_bitwise(op: BinOp) -> bool {
    matches!(
        op,
        BinOp::LShift | BinOp::RShift | BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor
    )
}

impl Interpreter {
    /// 构建期：`op operand`
    pub(crate) fn unary_node(
        &mut self,
        frame: FrameId,
        line: usize,
        op: UnaryKind,
        operand: NodeId,
    ) -> NodeId {
        if op == UnaryKind::Not {
            return self.prim_node(Prim::Bool);
        }
        let target = self.graph.new_node();
        self.attach(operand, Op::Unary { frame, line, op, target });
        target
    }

    pub(crate) fn unary_value(
        &mut self,
        frame: FrameId,
        line: usize,
        op: UnaryKind,
        value: ValueId,
    ) -> NodeResult<NodeId> {
        let bad = |interp: &Self| {
            NodeError::Type(
                ErrorConfig::bad_unary_operand(op.symbol(), &interp.type_name(value)).message,
            )
        };
        match self.value(value) {
            Value::Prim(p) if p.is_numeric() => {
                let p = *p;
                let result = match (op, p) {
                    (UnaryKind::Invert, p) if !p.is_integral() => return Err(bad(self)),
                    (UnaryKind::Abs, Prim::Complex) => Prim::Float,
                    (_, Prim::Bool) => Prim::Int,
                    (_, p) => p,
                };
                Ok(self.prim_node(result))
            }
            Value::Instance(_) => match op.dunder() {
                Some(name) => {
                    let missing = ErrorConfig::bad_unary_operand(op.symbol(), &self.type_name(value));
                    Ok(self.dunder_call(frame, line, value, name, Vec::new(), missing))
                }
                None => Ok(self.prim_node(Prim::Bool)),
            },
            _ => Err(bad(self)),
        }
    }

    /// 构建期：`left op right`
    pub(crate) fn binary_node(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        op: BinOp,
        left: NodeId,
        right: NodeId,
    ) -> NodeId {
        self.binary_op(frame, line, site, op, false, left, right)
    }

    /// 构建期：`left op= right`
    pub(crate) fn inplace_node(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        op: BinOp,
        left: NodeId,
        right: NodeId,
    ) -> NodeId {
        self.binary_op(frame, line, site, op, true, left, right)
    }

    #[allow(clippy::too_many_arguments)]
    fn binary_op(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        op: BinOp,
        inplace: bool,
        left: NodeId,
        right: NodeId,
    ) -> NodeId {
        let target = self.graph.new_node();
        let id = self.new_op(Op::Binary(Box::new(BinaryState {
            frame,
            line,
            site,
            op,
            inplace,
            target,
            lseen: Vec::new(),
            rseen: Vec::new(),
        })));
        self.graph.connect(left, Receiver::Op(id, 0));
        self.graph.connect(right, Receiver::Op(id, 1));
        target
    }

    /// 二元运算操作收到一侧的新值：与另一侧已见过的值逐一配对
    pub(crate) fn binary_input(
        &mut self,
        state: &mut BinaryState,
        slot: u8,
        value: ValueId,
    ) {
        let (mine, other) = if slot == 0 {
            (&mut state.lseen, &state.rseen)
        } else {
            (&mut state.rseen, &state.lseen)
        };
        if mine.contains(&value) {
            return;
        }
        mine.push(value);
        let partners = other.clone();
        for partner in partners {
            let (l, r) = if slot == 0 { (value, partner) } else { (partner, value) };
            self.binary_pair(state, l, r);
        }
    }

    fn binary_pair(
        &mut self,
        state: &BinaryState,
        l: ValueId,
        r: ValueId,
    ) {
        if self.config.ignore_none && (self.is_none(l) || self.is_none(r)) {
            return;
        }
        match self.binary_value(state, l, r) {
            Ok(node) => self.graph.connect_nodes(node, state.target),
            Err(e) => self.raise_spec(state.frame, state.line, &e.to_spec()),
        }
    }

    fn unsupported(
        &self,
        op: BinOp,
        l: ValueId,
        r: ValueId,
    ) -> NodeError {
        NodeError::Type(
            ErrorConfig::unsupported_operand(op.symbol(), &self.type_name(l), &self.type_name(r))
                .message,
        )
    }

    /// 一对操作数值的运算结果
    fn binary_value(
        &mut self,
        state: &BinaryState,
        l: ValueId,
        r: ValueId,
    ) -> NodeResult<NodeId> {
        let op = state.op;
        let is_instance = |v: &Value| matches!(v, Value::Instance(_));
        if is_instance(self.value(l)) || is_instance(self.value(r)) {
            return Ok(self.instance_binary(state, l, r));
        }
        if let (Some(lp), Some(rp)) = (self.as_prim(l), self.as_prim(r)) {
            return self.prim_binary(state, lp, rp, l, r);
        }
        if let Some(node) = self.sequence_binary(state, l, r)? {
            return Ok(node);
        }
        Err(self.unsupported(op, l, r))
    }

    fn prim_binary(
        &mut self,
        state: &BinaryState,
        lp: Prim,
        rp: Prim,
        l: ValueId,
        r: ValueId,
    ) -> NodeResult<NodeId> {
        let op = state.op;
        let unicode = lp == Prim::Unicode || rp == Prim::Unicode;
        let string = if unicode { Prim::Unicode } else { Prim::Str };
        // 格式化
        if op == BinOp::Mod && lp.is_string() {
            return Ok(self.prim_node(string));
        }
        if let (Some(lr), Some(rr)) = (lp.rank(), rp.rank()) {
            if is_bitwise(op) {
                if !lp.is_integral() || !rp.is_integral() {
                    return Err(self.unsupported(op, l, r));
                }
                let both_bool = lp == Prim::Bool && rp == Prim::Bool;
                if both_bool && matches!(op, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor) {
                    return Ok(self.prim_node(Prim::Bool));
                }
            }
            if matches!(op, BinOp::Div | BinOp::FloorDiv | BinOp::Mod) {
                self.raise_spec(state.frame, state.line, &ErrorConfig::zero_division());
            }
            // 至少为 int
            return Ok(self.prim_node(Prim::from_rank(lr.max(rr).max(1))));
        }
        match op {
            BinOp::Add if lp.is_string() && rp.is_string() => Ok(self.prim_node(string)),
            BinOp::Mul if lp.is_string() && rp.is_integral() => Ok(self.prim_node(lp)),
            BinOp::Mul if lp.is_integral() && rp.is_string() => Ok(self.prim_node(rp)),
            _ => Err(self.unsupported(op, l, r)),
        }
    }

    /// 列表、元组、集合；不适用时返回 `Ok(None)`
    fn sequence_binary(
        &mut self,
        state: &BinaryState,
        l: ValueId,
        r: ValueId,
    ) -> NodeResult<Option<NodeId>> {
        let op = state.op;
        let integral = |interp: &Self, v: ValueId| {
            interp.as_prim(v).map(|p| p.is_integral()).unwrap_or(false)
        };
        let lval = self.value(l).clone();
        let rval = self.value(r).clone();
        let node = match (op, &lval, &rval) {
            // 重复：同一个对象
            (BinOp::Mul, Value::List(_) | Value::Tuple(_), _) if integral(self, r) => {
                self.graph.simple_node(l)
            }
            (BinOp::Mul, _, Value::List(_) | Value::Tuple(_)) if integral(self, l) => {
                self.graph.simple_node(r)
            }
            (BinOp::Add, Value::List(ls), Value::List(rs)) => {
                if state.inplace {
                    self.graph.connect_nodes(rs.elemall, ls.elemall);
                    self.graph.simple_node(l)
                } else {
                    let list = self.intern(ValueKey::Derived(state.site, "concat", l, r), |interp| {
                        Value::List(SeqObj {
                            elemall: interp.graph.new_node(),
                        })
                    });
                    let elemall = self.seq_elemall(list);
                    self.graph.connect_nodes(ls.elemall, elemall);
                    self.graph.connect_nodes(rs.elemall, elemall);
                    self.graph.simple_node(list)
                }
            }
            // `lst += iterable` 就地扩展
            (BinOp::Add, Value::List(ls), _) if state.inplace => {
                let elems = self.iter_element_at(state.frame, state.line, r)?;
                self.graph.connect_nodes(elems, ls.elemall);
                self.graph.simple_node(l)
            }
            (BinOp::Add, Value::Tuple(lt), Value::Tuple(rt)) => {
                let elements = match (&lt.elements, &rt.elements) {
                    (Some(a), Some(b)) => Some(a.iter().chain(b).copied().collect::<Vec<_>>()),
                    _ => None,
                };
                let tuple = self.intern(ValueKey::Derived(state.site, "concat", l, r), |interp| {
                    Value::Tuple(TupleObj {
                        elemall: interp.graph.new_node(),
                        elements,
                    })
                });
                let elemall = self.seq_elemall(tuple);
                self.graph.connect_nodes(lt.elemall, elemall);
                self.graph.connect_nodes(rt.elemall, elemall);
                self.graph.simple_node(tuple)
            }
            (
                _,
                Value::Set {
                    seq: ls,
                    frozen,
                },
                Value::Set { seq: rs, .. },
            ) => match op {
                BinOp::BitAnd => {
                    let set = self.mixed_set(state.site, l, *frozen, ls.elemall, rs.elemall);
                    self.graph.simple_node(set)
                }
                BinOp::BitOr | BinOp::BitXor | BinOp::Sub => {
                    let (tag, sources) = match op {
                        BinOp::Sub => ("difference", vec![ls.elemall]),
                        _ => ("union", vec![ls.elemall, rs.elemall]),
                    };
                    let frozen = *frozen;
                    let set = self.intern(ValueKey::Derived(state.site, tag, l, r), |interp| {
                        Value::Set {
                            seq: SeqObj {
                                elemall: interp.graph.new_node(),
                            },
                            frozen,
                        }
                    });
                    let elemall = self.seq_elemall(set);
                    for src in sources {
                        self.graph.connect_nodes(src, elemall);
                    }
                    self.graph.simple_node(set)
                }
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    /// 实例参与的运算：正向方法在左操作数上，反向方法在右操作数上
    fn instance_binary(
        &mut self,
        state: &BinaryState,
        l: ValueId,
        r: ValueId,
    ) -> NodeId {
        let (forward, reverse) = state.op.dunders();
        let methods = self.graph.new_node();
        let result = self.graph.new_node();
        let mut owner = None;
        for (recv, other, name) in [(l, r, forward), (r, l, reverse)] {
            if !matches!(self.value(recv), Value::Instance(_)) {
                continue;
            }
            owner.get_or_insert(self.class_of(recv));
            let method = self.instance_attr(state.frame, state.line, state.site, recv, name);
            self.graph.connect_nodes(method, methods);
            let mut call = CallArgs::new(state.frame, state.line, state.site);
            call.args.push(self.graph.simple_node(other));
            let produced = self.call_node(call, method);
            self.graph.connect_nodes(produced, result);
        }
        let spec =
            ErrorConfig::unsupported_operand(state.op.symbol(), &self.type_name(l), &self.type_name(r));
        self.must_be_defined(methods, state.frame, state.line, spec, owner);
        result
    }

    /// 构建期：比较链，结果总是 `bool`；`in` / `not in` 检查右操作数是容器
    pub(crate) fn compare_node(
        &mut self,
        frame: FrameId,
        line: usize,
        comparisons: &[(CmpOp, NodeId)],
    ) -> NodeId {
        for &(op, right) in comparisons {
            if matches!(op, CmpOp::In | CmpOp::NotIn) {
                self.attach(right, Op::Contains { frame, line });
            }
        }
        self.prim_node(Prim::Bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_kind_from_ast() {
        assert_eq!(UnaryKind::from(UnaryOp::Invert), UnaryKind::Invert);
        assert_eq!(UnaryKind::Abs.dunder(), Some("__abs__"));
        assert_eq!(UnaryKind::Not.dunder(), None);
    }

    #[test]
    fn test_bitwise_classification() {
        assert!(is_bitwise(BinOp::BitXor));
        assert!(is_bitwise(BinOp::LShift));
        assert!(!is_bitwise(BinOp::Add));
    }
}
