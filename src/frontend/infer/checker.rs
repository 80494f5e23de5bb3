//! 类型检查节点与饱和后检查
//!
//! - [`ArgSpec`]：内建函数参数规格（任意、类型、可迭代元素、字典键值、多选一）
//! - 类型检查操作：对流入的每个值检查规格，不符则在帧上抛出 `TypeError`
//! - [`PostCheck`]：饱和后才能判定的检查（必须有定义的节点、属性存在性、
//!   `assert isinstance` 声明）

use std::collections::HashSet;

use super::errors::{ErrorConfig, ExcSpec};
use super::frame::FrameId;
use super::graph::{NodeId, Receiver};
use super::ops::Op;
use super::value::{BuiltinType, Value, ValueId};
use super::Interpreter;

/// 参数规格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    Any,
    /// 类型匹配（用户类按内建基类判定）
    Type(BuiltinType),
    /// 可迭代，且元素匹配
    IterOf(&'static ArgSpec),
    /// 字典，键、值分别匹配
    DictOf(&'static ArgSpec, &'static ArgSpec),
    /// 任一匹配
    OneOf(&'static [ArgSpec]),
}

pub const ANY: ArgSpec = ArgSpec::Any;
pub const INT: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::Int),
    ArgSpec::Type(BuiltinType::Long),
]);
pub const NUM: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::Int),
    ArgSpec::Type(BuiltinType::Long),
    ArgSpec::Type(BuiltinType::Float),
]);
pub const STR: ArgSpec = ArgSpec::Type(BuiltinType::BaseString);
pub const STR_OR_NONE: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::BaseString),
    ArgSpec::Type(BuiltinType::NoneType),
]);
pub const STR_OR_TUPLE: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::BaseString),
    ArgSpec::Type(BuiltinType::Tuple),
]);
pub const ITER_STR: ArgSpec = ArgSpec::IterOf(&STR);
pub const ITER_ANY: ArgSpec = ArgSpec::IterOf(&ANY);
pub const INT_DICT: ArgSpec = ArgSpec::DictOf(&INT, &ANY);

impl ArgSpec {
    /// 规格的可读描述
    pub fn describe(&self) -> String {
        match self {
            ArgSpec::Any => "anything".to_string(),
            ArgSpec::Type(t) => t.name().to_string(),
            ArgSpec::IterOf(inner) => format!("iterable of {}", inner.describe()),
            ArgSpec::DictOf(k, v) => format!("dict of {}: {}", k.describe(), v.describe()),
            ArgSpec::OneOf(specs) => specs
                .iter()
                .map(|s| s.describe())
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/// 饱和后检查
#[derive(Debug, Clone)]
pub enum PostCheck {
    /// 节点为空则抛出 `spec`；`owner` 为类时，不透明类跳过
    MustBeDefined {
        node: NodeId,
        frame: FrameId,
        line: usize,
        spec: ExcSpec,
        owner: Option<ValueId>,
    },
    /// 属性引用结果为空则报告属性不存在
    AttrFound {
        node: NodeId,
        frame: FrameId,
        line: usize,
        obj: ValueId,
        name: String,
    },
    /// `assert isinstance(x, T)`：x 的每个值都必须是 T 的实例
    IsInstance {
        node: NodeId,
        classes: NodeId,
        frame: FrameId,
        line: usize,
        blame: String,
    },
}

impl Interpreter {
    /// 在节点上挂一个类型检查
    pub(crate) fn check_arg(
        &mut self,
        frame: FrameId,
        line: usize,
        node: NodeId,
        spec: ArgSpec,
        blame: String,
    ) {
        if spec == ArgSpec::Any {
            return;
        }
        let op = self.new_op(Op::TypeCheck {
            frame,
            line,
            spec,
            blame,
        });
        self.graph.connect(node, Receiver::Op(op, 0));
    }

    /// 类型检查操作收到一个值
    pub(crate) fn type_check_value(
        &mut self,
        frame: FrameId,
        line: usize,
        spec: ArgSpec,
        blame: &str,
        value: ValueId,
    ) {
        if self.config.ignore_none && self.is_none(value) {
            return;
        }
        if self.value_matches(value, spec) {
            return;
        }
        // 可迭代与字典规格在元素层面继续检查
        let nested = match spec {
            ArgSpec::IterOf(inner) => self.iter_element(value).ok().map(|n| vec![(n, *inner)]),
            ArgSpec::DictOf(k, v) => match self.value(value) {
                Value::Dict(d) => Some(vec![(d.key, *k), (d.value, *v)]),
                _ => None,
            },
            _ => None,
        };
        match nested {
            Some(checks) => {
                for (node, inner) in checks {
                    self.check_arg(frame, line, node, inner, blame.to_string());
                }
            }
            None => {
                let got = self.type_name(value);
                let spec = ErrorConfig::type_mismatch(blame, &spec.describe(), &got);
                self.raise_spec(frame, line, &spec);
            }
        }
    }

    /// 值是否直接满足规格（可迭代/字典规格在此只在元素检查前返回 false）
    pub fn value_matches(
        &self,
        value: ValueId,
        spec: ArgSpec,
    ) -> bool {
        match spec {
            ArgSpec::Any => true,
            ArgSpec::Type(ty) => self.is_instance_of_builtin(value, ty),
            ArgSpec::OneOf(specs) => specs.iter().any(|s| self.value_matches(value, *s)),
            ArgSpec::IterOf(_) | ArgSpec::DictOf(..) => false,
        }
    }

    /// 值是否是内建类型 `ty` 的实例
    pub fn is_instance_of_builtin(
        &self,
        value: ValueId,
        ty: BuiltinType,
    ) -> bool {
        match self.builtin_type_of(value) {
            Some(bt) => bt.is_subtype_of(ty),
            None => {
                ty == BuiltinType::Object
                    || self.class_has_builtin_base(self.class_of(value), ty, &mut HashSet::new())
            }
        }
    }

    fn class_has_builtin_base(
        &self,
        class: ValueId,
        ty: BuiltinType,
        visited: &mut HashSet<ValueId>,
    ) -> bool {
        if !visited.insert(class) {
            return false;
        }
        let Some(obj) = self.class_obj(class) else {
            return false;
        };
        self.graph.types(obj.baseklass).iter().any(|&base| match self.value(base) {
            Value::Type(bt) => bt.is_subtype_of(ty),
            Value::Class(_) => self.class_has_builtin_base(base, ty, visited),
            _ => false,
        })
    }

    /// 类是否继承了 `object` 以外的内建类型（其属性不可知）
    pub fn is_opaque_class(
        &self,
        class: ValueId,
    ) -> bool {
        self.opaque_rec(class, &mut HashSet::new())
    }

    fn opaque_rec(
        &self,
        class: ValueId,
        visited: &mut HashSet<ValueId>,
    ) -> bool {
        if !visited.insert(class) {
            return false;
        }
        let Some(obj) = self.class_obj(class) else {
            return false;
        };
        // 内建异常类的属性表不完整
        if obj.builtin {
            return true;
        }
        // 基类表达式没有推断出值（如导入失败）
        if obj.bases.iter().any(|&b| self.graph.is_empty(b)) {
            return true;
        }
        self.graph.types(obj.baseklass).iter().any(|&base| match self.value(base) {
            Value::Type(BuiltinType::Object) => false,
            Value::Type(_) => true,
            Value::Class(_) => self.opaque_rec(base, visited),
            _ => true,
        })
    }

    /// 值是否是某个类值（用户类、内建类型或它们的元组）的实例
    pub fn is_instance_of_class_value(
        &self,
        value: ValueId,
        class: ValueId,
    ) -> bool {
        match self.value(class) {
            Value::Type(ty) => self.is_instance_of_builtin(value, *ty),
            Value::Class(_) => match self.value(value) {
                Value::Instance(_) | Value::Exception(_) => {
                    self.is_subclass(self.class_of(value), class)
                }
                _ => false,
            },
            Value::Tuple(t) => {
                let nodes = match &t.elements {
                    Some(elements) => elements.clone(),
                    None => vec![t.elemall],
                };
                nodes.iter().any(|&n| {
                    self.graph
                        .types(n)
                        .iter()
                        .any(|&c| self.is_instance_of_class_value(value, c))
                })
            }
            _ => false,
        }
    }

    pub(crate) fn add_post_check(
        &mut self,
        check: PostCheck,
    ) {
        self.checks.push(check);
    }

    /// 节点饱和后仍为空则报告；`owner` 为不透明类时不报告
    pub(crate) fn must_be_defined(
        &mut self,
        node: NodeId,
        frame: FrameId,
        line: usize,
        spec: ExcSpec,
        owner: Option<ValueId>,
    ) {
        self.add_post_check(PostCheck::MustBeDefined {
            node,
            frame,
            line,
            spec,
            owner,
        });
    }

    /// 执行一轮饱和后检查；返回是否有检查触发
    pub(crate) fn run_post_checks(&mut self) -> bool {
        let checks = std::mem::take(&mut self.checks);
        let mut remaining = Vec::with_capacity(checks.len());
        let mut fired = false;
        for check in checks {
            if self.evaluate_check(&check) {
                fired = true;
            } else {
                remaining.push(check);
            }
        }
        // 检查期间不会注册新检查，但保持追加语义
        remaining.append(&mut self.checks);
        self.checks = remaining;
        fired
    }

    /// 返回 true 表示检查已触发（之后不再评估）
    fn evaluate_check(
        &mut self,
        check: &PostCheck,
    ) -> bool {
        match check {
            PostCheck::MustBeDefined {
                node,
                frame,
                line,
                spec,
                owner,
            } => {
                if !self.graph.is_empty(*node) {
                    return false;
                }
                if let Some(class) = owner {
                    if self.is_opaque_class(*class) {
                        return false;
                    }
                }
                self.raise_spec(*frame, *line, spec);
                true
            }
            PostCheck::AttrFound {
                node,
                frame,
                line,
                obj,
                name,
            } => {
                if !self.graph.is_empty(*node) {
                    return false;
                }
                let class = match self.value(*obj) {
                    Value::Class(_) => *obj,
                    _ => self.class_of(*obj),
                };
                if self.is_opaque_class(class) {
                    return false;
                }
                let spec = ErrorConfig::attribute_not_found(&self.short_name(*obj), name);
                self.raise_spec(*frame, *line, &spec);
                true
            }
            PostCheck::IsInstance {
                node,
                classes,
                frame,
                line,
                blame,
            } => {
                let class_values = self.graph.values(*classes);
                if class_values.is_empty() {
                    return false;
                }
                let offenders: Vec<ValueId> = self
                    .graph
                    .values(*node)
                    .into_iter()
                    .filter(|&v| !(self.config.ignore_none && self.is_none(v)))
                    .filter(|&v| {
                        !class_values
                            .iter()
                            .any(|&c| self.is_instance_of_class_value(v, c))
                    })
                    .collect();
                if offenders.is_empty() {
                    return false;
                }
                let expected: Vec<String> =
                    class_values.iter().map(|&c| self.short_name(c)).collect();
                for v in offenders {
                    let got = self.type_name(v);
                    let spec = ErrorConfig::type_mismatch(blame, &expected.join(" or "), &got);
                    self.raise_spec(*frame, *line, &spec);
                }
                true
            }
        }
    }
}
