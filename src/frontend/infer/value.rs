//! 值宇宙
//!
//! 所有推断出的值都存放在解释器的值表中，以 [`ValueId`] 引用。
//! 值按构造位置驻留（见 [`ValueKey`]），保证格有限、传播可终止。

use std::fmt;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

use super::frame::FrameId;
use super::graph::NodeId;
use super::namespace::SpaceId;
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

/// 值 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl ValueId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ValueId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// 原始对象（全局单例）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prim {
    None,
    Bool,
    Int,
    Long,
    Float,
    Complex,
    Str,
    Unicode,
    File,
    Object,
    XRange,
}

impl Prim {
    pub const ALL: [Prim; 11] = [
        Prim::None,
        Prim::Bool,
        Prim::Int,
        Prim::Long,
        Prim::Float,
        Prim::Complex,
        Prim::Str,
        Prim::Unicode,
        Prim::File,
        Prim::Object,
        Prim::XRange,
    ];

    /// 数值等级：bool < int < long < float < complex
    pub fn rank(self) -> Option<u8> {
        match self {
            Prim::Bool => Some(0),
            Prim::Int => Some(1),
            Prim::Long => Some(2),
            Prim::Float => Some(3),
            Prim::Complex => Some(4),
            _ => None,
        }
    }

    pub fn from_rank(rank: u8) -> Prim {
        match rank {
            0 => Prim::Bool,
            1 => Prim::Int,
            2 => Prim::Long,
            3 => Prim::Float,
            _ => Prim::Complex,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.rank().is_some()
    }

    pub fn is_integral(self) -> bool {
        matches!(self, Prim::Bool | Prim::Int | Prim::Long)
    }

    pub fn is_string(self) -> bool {
        matches!(self, Prim::Str | Prim::Unicode)
    }

    /// 对应的内建类型
    pub fn builtin_type(self) -> BuiltinType {
        match self {
            Prim::None => BuiltinType::NoneType,
            Prim::Bool => BuiltinType::Bool,
            Prim::Int => BuiltinType::Int,
            Prim::Long => BuiltinType::Long,
            Prim::Float => BuiltinType::Float,
            Prim::Complex => BuiltinType::Complex,
            Prim::Str => BuiltinType::Str,
            Prim::Unicode => BuiltinType::Unicode,
            Prim::File => BuiltinType::File,
            Prim::Object => BuiltinType::Object,
            Prim::XRange => BuiltinType::XRange,
        }
    }
}

/// 内建类型对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    Object,
    Type,
    NoneType,
    Bool,
    Int,
    Long,
    Float,
    Complex,
    BaseString,
    Str,
    Unicode,
    File,
    XRange,
    List,
    Tuple,
    Dict,
    Set,
    FrozenSet,
    Iterator,
    Generator,
    Enumerate,
    Reversed,
    Function,
    BuiltinFunction,
    Method,
    Module,
    StaticMethod,
    ClassMethod,
    Property,
    Traceback,
}

impl BuiltinType {
    pub const ALL: [BuiltinType; 30] = [
        BuiltinType::Object,
        BuiltinType::Type,
        BuiltinType::NoneType,
        BuiltinType::Bool,
        BuiltinType::Int,
        BuiltinType::Long,
        BuiltinType::Float,
        BuiltinType::Complex,
        BuiltinType::BaseString,
        BuiltinType::Str,
        BuiltinType::Unicode,
        BuiltinType::File,
        BuiltinType::XRange,
        BuiltinType::List,
        BuiltinType::Tuple,
        BuiltinType::Dict,
        BuiltinType::Set,
        BuiltinType::FrozenSet,
        BuiltinType::Iterator,
        BuiltinType::Generator,
        BuiltinType::Enumerate,
        BuiltinType::Reversed,
        BuiltinType::Function,
        BuiltinType::BuiltinFunction,
        BuiltinType::Method,
        BuiltinType::Module,
        BuiltinType::StaticMethod,
        BuiltinType::ClassMethod,
        BuiltinType::Property,
        BuiltinType::Traceback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Object => "object",
            BuiltinType::Type => "type",
            BuiltinType::NoneType => "NoneType",
            BuiltinType::Bool => "bool",
            BuiltinType::Int => "int",
            BuiltinType::Long => "long",
            BuiltinType::Float => "float",
            BuiltinType::Complex => "complex",
            BuiltinType::BaseString => "basestring",
            BuiltinType::Str => "str",
            BuiltinType::Unicode => "unicode",
            BuiltinType::File => "file",
            BuiltinType::XRange => "xrange",
            BuiltinType::List => "list",
            BuiltinType::Tuple => "tuple",
            BuiltinType::Dict => "dict",
            BuiltinType::Set => "set",
            BuiltinType::FrozenSet => "frozenset",
            BuiltinType::Iterator => "iterator",
            BuiltinType::Generator => "generator",
            BuiltinType::Enumerate => "enumerate",
            BuiltinType::Reversed => "reversed",
            BuiltinType::Function => "function",
            BuiltinType::BuiltinFunction => "builtin_function_or_method",
            BuiltinType::Method => "instancemethod",
            BuiltinType::Module => "module",
            BuiltinType::StaticMethod => "staticmethod",
            BuiltinType::ClassMethod => "classmethod",
            BuiltinType::Property => "property",
            BuiltinType::Traceback => "traceback",
        }
    }

    /// 内建子类型关系（自反）
    pub fn is_subtype_of(
        self,
        other: BuiltinType,
    ) -> bool {
        if self == other || other == BuiltinType::Object {
            return true;
        }
        matches!(
            (self, other),
            (BuiltinType::Bool, BuiltinType::Int)
                | (BuiltinType::Str, BuiltinType::BaseString)
                | (BuiltinType::Unicode, BuiltinType::BaseString)
                | (BuiltinType::Enumerate, BuiltinType::Iterator)
                | (BuiltinType::Reversed, BuiltinType::Iterator)
        )
    }
}

/// `list` / `set` / `iterator`：元素汇合节点
#[derive(Debug, Clone)]
pub struct SeqObj {
    pub elemall: NodeId,
}

/// `tuple`：字面量构造时记住定长元素
#[derive(Debug, Clone)]
pub struct TupleObj {
    pub elemall: NodeId,
    pub elements: Option<Vec<NodeId>>,
}

/// `dict`：键、值节点
#[derive(Debug, Clone)]
pub struct DictObj {
    pub key: NodeId,
    pub value: NodeId,
}

/// `generator`：产出元素与 `send` 流入的值
#[derive(Debug, Clone)]
pub struct GenObj {
    pub elemall: NodeId,
    pub sent: NodeId,
}

/// 形参槽位，可嵌套解构
#[derive(Debug, Clone)]
pub enum ParamSlot {
    Name(String, NodeId),
    Tuple(Vec<ParamSlot>),
}

impl ParamSlot {
    pub fn display(&self) -> String {
        match self {
            ParamSlot::Name(name, _) => name.clone(),
            ParamSlot::Tuple(items) => format!(
                "({})",
                items
                    .iter()
                    .map(|p| p.display())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn keyword_name(&self) -> Option<&str> {
        match self {
            ParamSlot::Name(name, _) => Some(name),
            ParamSlot::Tuple(_) => None,
        }
    }
}

/// 用户函数（含 lambda）
#[derive(Debug, Clone)]
pub struct FuncObj {
    pub name: String,
    pub qualname: String,
    pub module: String,
    pub line: usize,
    pub space: SpaceId,
    pub frame: FrameId,
    pub params: Vec<ParamSlot>,
    /// 带默认值的尾部形参个数
    pub defaults: usize,
    /// `*args` 名称及其元组值
    pub vararg: Option<(String, ValueId)>,
    /// `**kwargs` 名称及其字典值
    pub kwarg: Option<(String, ValueId)>,
    /// 返回值汇合节点
    pub body: NodeId,
    pub generator: Option<ValueId>,
    pub is_lambda: bool,
    /// 调用位置 (模块, 行)
    pub callers: IndexSet<(String, usize)>,
    pub caller_frames: IndexSet<FrameId>,
}

impl FuncObj {
    /// 必需的位置参数个数
    pub fn required(&self) -> usize {
        self.params.len().saturating_sub(self.defaults)
    }

    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i >= self.required() {
                    format!("{}=...", p.display())
                } else {
                    p.display()
                }
            })
            .collect();
        if let Some((name, _)) = &self.vararg {
            parts.push(format!("*{}", name));
        }
        if let Some((name, _)) = &self.kwarg {
            parts.push(format!("**{}", name));
        }
        format!("{}({})", self.name, parts.join(", "))
    }
}

/// 类对象（用户类与内建异常类）
#[derive(Debug, Clone)]
pub struct ClassObj {
    pub name: String,
    pub qualname: String,
    pub module: String,
    pub line: usize,
    pub bases: Vec<NodeId>,
    /// 基类值的汇合
    pub baseklass: NodeId,
    /// 类属性表
    pub space: SpaceId,
    /// 唯一的实例值
    pub instance: ValueId,
    pub builtin: bool,
}

/// 实例对象，每个类一个
#[derive(Debug, Clone)]
pub struct InstanceObj {
    pub class: ValueId,
    pub attrs: IndexMap<String, NodeId>,
}

/// 带消息的异常对象
#[derive(Debug, Clone)]
pub struct ExceptionObj {
    pub class: ValueId,
    pub message: String,
}

/// 模块对象
#[derive(Debug, Clone)]
pub struct ModuleObj {
    pub name: String,
    pub path: Option<PathBuf>,
    pub space: SpaceId,
    pub frame: FrameId,
    pub is_stub: bool,
}

/// 回溯：异常值 + 产生它的帧
#[derive(Debug, Clone)]
pub struct TracebackObj {
    pub expt: ValueId,
    pub frame: FrameId,
    pub line: usize,
    pub uncertain: bool,
}

/// 值
#[derive(Debug, Clone)]
pub enum Value {
    Type(BuiltinType),
    Prim(Prim),
    List(SeqObj),
    Tuple(TupleObj),
    Set { seq: SeqObj, frozen: bool },
    Dict(DictObj),
    Iter(SeqObj),
    Generator(GenObj),
    BuiltinFunc(&'static str),
    BuiltinMethod { recv: ValueId, name: &'static str },
    Function(Box<FuncObj>),
    BoundMethod { recv: ValueId, func: ValueId },
    ClassMethod(ValueId),
    StaticMethod(ValueId),
    Property(ValueId),
    Class(Box<ClassObj>),
    Instance(InstanceObj),
    Exception(ExceptionObj),
    Module(Box<ModuleObj>),
    Traceback(TracebackObj),
    /// `super(class, recv)`：从 `class` 的基类开始查找，绑定到 `recv`
    Super { class: ValueId, recv: ValueId },
}

/// 包装器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapKind {
    ClassMethod,
    StaticMethod,
    Property,
}

/// 驻留键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Prim(Prim),
    Type(BuiltinType),
    /// 构造位置上的聚合对象
    Site(AstId, &'static str),
    /// 由构造位置和操作数决定的对象（拼接等）
    Derived(AstId, &'static str, ValueId, ValueId),
    /// 与某个值相关联的对象（函数的 `*args` 元组等）
    Owned(ValueId, &'static str),
    /// 内建方法的常量返回值
    Const(&'static str),
    BuiltinFunc(&'static str),
    BuiltinMethod(ValueId, &'static str),
    Bound(ValueId, ValueId),
    Wrapper(WrapKind, ValueId),
    Exception(ValueId, String),
    Traceback(ValueId, FrameId, usize, bool),
    Super(ValueId, ValueId),
}

impl Interpreter {
    pub fn value(
        &self,
        id: ValueId,
    ) -> &Value {
        &self.values[id.index()]
    }

    pub(crate) fn value_mut(
        &mut self,
        id: ValueId,
    ) -> &mut Value {
        &mut self.values[id.index()]
    }

    pub(crate) fn push_value(
        &mut self,
        value: Value,
    ) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(value);
        id
    }

    /// 按键驻留：首次时调用 `make` 构造
    pub(crate) fn intern(
        &mut self,
        key: ValueKey,
        make: impl FnOnce(&mut Self) -> Value,
    ) -> ValueId {
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let value = make(self);
        let id = self.push_value(value);
        self.interned.insert(key, id);
        id
    }

    pub fn prim(
        &self,
        prim: Prim,
    ) -> ValueId {
        self.prims[prim as usize]
    }

    pub fn type_value(
        &self,
        ty: BuiltinType,
    ) -> ValueId {
        self.types[ty as usize]
    }

    /// 原始单例的简单节点
    pub fn prim_node(
        &mut self,
        prim: Prim,
    ) -> NodeId {
        let value = self.prim(prim);
        self.graph.simple_node(value)
    }

    pub fn as_prim(
        &self,
        id: ValueId,
    ) -> Option<Prim> {
        match self.value(id) {
            Value::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_none(
        &self,
        id: ValueId,
    ) -> bool {
        matches!(self.value(id), Value::Prim(Prim::None))
    }

    /// 值所属的内建类型；用户类实例返回 `None`
    pub fn builtin_type_of(
        &self,
        id: ValueId,
    ) -> Option<BuiltinType> {
        Some(match self.value(id) {
            Value::Type(_) | Value::Class(_) => BuiltinType::Type,
            Value::Prim(p) => p.builtin_type(),
            Value::List(_) => BuiltinType::List,
            Value::Tuple(_) => BuiltinType::Tuple,
            Value::Set { frozen: false, .. } => BuiltinType::Set,
            Value::Set { frozen: true, .. } => BuiltinType::FrozenSet,
            Value::Dict(_) => BuiltinType::Dict,
            Value::Iter(_) => BuiltinType::Iterator,
            Value::Generator(_) => BuiltinType::Generator,
            Value::BuiltinFunc(_) | Value::BuiltinMethod { .. } => BuiltinType::BuiltinFunction,
            Value::Function(_) => BuiltinType::Function,
            Value::BoundMethod { .. } => BuiltinType::Method,
            Value::ClassMethod(_) => BuiltinType::ClassMethod,
            Value::StaticMethod(_) => BuiltinType::StaticMethod,
            Value::Property(_) => BuiltinType::Property,
            Value::Module(_) => BuiltinType::Module,
            Value::Traceback(_) => BuiltinType::Traceback,
            Value::Super { .. } => BuiltinType::Object,
            Value::Instance(_) | Value::Exception(_) => return None,
        })
    }

    /// 值的类（类型对象或用户类）
    pub fn class_of(
        &self,
        id: ValueId,
    ) -> ValueId {
        match self.value(id) {
            Value::Instance(inst) => inst.class,
            Value::Exception(e) => e.class,
            _ => match self.builtin_type_of(id) {
                Some(ty) => self.type_value(ty),
                None => self.type_value(BuiltinType::Object),
            },
        }
    }

    pub fn class_obj(
        &self,
        id: ValueId,
    ) -> Option<&ClassObj> {
        match self.value(id) {
            Value::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn func_obj(
        &self,
        id: ValueId,
    ) -> Option<&FuncObj> {
        match self.value(id) {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn func_obj_mut(
        &mut self,
        id: ValueId,
    ) -> Option<&mut FuncObj> {
        match self.value_mut(id) {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn module_obj(
        &self,
        id: ValueId,
    ) -> Option<&ModuleObj> {
        match self.value(id) {
            Value::Module(m) => Some(m),
            _ => None,
        }
    }

    /// 类名（用于诊断消息）
    pub fn type_name(
        &self,
        id: ValueId,
    ) -> String {
        match self.value(id) {
            Value::Instance(inst) => self.short_name(inst.class),
            Value::Exception(e) => self.short_name(e.class),
            _ => self
                .builtin_type_of(id)
                .map(|t| t.name().to_string())
                .unwrap_or_else(|| "object".to_string()),
        }
    }

    /// 简短描述，不展开容器元素
    pub fn short_name(
        &self,
        id: ValueId,
    ) -> String {
        match self.value(id) {
            Value::Type(t) => t.name().to_string(),
            Value::Prim(p) => match p {
                Prim::None => "None".to_string(),
                other => other.builtin_type().name().to_string(),
            },
            Value::Class(c) => c.name.clone(),
            Value::Instance(inst) => self.short_name(inst.class),
            Value::Exception(e) => self.short_name(e.class),
            Value::Function(f) => f.name.clone(),
            Value::BuiltinFunc(name) => name.to_string(),
            Value::BuiltinMethod { recv, name } => format!("{}.{}", self.type_name(*recv), name),
            Value::BoundMethod { recv, func } => {
                format!("{}.{}", self.short_name(*recv), self.short_name(*func))
            }
            Value::Module(m) => m.name.clone(),
            Value::Super { class, .. } => format!("super({})", self.short_name(*class)),
            _ => self.type_name(id),
        }
    }

    /// 节点中所有值的描述，以 `|` 连接
    pub fn describe_node(
        &self,
        node: NodeId,
    ) -> String {
        self.describe_node_depth(node, 2)
    }

    fn describe_node_depth(
        &self,
        node: NodeId,
        depth: usize,
    ) -> String {
        let mut parts: Vec<String> = self
            .graph
            .types(node)
            .iter()
            .map(|&v| self.describe_depth(v, depth))
            .collect();
        parts.sort();
        parts.dedup();
        if parts.is_empty() {
            "?".to_string()
        } else {
            parts.join("|")
        }
    }

    /// 值的描述，容器展开到 `depth` 层
    pub fn describe(
        &self,
        id: ValueId,
    ) -> String {
        self.describe_depth(id, 2)
    }

    fn describe_depth(
        &self,
        id: ValueId,
        depth: usize,
    ) -> String {
        let inner = |node: NodeId| {
            if depth == 0 {
                "...".to_string()
            } else {
                self.describe_node_depth(node, depth - 1)
            }
        };
        match self.value(id) {
            Value::Type(t) => format!("<type {}>", t.name()),
            Value::Class(c) => format!("<class {}>", c.name),
            Value::Instance(inst) => format!("<{}>", self.short_name(inst.class)),
            Value::Exception(e) => format!("<{}>", self.short_name(e.class)),
            Value::List(s) => format!("[{}]", inner(s.elemall)),
            Value::Tuple(t) => match &t.elements {
                Some(elems) if depth > 0 => {
                    let items: Vec<String> = elems
                        .iter()
                        .map(|&n| self.describe_node_depth(n, depth - 1))
                        .collect();
                    if items.len() == 1 {
                        format!("({},)", items[0])
                    } else {
                        format!("({})", items.join(", "))
                    }
                }
                _ => format!("({}, ...)", inner(t.elemall)),
            },
            Value::Set { seq, frozen } => {
                let prefix = if *frozen { "frozenset" } else { "set" };
                format!("{}([{}])", prefix, inner(seq.elemall))
            }
            Value::Dict(d) => format!("{{{}: {}}}", inner(d.key), inner(d.value)),
            Value::Iter(s) => format!("<iterator {}>", inner(s.elemall)),
            Value::Generator(g) => format!("<generator {}>", inner(g.elemall)),
            Value::Function(f) => format!("<function {}>", f.qualname),
            Value::BuiltinFunc(name) => format!("<builtin {}>", name),
            Value::BuiltinMethod { .. } | Value::BoundMethod { .. } => {
                format!("<method {}>", self.short_name(id))
            }
            Value::ClassMethod(f) => format!("<classmethod {}>", self.short_name(*f)),
            Value::StaticMethod(f) => format!("<staticmethod {}>", self.short_name(*f)),
            Value::Property(f) => format!("<property {}>", self.short_name(*f)),
            Value::Module(m) => format!("<module {}>", m.name),
            Value::Traceback(tb) => format!("<traceback {}>", self.short_name(tb.expt)),
            Value::Super { class, recv } => {
                format!("<super {}, {}>", self.short_name(*class), self.short_name(*recv))
            }
            Value::Prim(_) => self.short_name(id),
        }
    }
}
