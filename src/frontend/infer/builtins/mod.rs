//! 内建命名空间
//!
//! 内建函数与内建方法都由静态描述表给出（[`BuiltinSpec`]）：
//! 形参规格、最少实参数、可变参数、允许的关键字、副作用、返回值与可能抛出的异常。
//! 通用调用路径负责元数检查、逐实参类型检查、抛出声明的异常并产生返回节点；
//! 无法用表描述的行为（`len`、`map`、`dict.items` 等）标为 [`Ret::Special`]，
//! 由 `functions` / `methods` 中的专门处理函数完成。

pub mod exceptions;
pub mod functions;
pub mod methods;

use super::checker::ArgSpec;
use super::errors::{ErrorConfig, ExcSpec, NodeError, NodeResult};
use super::function::CallArgs;
use super::graph::{Graph, NodeId};
use super::namespace::SpaceKind;
use super::value::{BuiltinType, Prim, SeqObj, TupleObj, Value, ValueId, ValueKey};
use super::Interpreter;

/// 声明的异常
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Raise {
    pub class: &'static str,
    pub message: &'static str,
    pub uncertain: bool,
}

impl Raise {
    pub const fn maybe(
        class: &'static str,
        message: &'static str,
    ) -> Self {
        Self {
            class,
            message,
            uncertain: true,
        }
    }

    pub fn to_spec(self) -> ExcSpec {
        ExcSpec {
            class: self.class,
            message: self.message.to_string(),
            uncertain: self.uncertain,
        }
    }
}

/// 返回值描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ret {
    None,
    Prim(Prim),
    /// 接收者本身
    Recv,
    /// 接收者的元素
    Elem,
    /// 字典的值
    Value,
    /// 字典的值或第 n 个实参（默认值）
    ValueOr(usize),
    /// 同 `ValueOr`，缺省默认值时为 `None`（`dict.get`）
    ValueOrNone(usize),
    /// 元素类型为接收者的列表（`split`）
    RecvList,
    /// 三个接收者组成的元组（`partition`）
    RecvTriple,
    /// 由专门的处理函数计算
    Special,
}

/// 调用的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 第 n 个实参流入接收者的元素（字典为键，生成器为 `sent`）
    Feed(usize),
    /// 第 n 个实参的元素流入接收者的元素
    FeedIter(usize),
    /// 第 n 个实参流入字典的值
    FeedValue(usize),
}

/// 内建函数或方法的描述
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
    pub min: usize,
    pub variadic: Option<ArgSpec>,
    pub keywords: &'static [&'static str],
    pub ret: Ret,
    pub effects: &'static [Effect],
    pub raises: &'static [Raise],
}

impl BuiltinSpec {
    pub const fn new(
        name: &'static str,
        args: &'static [ArgSpec],
        min: usize,
        ret: Ret,
    ) -> Self {
        Self {
            name,
            args,
            min,
            variadic: None,
            keywords: &[],
            ret,
            effects: &[],
            raises: &[],
        }
    }

    pub const fn variadic(
        mut self,
        spec: ArgSpec,
    ) -> Self {
        self.variadic = Some(spec);
        self
    }

    pub const fn keywords(
        mut self,
        keywords: &'static [&'static str],
    ) -> Self {
        self.keywords = keywords;
        self
    }

    pub const fn effects(
        mut self,
        effects: &'static [Effect],
    ) -> Self {
        self.effects = effects;
        self
    }

    pub const fn raises(
        mut self,
        raises: &'static [Raise],
    ) -> Self {
        self.raises = raises;
        self
    }

    /// 最多接受的位置实参个数（可变参数时为 `None`）
    pub fn max(&self) -> Option<usize> {
        match self.variadic {
            Some(_) => None,
            None => Some(self.args.len()),
        }
    }
}

/// 在表中按名字查找
pub fn find_spec(
    table: &'static [BuiltinSpec],
    name: &str,
) -> Option<&'static BuiltinSpec> {
    table.iter().find(|s| s.name == name)
}

pub(crate) fn arity_error(spec: ExcSpec) -> NodeError {
    NodeError::Type(spec.message)
}

impl Interpreter {
    /// 创建原始单例、内建类型对象与内建命名空间
    pub(crate) fn install_builtins(&mut self) {
        for prim in Prim::ALL {
            let id = self.push_value(Value::Prim(prim));
            self.interned.insert(ValueKey::Prim(prim), id);
            self.prims.push(id);
        }
        for ty in BuiltinType::ALL {
            let id = self.push_value(Value::Type(ty));
            self.interned.insert(ValueKey::Type(ty), id);
            self.types.push(id);
        }

        self.builtin_space = self.new_space("__builtin__", SpaceKind::Builtin, None);

        let none = self.prim(Prim::None);
        let boolean = self.prim(Prim::Bool);
        let string = self.prim(Prim::Str);
        self.define_builtin("None", none);
        self.define_builtin("True", boolean);
        self.define_builtin("False", boolean);
        self.define_builtin("__debug__", boolean);
        self.define_builtin("__name__", string);
        self.define_builtin("NotImplemented", self.prim(Prim::Object));
        self.define_builtin("Ellipsis", self.prim(Prim::Object));

        for (name, ty) in functions::TYPE_NAMES {
            let value = self.type_value(*ty);
            self.define_builtin(name, value);
        }
        for spec in functions::FUNCTIONS {
            let value = self.builtin_func(spec.name);
            self.define_builtin(spec.name, value);
        }
        self.install_exceptions();
    }

    /// 在内建命名空间中定义名字
    pub(crate) fn define_builtin(
        &mut self,
        name: &str,
        value: ValueId,
    ) {
        let var = self.get_or_create_var(self.builtin_space, name);
        self.graph.add(var, value);
    }

    pub(crate) fn builtin_func(
        &mut self,
        name: &'static str,
    ) -> ValueId {
        self.intern(ValueKey::BuiltinFunc(name), |_| Value::BuiltinFunc(name))
    }

    /// 调用位置上的缓存节点
    pub(crate) fn site_node(
        &mut self,
        call: &CallArgs,
        tag: &'static str,
    ) -> NodeId {
        if let Some(&node) = self.site_nodes.get(&(call.site, tag)) {
            return node;
        }
        let node = self.graph.new_node();
        self.site_nodes.insert((call.site, tag), node);
        node
    }

    /// 调用位置上的列表
    pub(crate) fn site_list(
        &mut self,
        call: &CallArgs,
        tag: &'static str,
    ) -> (ValueId, NodeId) {
        let key = ValueKey::Site(call.site, tag);
        let list = self.intern(key, |interp| {
            Value::List(SeqObj {
                elemall: interp.graph.new_node(),
            })
        });
        (list, self.seq_elemall(list))
    }

    /// 与某个值关联的列表（如 `dict.keys()`）
    pub(crate) fn owned_list(
        &mut self,
        owner: ValueId,
        tag: &'static str,
        elements: NodeId,
    ) -> ValueId {
        let list = self.intern(ValueKey::Owned(owner, tag), |interp| {
            Value::List(SeqObj {
                elemall: interp.graph.new_node(),
            })
        });
        let elemall = self.seq_elemall(list);
        self.graph.connect_nodes(elements, elemall);
        list
    }

    /// 与某个值关联的定长元组
    pub(crate) fn owned_tuple(
        &mut self,
        owner: ValueId,
        tag: &'static str,
        elements: Vec<NodeId>,
    ) -> ValueId {
        let tuple = self.intern(ValueKey::Owned(owner, tag), |interp| {
            Value::Tuple(TupleObj {
                elemall: interp.graph.new_node(),
                elements: Some(elements.clone()),
            })
        });
        let elemall = self.seq_elemall(tuple);
        for node in elements {
            self.graph.connect_nodes(node, elemall);
        }
        tuple
    }

    /// 通用的内建调用：元数、关键字、逐实参类型检查、声明的异常、副作用、返回值
    pub(crate) fn call_builtin_spec(
        &mut self,
        call: &CallArgs,
        spec: &'static BuiltinSpec,
        recv: Option<ValueId>,
    ) -> NodeResult<NodeId> {
        let any_keyword = spec.keywords.contains(&"**");
        for (keyword, node) in &call.kwargs {
            if !any_keyword && !spec.keywords.contains(&keyword.as_str()) {
                return Err(arity_error(ErrorConfig::invalid_keyword(keyword)));
            }
            self.check_arg(
                call.frame,
                call.line,
                *node,
                ArgSpec::Any,
                format!("{}() keyword {}", spec.name, keyword),
            );
        }
        if call.star.is_none() {
            let given = call.args.len();
            if given < spec.min {
                return Err(arity_error(ErrorConfig::too_few_args(given, spec.min)));
            }
            if let Some(max) = spec.max() {
                if given > max {
                    return Err(arity_error(ErrorConfig::too_many_args(given, max)));
                }
            }
        }
        for (i, &node) in call.args.iter().enumerate() {
            let arg_spec = spec
                .args
                .get(i)
                .copied()
                .or(spec.variadic)
                .unwrap_or(ArgSpec::Any);
            self.check_arg(
                call.frame,
                call.line,
                node,
                arg_spec,
                format!("{}() arg {}", spec.name, i + 1),
            );
        }
        for raise in spec.raises {
            self.raise_spec(call.frame, call.line, &raise.to_spec());
        }
        if let Some(recv) = recv {
            self.apply_effects(call, spec, recv);
        }

        match spec.ret {
            Ret::None => Ok(self.prim_node(Prim::None)),
            Ret::Prim(p) => Ok(self.prim_node(p)),
            Ret::Special => match recv {
                Some(recv) => self.special_method(call, spec, recv),
                None => self.special_function(call, spec.name),
            },
            ret => match recv {
                Some(recv) => Ok(self.method_return(call, ret, recv)),
                None => Ok(Graph::UNDEFINED),
            },
        }
    }

    fn apply_effects(
        &mut self,
        call: &CallArgs,
        spec: &BuiltinSpec,
        recv: ValueId,
    ) {
        for effect in spec.effects {
            match *effect {
                Effect::Feed(i) => {
                    if let (Some(&arg), Some(sink)) = (call.args.get(i), self.element_sink(recv)) {
                        self.graph.connect_nodes(arg, sink);
                    }
                }
                Effect::FeedIter(i) => {
                    if let (Some(&arg), Some(sink)) = (call.args.get(i), self.element_sink(recv)) {
                        let elems = self.iter_node(call.frame, call.line, arg);
                        self.graph.connect_nodes(elems, sink);
                    }
                }
                Effect::FeedValue(i) => {
                    if let (Some(&arg), Value::Dict(d)) = (call.args.get(i), self.value(recv)) {
                        let sink = d.value;
                        self.graph.connect_nodes(arg, sink);
                    }
                }
            }
        }
    }

    fn method_return(
        &mut self,
        call: &CallArgs,
        ret: Ret,
        recv: ValueId,
    ) -> NodeId {
        match ret {
            Ret::Recv => self.graph.simple_node(recv),
            Ret::Elem => self.element_node(recv),
            Ret::Value => match self.value(recv) {
                Value::Dict(d) => d.value,
                _ => Graph::UNDEFINED,
            },
            Ret::ValueOr(i) | Ret::ValueOrNone(i) => {
                let Value::Dict(d) = self.value(recv) else {
                    return Graph::UNDEFINED;
                };
                let values = d.value;
                let default = match call.args.get(i) {
                    Some(&default) => default,
                    None if ret == Ret::ValueOrNone(i) => self.prim_node(Prim::None),
                    None => return values,
                };
                let node = self.site_node(call, "value-or-default");
                self.graph.connect_nodes(values, node);
                self.graph.connect_nodes(default, node);
                node
            }
            Ret::RecvList => {
                let elem = self.graph.simple_node(recv);
                let list = self.owned_list(recv, "split", elem);
                self.graph.simple_node(list)
            }
            Ret::RecvTriple => {
                let elem = self.graph.simple_node(recv);
                let tuple = self.owned_tuple(recv, "partition", vec![elem, elem, elem]);
                self.graph.simple_node(tuple)
            }
            Ret::None => self.prim_node(Prim::None),
            Ret::Prim(p) => self.prim_node(p),
            Ret::Special => Graph::UNDEFINED,
        }
    }
}
