//! 内建函数与内建类型的构造调用

use super::super::checker::{ArgSpec, ANY, INT, ITER_ANY, NUM, STR};
use super::super::errors::{NodeError, NodeResult};
use super::super::function::CallArgs;
use super::super::graph::{Graph, NodeId, Receiver};
use super::super::operators::UnaryKind;
use super::super::ops::Op;
use super::super::value::{
    BuiltinType, DictObj, GenObj, Prim, SeqObj, TupleObj, Value, ValueKey, WrapKind,
};
use super::super::Interpreter;
use super::{find_spec, BuiltinSpec, Raise, Ret};
use crate::frontend::parser::ast::BinOp;

const CLASSINFO: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::Type),
    ArgSpec::Type(BuiltinType::Tuple),
]);

/// 内建命名空间中的类型名
pub const TYPE_NAMES: &[(&str, BuiltinType)] = &[
    ("object", BuiltinType::Object),
    ("type", BuiltinType::Type),
    ("bool", BuiltinType::Bool),
    ("int", BuiltinType::Int),
    ("long", BuiltinType::Long),
    ("float", BuiltinType::Float),
    ("complex", BuiltinType::Complex),
    ("basestring", BuiltinType::BaseString),
    ("str", BuiltinType::Str),
    ("unicode", BuiltinType::Unicode),
    ("file", BuiltinType::File),
    ("xrange", BuiltinType::XRange),
    ("list", BuiltinType::List),
    ("tuple", BuiltinType::Tuple),
    ("dict", BuiltinType::Dict),
    ("set", BuiltinType::Set),
    ("frozenset", BuiltinType::FrozenSet),
    ("enumerate", BuiltinType::Enumerate),
    ("reversed", BuiltinType::Reversed),
    ("staticmethod", BuiltinType::StaticMethod),
    ("classmethod", BuiltinType::ClassMethod),
    ("property", BuiltinType::Property),
];

/// 内建函数
pub const FUNCTIONS: &[BuiltinSpec] = &[
    BuiltinSpec::new("abs", &[ANY], 1, Ret::Special),
    BuiltinSpec::new("all", &[ITER_ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("any", &[ITER_ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("bin", &[INT], 1, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("callable", &[ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("chr", &[INT], 1, Ret::Prim(Prim::Str))
        .raises(&[Raise::maybe("ValueError", "chr() arg not in range(256)")]),
    BuiltinSpec::new("cmp", &[ANY, ANY], 2, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("delattr", &[ANY, STR], 2, Ret::None)
        .raises(&[Raise::maybe("AttributeError", "attribute may not exist")]),
    BuiltinSpec::new("dir", &[ANY], 0, Ret::Special),
    BuiltinSpec::new("divmod", &[ANY, ANY], 2, Ret::Special),
    BuiltinSpec::new("execfile", &[STR, ANY, ANY], 1, Ret::None)
        .raises(&[Raise::maybe("IOError", "cannot open file")]),
    BuiltinSpec::new("filter", &[ANY, ITER_ANY], 2, Ret::Special),
    BuiltinSpec::new("format", &[ANY, STR], 1, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("getattr", &[ANY, STR, ANY], 2, Ret::Special),
    BuiltinSpec::new("hasattr", &[ANY, STR], 2, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("hash", &[ANY], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("hex", &[INT], 1, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("id", &[ANY], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("isinstance", &[ANY, CLASSINFO], 2, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("issubclass", &[CLASSINFO, CLASSINFO], 2, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("iter", &[ANY, ANY], 1, Ret::Special),
    BuiltinSpec::new("len", &[ANY], 1, Ret::Special),
    BuiltinSpec::new("map", &[ANY, ITER_ANY], 2, Ret::Special).variadic(ITER_ANY),
    BuiltinSpec::new("max", &[ANY], 1, Ret::Special)
        .variadic(ANY)
        .keywords(&["key"])
        .raises(&[Raise::maybe("ValueError", "max() arg is an empty sequence")]),
    BuiltinSpec::new("min", &[ANY], 1, Ret::Special)
        .variadic(ANY)
        .keywords(&["key"])
        .raises(&[Raise::maybe("ValueError", "min() arg is an empty sequence")]),
    BuiltinSpec::new("next", &[ANY, ANY], 1, Ret::Special)
        .raises(&[Raise::maybe("StopIteration", "iterator exhausted")]),
    BuiltinSpec::new("oct", &[INT], 1, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("open", &[STR, STR, INT], 1, Ret::Prim(Prim::File))
        .raises(&[Raise::maybe("IOError", "cannot open file")]),
    BuiltinSpec::new("ord", &[STR], 1, Ret::Prim(Prim::Int))
        .raises(&[Raise::maybe("TypeError", "ord() expected a character")]),
    BuiltinSpec::new("pow", &[ANY, ANY, ANY], 2, Ret::Special),
    BuiltinSpec::new("range", &[INT, INT, INT], 1, Ret::Special)
        .raises(&[Raise::maybe("ValueError", "range() step argument must not be zero")]),
    BuiltinSpec::new("raw_input", &[ANY], 0, Ret::Prim(Prim::Str))
        .raises(&[Raise::maybe("EOFError", "end of input")]),
    BuiltinSpec::new("reduce", &[ANY, ITER_ANY, ANY], 2, Ret::Special)
        .raises(&[Raise::maybe("TypeError", "reduce() of empty sequence with no initial value")]),
    BuiltinSpec::new("repr", &[ANY], 1, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("round", &[NUM, INT], 1, Ret::Prim(Prim::Float)),
    BuiltinSpec::new("setattr", &[ANY, STR, ANY], 3, Ret::Special),
    BuiltinSpec::new("sorted", &[ITER_ANY], 1, Ret::Special).keywords(&["cmp", "key", "reverse"]),
    BuiltinSpec::new("sum", &[ITER_ANY, ANY], 1, Ret::Special),
    BuiltinSpec::new("super", &[ANY, ANY], 1, Ret::Special),
    BuiltinSpec::new("unichr", &[INT], 1, Ret::Prim(Prim::Unicode))
        .raises(&[Raise::maybe("ValueError", "unichr() arg not in range")]),
    BuiltinSpec::new("zip", &[], 0, Ret::Special).variadic(ITER_ANY),
];

/// 不出现在命名空间中的内建函数（特殊方法的默认实现）
pub const INTERNAL: &[BuiltinSpec] = &[
    BuiltinSpec::new("exception.__init__", &[], 0, Ret::None).variadic(ANY),
    BuiltinSpec::new("object.__init__", &[], 0, Ret::None).variadic(ANY),
];

/// 内建类型的构造调用
pub const CONSTRUCTORS: &[BuiltinSpec] = &[
    BuiltinSpec::new("object", &[], 0, Ret::Prim(Prim::Object)),
    BuiltinSpec::new("type", &[ANY, ANY, ANY], 1, Ret::Special),
    BuiltinSpec::new("bool", &[ANY], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("int", &[ANY, INT], 0, Ret::Prim(Prim::Int))
        .raises(&[Raise::maybe("ValueError", "invalid literal for int()")]),
    BuiltinSpec::new("long", &[ANY, INT], 0, Ret::Prim(Prim::Long))
        .raises(&[Raise::maybe("ValueError", "invalid literal for long()")]),
    BuiltinSpec::new("float", &[ANY], 0, Ret::Prim(Prim::Float))
        .raises(&[Raise::maybe("ValueError", "invalid literal for float()")]),
    BuiltinSpec::new("complex", &[ANY, NUM], 0, Ret::Prim(Prim::Complex))
        .raises(&[Raise::maybe("ValueError", "complex() arg is a malformed string")]),
    BuiltinSpec::new("str", &[ANY], 0, Ret::Prim(Prim::Str)),
    BuiltinSpec::new("unicode", &[ANY, STR, STR], 0, Ret::Prim(Prim::Unicode))
        .raises(&[Raise::maybe("UnicodeError", "cannot decode")]),
    BuiltinSpec::new("file", &[STR, STR, INT], 1, Ret::Prim(Prim::File))
        .raises(&[Raise::maybe("IOError", "cannot open file")]),
    BuiltinSpec::new("xrange", &[INT, INT, INT], 1, Ret::Prim(Prim::XRange)),
    BuiltinSpec::new("list", &[ITER_ANY], 0, Ret::Special),
    BuiltinSpec::new("tuple", &[ITER_ANY], 0, Ret::Special),
    BuiltinSpec::new("set", &[ITER_ANY], 0, Ret::Special),
    BuiltinSpec::new("frozenset", &[ITER_ANY], 0, Ret::Special),
    BuiltinSpec::new("dict", &[ANY], 0, Ret::Special).keywords(&["**"]),
    BuiltinSpec::new("enumerate", &[ITER_ANY, INT], 1, Ret::Special),
    BuiltinSpec::new("reversed", &[ANY], 1, Ret::Special),
    BuiltinSpec::new("staticmethod", &[ANY], 1, Ret::Special),
    BuiltinSpec::new("classmethod", &[ANY], 1, Ret::Special),
    BuiltinSpec::new("property", &[ANY, ANY, ANY, STR], 0, Ret::Special)
        .keywords(&["fget", "fset", "fdel", "doc"]),
];

impl Interpreter {
    /// 调用内建函数
    pub(crate) fn call_builtin_func(
        &mut self,
        call: &CallArgs,
        name: &str,
    ) -> NodeResult<NodeId> {
        let spec = find_spec(FUNCTIONS, name)
            .or_else(|| find_spec(INTERNAL, name))
            .ok_or_else(|| NodeError::Type(format!("unknown builtin: {}", name)))?;
        self.call_builtin_spec(call, spec, None)
    }

    /// 调用内建类型对象（构造）
    pub(crate) fn call_type(
        &mut self,
        call: &CallArgs,
        ty: BuiltinType,
    ) -> NodeResult<NodeId> {
        if ty == BuiltinType::BaseString {
            return Err(NodeError::Type(
                "the basestring type cannot be instantiated".to_string(),
            ));
        }
        let spec = find_spec(CONSTRUCTORS, ty.name()).ok_or_else(|| {
            NodeError::Type(format!("cannot create '{}' instances", ty.name()))
        })?;
        self.call_builtin_spec(call, spec, None)
    }

    /// 由代码实现的内建函数与构造调用
    pub(crate) fn special_function(
        &mut self,
        call: &CallArgs,
        name: &str,
    ) -> NodeResult<NodeId> {
        let frame = call.frame;
        let line = call.line;
        let arg = |i: usize| call.args.get(i).copied();
        let first = arg(0).unwrap_or(Graph::UNDEFINED);
        let second = arg(1).unwrap_or(Graph::UNDEFINED);
        match name {
            "abs" => Ok(self.unary_node(frame, line, UnaryKind::Abs, first)),
            "len" => {
                let target = self.site_node(call, "len");
                self.attach(first, Op::Len { frame, line, target });
                Ok(target)
            }
            "dir" => {
                let string = self.prim_node(Prim::Str);
                let list = self.intern(ValueKey::Const("dir"), |interp| {
                    Value::List(SeqObj {
                        elemall: interp.graph.new_node(),
                    })
                });
                let elemall = self.seq_elemall(list);
                self.graph.connect_nodes(string, elemall);
                Ok(self.graph.simple_node(list))
            }
            "divmod" => {
                let quotient =
                    self.binary_node(frame, line, call.site, BinOp::FloorDiv, first, second);
                let remainder = self.binary_node(frame, line, call.site, BinOp::Mod, first, second);
                let tuple = self.site_tuple(call, "divmod", vec![quotient, remainder]);
                Ok(self.graph.simple_node(tuple))
            }
            "pow" => Ok(self.binary_node(frame, line, call.site, BinOp::Pow, first, second)),
            "range" => {
                let (list, elemall) = self.site_list(call, "range");
                let int = self.prim_node(Prim::Int);
                self.graph.connect_nodes(int, elemall);
                Ok(self.graph.simple_node(list))
            }
            "list" | "sorted" | "filter" => {
                let (list, elemall) = self.site_list(call, "list");
                let src = if name == "filter" { arg(1) } else { arg(0) };
                if let Some(src) = src {
                    let elems = self.iter_node(frame, line, src);
                    self.graph.connect_nodes(elems, elemall);
                    if name == "filter" {
                        self.call_quietly(call, first, vec![elems]);
                    }
                }
                if name == "sorted" {
                    for (keyword, callee) in call.kwargs.clone() {
                        match keyword.as_str() {
                            "key" => self.call_quietly(call, callee, vec![elemall]),
                            "cmp" => self.call_quietly(call, callee, vec![elemall, elemall]),
                            _ => {}
                        }
                    }
                }
                Ok(self.graph.simple_node(list))
            }
            "tuple" => {
                let elements = match arg(0) {
                    Some(_) => None,
                    None => Some(Vec::new()),
                };
                let tuple = self.intern(ValueKey::Site(call.site, "tuple"), |interp| {
                    Value::Tuple(TupleObj {
                        elemall: interp.graph.new_node(),
                        elements,
                    })
                });
                if let Some(src) = arg(0) {
                    let elems = self.iter_node(frame, line, src);
                    let elemall = self.seq_elemall(tuple);
                    self.graph.connect_nodes(elems, elemall);
                }
                Ok(self.graph.simple_node(tuple))
            }
            "set" | "frozenset" => {
                let frozen = name == "frozenset";
                let set = self.intern(ValueKey::Site(call.site, "set"), |interp| Value::Set {
                    seq: SeqObj {
                        elemall: interp.graph.new_node(),
                    },
                    frozen,
                });
                if let Some(src) = arg(0) {
                    let elems = self.iter_node(frame, line, src);
                    let elemall = self.seq_elemall(set);
                    self.graph.connect_nodes(elems, elemall);
                }
                Ok(self.graph.simple_node(set))
            }
            "dict" => {
                let dict = self.intern(ValueKey::Site(call.site, "dict"), |interp| {
                    Value::Dict(DictObj {
                        key: interp.graph.new_node(),
                        value: interp.graph.new_node(),
                    })
                });
                let (key, value) = match self.value(dict) {
                    Value::Dict(d) => (d.key, d.value),
                    _ => return Ok(Graph::UNDEFINED),
                };
                for src in arg(0).into_iter().chain(call.dstar) {
                    self.attach(src, Op::DictUpdate { frame, line, key, value });
                }
                if !call.kwargs.is_empty() {
                    let string = self.prim_node(Prim::Str);
                    self.graph.connect_nodes(string, key);
                    for (_, node) in &call.kwargs {
                        self.graph.connect_nodes(*node, value);
                    }
                }
                Ok(self.graph.simple_node(dict))
            }
            "iter" | "reversed" => {
                let iter = self.site_iter(call, if name == "iter" { "iter" } else { "reversed" });
                let elemall = self.seq_elemall(iter);
                match (name, arg(1)) {
                    ("iter", Some(sentinel)) => {
                        let produced = self.call_with(call, first, Vec::new());
                        self.graph.connect_nodes(produced, elemall);
                        self.check_arg(frame, line, sentinel, ANY, "iter() sentinel".to_string());
                    }
                    _ => {
                        let elems = self.iter_node(frame, line, first);
                        self.graph.connect_nodes(elems, elemall);
                    }
                }
                Ok(self.graph.simple_node(iter))
            }
            "enumerate" => {
                let elems = self.iter_node(frame, line, first);
                let index = self.prim_node(Prim::Int);
                let item = self.site_tuple(call, "enumerate-item", vec![index, elems]);
                let iter = self.site_iter(call, "enumerate");
                let elemall = self.seq_elemall(iter);
                self.graph.add(elemall, item);
                Ok(self.graph.simple_node(iter))
            }
            "next" => {
                let target = self.site_node(call, "next");
                self.attach(first, Op::IterNext { frame, line, target });
                if let Some(default) = arg(1) {
                    self.graph.connect_nodes(default, target);
                }
                Ok(target)
            }
            "min" | "max" | "sum" => {
                let target = self.site_node(call, "reduce");
                let elems = if call.args.len() == 1 || name == "sum" {
                    let elems = self.iter_node(frame, line, first);
                    self.graph.connect_nodes(elems, target);
                    elems
                } else {
                    for &node in &call.args {
                        self.graph.connect_nodes(node, target);
                    }
                    target
                };
                if name == "sum" {
                    let start = match arg(1) {
                        Some(start) => start,
                        None => self.prim_node(Prim::Int),
                    };
                    self.graph.connect_nodes(start, target);
                }
                for (keyword, callee) in call.kwargs.clone() {
                    if keyword == "key" {
                        self.call_quietly(call, callee, vec![elems]);
                    }
                }
                Ok(target)
            }
            "map" => {
                let (list, elemall) = self.site_list(call, "map");
                let iterables: Vec<NodeId> = call
                    .args
                    .iter()
                    .skip(1)
                    .map(|&src| self.iter_node(frame, line, src))
                    .collect();
                let produced = self.call_with(call, first, iterables);
                self.graph.connect_nodes(produced, elemall);
                Ok(self.graph.simple_node(list))
            }
            "reduce" => {
                let acc = self.site_node(call, "reduce");
                let elems = self.iter_node(frame, line, second);
                match arg(2) {
                    Some(initial) => self.graph.connect_nodes(initial, acc),
                    None => self.graph.connect_nodes(elems, acc),
                }
                let produced = self.call_with(call, first, vec![acc, elems]);
                self.graph.connect_nodes(produced, acc);
                Ok(acc)
            }
            "zip" => {
                let elements: Vec<NodeId> = call
                    .args
                    .iter()
                    .map(|&src| self.iter_node(frame, line, src))
                    .collect();
                let item = self.site_tuple(call, "zip-item", elements);
                let (list, elemall) = self.site_list(call, "zip");
                self.graph.add(elemall, item);
                Ok(self.graph.simple_node(list))
            }
            "getattr" => {
                let target = self.site_node(call, "getattr");
                let quiet = arg(2).is_some();
                if let Some(default) = arg(2) {
                    self.graph.connect_nodes(default, target);
                }
                if let Some(Some(attr)) = call.const_strs.get(1) {
                    let found = self.attr_node(frame, line, call.site, first, attr, quiet);
                    self.graph.connect_nodes(found, target);
                }
                Ok(target)
            }
            "setattr" => {
                if let (Some(Some(attr)), Some(value)) = (call.const_strs.get(1), arg(2)) {
                    self.attr_assign(frame, line, first, attr, value);
                }
                Ok(self.prim_node(Prim::None))
            }
            "super" => {
                let target = self.site_node(call, "super");
                if let Some(recv) = arg(1) {
                    let op = self.new_op(Op::MakeSuper {
                        classes: Vec::new(),
                        recvs: Vec::new(),
                        target,
                    });
                    self.graph.connect(first, Receiver::Op(op, 0));
                    self.graph.connect(recv, Receiver::Op(op, 1));
                }
                Ok(target)
            }
            "type" => {
                if call.args.len() == 1 {
                    let target = self.site_node(call, "type");
                    self.attach(first, Op::TypeOf { target });
                    Ok(target)
                } else {
                    let ty = self.type_value(BuiltinType::Type);
                    Ok(self.graph.simple_node(ty))
                }
            }
            "staticmethod" | "classmethod" | "property" => {
                let kind = match name {
                    "staticmethod" => WrapKind::StaticMethod,
                    "classmethod" => WrapKind::ClassMethod,
                    _ => WrapKind::Property,
                };
                let getter = arg(0).or_else(|| {
                    call.kwargs
                        .iter()
                        .find(|(k, _)| k == "fget")
                        .map(|(_, n)| *n)
                });
                let target = self.site_node(call, "wrap");
                if let Some(getter) = getter {
                    self.attach(getter, Op::Wrap { kind, target });
                }
                Ok(target)
            }
            other => Err(NodeError::Type(format!("unknown builtin: {}", other))),
        }
    }

    /// 调用位置上的定长元组
    pub(crate) fn site_tuple(
        &mut self,
        call: &CallArgs,
        tag: &'static str,
        elements: Vec<NodeId>,
    ) -> super::super::value::ValueId {
        let tuple = self.intern(ValueKey::Site(call.site, tag), |interp| {
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

    fn site_iter(
        &mut self,
        call: &CallArgs,
        tag: &'static str,
    ) -> super::super::value::ValueId {
        self.intern(ValueKey::Site(call.site, tag), |interp| {
            Value::Iter(SeqObj {
                elemall: interp.graph.new_node(),
            })
        })
    }

    /// 在同一调用位置上发起一次嵌套调用，返回结果节点
    pub(crate) fn call_with(
        &mut self,
        call: &CallArgs,
        callee: NodeId,
        args: Vec<NodeId>,
    ) -> NodeId {
        let mut nested = CallArgs::new(call.frame, call.line, call.site);
        nested.args.extend(args);
        self.call_node(nested, callee)
    }

    /// 只为检查而发起的调用，结果丢弃
    fn call_quietly(
        &mut self,
        call: &CallArgs,
        callee: NodeId,
        args: Vec<NodeId>,
    ) {
        self.call_with(call, callee, args);
    }

    /// 新建一个生成器值（生成器表达式用）
    pub(crate) fn site_generator(
        &mut self,
        site: crate::frontend::parser::ast::AstId,
    ) -> super::super::value::ValueId {
        self.intern(ValueKey::Site(site, "generator"), |interp| {
            Value::Generator(GenObj {
                elemall: interp.graph.new_node(),
                sent: interp.graph.new_node(),
            })
        })
    }
}
