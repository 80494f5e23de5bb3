//! 原始对象与聚合对象的方法表

use super::super::checker::{ArgSpec, ANY, INT, INT_DICT, ITER_ANY, ITER_STR, STR, STR_OR_NONE, STR_OR_TUPLE};
use super::super::errors::{ErrorConfig, NodeError, NodeResult};
use super::super::function::CallArgs;
use super::super::graph::{Graph, NodeId};
use super::super::ops::Op;
use super::super::value::{BuiltinType, Prim, SeqObj, Value, ValueId, ValueKey};
use super::super::Interpreter;
use super::{find_spec, BuiltinSpec, Effect, Raise, Ret};

const OPT_INT: ArgSpec = ArgSpec::OneOf(&[
    ArgSpec::Type(BuiltinType::Int),
    ArgSpec::Type(BuiltinType::Long),
    ArgSpec::Type(BuiltinType::NoneType),
]);

const NOT_FOUND: &[Raise] = &[Raise::maybe("ValueError", "substring not found")];
const IO: &[Raise] = &[Raise::maybe("IOError", "I/O operation failed")];
const STOP: &[Raise] = &[Raise::maybe("StopIteration", "iterator exhausted")];

/// `str` 与 `unicode` 共用
pub const STR_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("capitalize", &[], 0, Ret::Recv),
    BuiltinSpec::new("center", &[INT, STR], 1, Ret::Recv),
    BuiltinSpec::new("count", &[STR, INT, INT], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("decode", &[STR, STR], 0, Ret::Prim(Prim::Unicode))
        .raises(&[Raise::maybe("UnicodeError", "cannot decode")]),
    BuiltinSpec::new("encode", &[STR, STR], 0, Ret::Prim(Prim::Str))
        .raises(&[Raise::maybe("UnicodeError", "cannot encode")]),
    BuiltinSpec::new("endswith", &[STR_OR_TUPLE, INT, INT], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("expandtabs", &[INT], 0, Ret::Recv),
    BuiltinSpec::new("find", &[STR, INT, INT], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("format", &[], 0, Ret::Recv)
        .variadic(ANY)
        .keywords(&["**"]),
    BuiltinSpec::new("index", &[STR, INT, INT], 1, Ret::Prim(Prim::Int)).raises(NOT_FOUND),
    BuiltinSpec::new("isalnum", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("isalpha", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("isdigit", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("islower", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("isspace", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("istitle", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("isupper", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("join", &[ITER_STR], 1, Ret::Recv),
    BuiltinSpec::new("ljust", &[INT, STR], 1, Ret::Recv),
    BuiltinSpec::new("lower", &[], 0, Ret::Recv),
    BuiltinSpec::new("lstrip", &[STR_OR_NONE], 0, Ret::Recv),
    BuiltinSpec::new("partition", &[STR], 1, Ret::RecvTriple),
    BuiltinSpec::new("replace", &[STR, STR, INT], 2, Ret::Recv),
    BuiltinSpec::new("rfind", &[STR, INT, INT], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("rindex", &[STR, INT, INT], 1, Ret::Prim(Prim::Int)).raises(NOT_FOUND),
    BuiltinSpec::new("rjust", &[INT, STR], 1, Ret::Recv),
    BuiltinSpec::new("rpartition", &[STR], 1, Ret::RecvTriple),
    BuiltinSpec::new("rsplit", &[STR_OR_NONE, INT], 0, Ret::RecvList),
    BuiltinSpec::new("rstrip", &[STR_OR_NONE], 0, Ret::Recv),
    BuiltinSpec::new("split", &[STR_OR_NONE, INT], 0, Ret::RecvList),
    BuiltinSpec::new("splitlines", &[ANY], 0, Ret::RecvList),
    BuiltinSpec::new("startswith", &[STR_OR_TUPLE, INT, INT], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("strip", &[STR_OR_NONE], 0, Ret::Recv),
    BuiltinSpec::new("swapcase", &[], 0, Ret::Recv),
    BuiltinSpec::new("title", &[], 0, Ret::Recv),
    BuiltinSpec::new("translate", &[ANY, STR], 1, Ret::Recv),
    BuiltinSpec::new("upper", &[], 0, Ret::Recv),
    BuiltinSpec::new("zfill", &[INT], 1, Ret::Recv),
];

/// `unicode` 独有或签名不同的方法（先于 [`STR_METHODS`] 查找）
pub const UNICODE_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("translate", &[INT_DICT], 1, Ret::Recv),
    BuiltinSpec::new("isdecimal", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("isnumeric", &[], 0, Ret::Prim(Prim::Bool)),
];

pub const LIST_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("append", &[ANY], 1, Ret::None).effects(&[Effect::Feed(0)]),
    BuiltinSpec::new("count", &[ANY], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("extend", &[ITER_ANY], 1, Ret::None).effects(&[Effect::FeedIter(0)]),
    BuiltinSpec::new("index", &[ANY, INT, INT], 1, Ret::Prim(Prim::Int))
        .raises(&[Raise::maybe("ValueError", "list.index(x): x not in list")]),
    BuiltinSpec::new("insert", &[INT, ANY], 2, Ret::None).effects(&[Effect::Feed(1)]),
    BuiltinSpec::new("pop", &[INT], 0, Ret::Elem)
        .raises(&[Raise::maybe("IndexError", "pop from empty list")]),
    BuiltinSpec::new("remove", &[ANY], 1, Ret::None)
        .raises(&[Raise::maybe("ValueError", "list.remove(x): x not in list")]),
    BuiltinSpec::new("reverse", &[], 0, Ret::None),
    BuiltinSpec::new("sort", &[ANY, ANY, ANY], 0, Ret::Special).keywords(&["cmp", "key", "reverse"]),
];

pub const TUPLE_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("count", &[ANY], 1, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("index", &[ANY], 1, Ret::Prim(Prim::Int))
        .raises(&[Raise::maybe("ValueError", "tuple.index(x): x not in tuple")]),
];

pub const DICT_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("clear", &[], 0, Ret::None),
    BuiltinSpec::new("copy", &[], 0, Ret::Recv),
    BuiltinSpec::new("get", &[ANY, ANY], 1, Ret::ValueOrNone(1)),
    BuiltinSpec::new("has_key", &[ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("items", &[], 0, Ret::Special),
    BuiltinSpec::new("iteritems", &[], 0, Ret::Special),
    BuiltinSpec::new("iterkeys", &[], 0, Ret::Special),
    BuiltinSpec::new("itervalues", &[], 0, Ret::Special),
    BuiltinSpec::new("keys", &[], 0, Ret::Special),
    BuiltinSpec::new("pop", &[ANY, ANY], 1, Ret::ValueOr(1))
        .raises(&[Raise::maybe("KeyError", "key not found")]),
    BuiltinSpec::new("popitem", &[], 0, Ret::Special)
        .raises(&[Raise::maybe("KeyError", "popitem(): dictionary is empty")]),
    BuiltinSpec::new("setdefault", &[ANY, ANY], 1, Ret::Value)
        .effects(&[Effect::Feed(0), Effect::FeedValue(1)]),
    BuiltinSpec::new("update", &[ANY], 0, Ret::Special).keywords(&["**"]),
    BuiltinSpec::new("values", &[], 0, Ret::Special),
];

pub const SET_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("add", &[ANY], 1, Ret::None).effects(&[Effect::Feed(0)]),
    BuiltinSpec::new("clear", &[], 0, Ret::None),
    BuiltinSpec::new("copy", &[], 0, Ret::Recv),
    BuiltinSpec::new("difference", &[ITER_ANY], 1, Ret::Special),
    BuiltinSpec::new("discard", &[ANY], 1, Ret::None),
    BuiltinSpec::new("intersection", &[ITER_ANY], 1, Ret::Special),
    BuiltinSpec::new("isdisjoint", &[ITER_ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("issubset", &[ITER_ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("issuperset", &[ITER_ANY], 1, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("pop", &[], 0, Ret::Elem)
        .raises(&[Raise::maybe("KeyError", "pop from an empty set")]),
    BuiltinSpec::new("remove", &[ANY], 1, Ret::None)
        .raises(&[Raise::maybe("KeyError", "key not found")]),
    BuiltinSpec::new("symmetric_difference", &[ITER_ANY], 1, Ret::Special),
    BuiltinSpec::new("union", &[ITER_ANY], 1, Ret::Special),
    BuiltinSpec::new("update", &[ITER_ANY], 1, Ret::None).effects(&[Effect::FeedIter(0)]),
];

/// `frozenset` 只有不修改自身的方法
pub const FROZENSET_METHODS: &[&str] = &[
    "copy",
    "difference",
    "intersection",
    "isdisjoint",
    "issubset",
    "issuperset",
    "symmetric_difference",
    "union",
];

pub const FILE_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("__enter__", &[], 0, Ret::Recv),
    BuiltinSpec::new("__exit__", &[ANY, ANY, ANY], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("close", &[], 0, Ret::None),
    BuiltinSpec::new("fileno", &[], 0, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("flush", &[], 0, Ret::None).raises(IO),
    BuiltinSpec::new("isatty", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("next", &[], 0, Ret::Prim(Prim::Str)).raises(STOP),
    BuiltinSpec::new("read", &[INT], 0, Ret::Prim(Prim::Str)).raises(IO),
    BuiltinSpec::new("readline", &[INT], 0, Ret::Prim(Prim::Str)).raises(IO),
    BuiltinSpec::new("readlines", &[INT], 0, Ret::Special).raises(IO),
    BuiltinSpec::new("seek", &[INT, INT], 1, Ret::None).raises(IO),
    BuiltinSpec::new("tell", &[], 0, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("truncate", &[OPT_INT], 0, Ret::None).raises(IO),
    BuiltinSpec::new("write", &[STR], 1, Ret::None).raises(IO),
    BuiltinSpec::new("writelines", &[ITER_STR], 1, Ret::None).raises(IO),
];

pub const ITER_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("__iter__", &[], 0, Ret::Recv),
    BuiltinSpec::new("next", &[], 0, Ret::Elem).raises(STOP),
];

pub const GENERATOR_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("__iter__", &[], 0, Ret::Recv),
    BuiltinSpec::new("close", &[], 0, Ret::None),
    BuiltinSpec::new("next", &[], 0, Ret::Elem).raises(STOP),
    BuiltinSpec::new("send", &[ANY], 1, Ret::Elem)
        .effects(&[Effect::Feed(0)])
        .raises(STOP),
    BuiltinSpec::new("throw", &[ANY, ANY, ANY], 1, Ret::Elem),
];

pub const NUMBER_METHODS: &[BuiltinSpec] = &[
    BuiltinSpec::new("conjugate", &[], 0, Ret::Recv),
    BuiltinSpec::new("bit_length", &[], 0, Ret::Prim(Prim::Int)),
    BuiltinSpec::new("is_integer", &[], 0, Ret::Prim(Prim::Bool)),
    BuiltinSpec::new("hex", &[], 0, Ret::Prim(Prim::Str)),
];

impl Interpreter {
    /// 值的内建方法描述
    pub(crate) fn method_spec(
        &self,
        recv: ValueId,
        name: &str,
    ) -> Option<&'static BuiltinSpec> {
        match self.value(recv) {
            Value::Prim(Prim::Unicode) => {
                find_spec(UNICODE_METHODS, name).or_else(|| find_spec(STR_METHODS, name))
            }
            Value::Prim(Prim::Str) => find_spec(STR_METHODS, name),
            Value::Prim(Prim::File) => find_spec(FILE_METHODS, name),
            Value::Prim(p) if p.is_numeric() => find_spec(NUMBER_METHODS, name),
            Value::List(_) => find_spec(LIST_METHODS, name),
            Value::Tuple(_) => find_spec(TUPLE_METHODS, name),
            Value::Dict(_) => find_spec(DICT_METHODS, name),
            Value::Set { frozen: false, .. } => find_spec(SET_METHODS, name),
            Value::Set { frozen: true, .. } => {
                find_spec(SET_METHODS, name).filter(|s| FROZENSET_METHODS.contains(&s.name))
            }
            Value::Iter(_) => find_spec(ITER_METHODS, name),
            Value::Generator(_) => find_spec(GENERATOR_METHODS, name),
            _ => None,
        }
    }

    /// 内建值的属性：方法或数据属性
    pub(crate) fn builtin_attr(
        &mut self,
        recv: ValueId,
        name: &str,
    ) -> NodeResult<NodeId> {
        if let Some(spec) = self.method_spec(recv, name) {
            let method = self.intern(ValueKey::BuiltinMethod(recv, spec.name), |_| {
                Value::BuiltinMethod {
                    recv,
                    name: spec.name,
                }
            });
            return Ok(self.graph.simple_node(method));
        }
        let data = match (self.value(recv), name) {
            (_, "__class__") => Some(self.class_of(recv)),
            (_, "__doc__") => Some(self.prim(Prim::Str)),
            (Value::Prim(Prim::Complex), "real" | "imag") => Some(self.prim(Prim::Float)),
            (Value::Prim(p), "real" | "imag" | "numerator" | "denominator") if p.is_numeric() => {
                Some(self.prim(*p))
            }
            (Value::Prim(Prim::File), "closed") => Some(self.prim(Prim::Bool)),
            (Value::Prim(Prim::File), "name" | "mode") => Some(self.prim(Prim::Str)),
            (Value::Function(_), "__name__" | "func_name" | "__module__") => {
                Some(self.prim(Prim::Str))
            }
            (Value::Function(_), "func_code" | "__code__") => Some(self.prim(Prim::Object)),            (Value::BoundMethod { recv, .. }, "im_self" | "__self__") => Some(*recv),
            (Value::BoundMethod { func, .. }, "im_func" | "__func__") => Some(*func),
            (Value::BoundMethod { .. }, "__name__") => Some(self.prim(Prim::Str)),
            (Value::Type(_), "__name__" | "__module__") => Some(self.prim(Prim::Str)),
            (Value::Type(_), "__init__" | "__new__") => Some(self.builtin_func("object.__init__")),
            (Value::Traceback(_), "tb_lineno") => Some(self.prim(Prim::Int)),
            _ => None,
        };
        match data {
            Some(value) => Ok(self.graph.simple_node(value)),
            None => {
                // 内建类型上的未绑定方法（`str.lower`）
                if let Value::Type(ty) = self.value(recv) {
                    if let Some(rep) = self.type_representative(*ty) {
                        if let Some(spec) = self.method_spec(rep, name) {
                            let method = self.intern(ValueKey::BuiltinMethod(recv, spec.name), |_| {
                                Value::BuiltinMethod {
                                    recv,
                                    name: spec.name,
                                }
                            });
                            return Ok(self.graph.simple_node(method));
                        }
                    }
                }
                Err(NodeError::Attr(
                    ErrorConfig::attribute_not_found(&self.short_name(recv), name).message,
                ))
            }
        }
    }

    /// 原始类型的代表值
    fn type_representative(
        &self,
        ty: BuiltinType,
    ) -> Option<ValueId> {
        let prim = match ty {
            BuiltinType::Str => Prim::Str,
            BuiltinType::Unicode => Prim::Unicode,
            BuiltinType::Int => Prim::Int,
            BuiltinType::Long => Prim::Long,
            BuiltinType::Float => Prim::Float,
            BuiltinType::Complex => Prim::Complex,
            BuiltinType::File => Prim::File,
            _ => return None,
        };
        Some(self.prim(prim))
    }

    /// 调用内建方法
    pub(crate) fn call_builtin_method(
        &mut self,
        call: &CallArgs,
        recv: ValueId,
        name: &str,
    ) -> NodeResult<NodeId> {
        // 未绑定方法：第一个实参是接收者
        if let Value::Type(ty) = self.value(recv) {
            let ty = *ty;
            let Some(rep) = self.type_representative(ty) else {
                return Err(NodeError::Type(format!("not callable: {}.{}", ty.name(), name)));
            };
            let Some(&first) = call.args.first() else {
                return Err(NodeError::Type(
                    ErrorConfig::too_few_args(0, 1).message,
                ));
            };
            let spec = ty.name();
            self.check_arg(
                call.frame,
                call.line,
                first,
                ArgSpec::Type(ty),
                format!("{}.{}", spec, name),
            );
            let mut rest = call.clone();
            rest.args.remove(0);
            if !rest.const_strs.is_empty() {
                rest.const_strs.remove(0);
            }
            return self.call_builtin_method(&rest, rep, name);
        }
        let spec = self
            .method_spec(recv, name)
            .ok_or_else(|| NodeError::Attr(format!("attribute not found: {}", name)))?;
        self.call_builtin_spec(call, spec, Some(recv))
    }

    /// 由代码实现的内建方法
    pub(crate) fn special_method(
        &mut self,
        call: &CallArgs,
        spec: &BuiltinSpec,
        recv: ValueId,
    ) -> NodeResult<NodeId> {
        let frame = call.frame;
        let line = call.line;
        let value = match (self.value(recv), spec.name) {
            (Value::Dict(d), "keys") => {
                let key = d.key;
                self.owned_list(recv, "keys", key)
            }
            (Value::Dict(d), "values") => {
                let value = d.value;
                self.owned_list(recv, "values", value)
            }
            (Value::Dict(d), "items") => {
                let (key, value) = (d.key, d.value);
                let item = self.owned_tuple(recv, "item", vec![key, value]);
                let items = self.owned_list(recv, "items", Graph::UNDEFINED);
                let elemall = self.seq_elemall(items);
                self.graph.add(elemall, item);
                items
            }
            (Value::Dict(d), "popitem") => {
                let (key, value) = (d.key, d.value);
                self.owned_tuple(recv, "item", vec![key, value])
            }
            (Value::Dict(d), "iterkeys" | "itervalues" | "iteritems") => {
                let (key, value) = (d.key, d.value);
                let tag = spec.name;
                let iter = self.intern(ValueKey::Owned(recv, tag), |interp| {
                    Value::Iter(SeqObj {
                        elemall: interp.graph.new_node(),
                    })
                });
                let elemall = self.seq_elemall(iter);
                match tag {
                    "iterkeys" => self.graph.connect_nodes(key, elemall),
                    "itervalues" => self.graph.connect_nodes(value, elemall),
                    _ => {
                        let item = self.owned_tuple(recv, "item", vec![key, value]);
                        self.graph.add(elemall, item);
                    }
                }
                iter
            }
            (Value::Dict(d), "update") => {
                let (key, value) = (d.key, d.value);
                for src in call.args.iter().copied().chain(call.dstar) {
                    self.attach(src, Op::DictUpdate { frame, line, key, value });
                }
                if !call.kwargs.is_empty() {
                    let string = self.prim_node(Prim::Str);
                    self.graph.connect_nodes(string, key);
                    for (_, node) in &call.kwargs {
                        self.graph.connect_nodes(*node, value);
                    }
                }
                self.prim(Prim::None)
            }
            (Value::List(seq), "sort") => {
                let elemall = seq.elemall;
                for (keyword, callee) in call.kwargs.clone() {
                    match keyword.as_str() {
                        "key" => {
                            self.call_with(call, callee, vec![elemall]);
                        }
                        "cmp" => {
                            self.call_with(call, callee, vec![elemall, elemall]);
                        }
                        _ => {}
                    }
                }
                if let Some(&callee) = call.args.first() {
                    self.call_with(call, callee, vec![elemall, elemall]);
                }
                self.prim(Prim::None)
            }
            (Value::Set { frozen, .. }, "union" | "symmetric_difference" | "difference") => {
                let frozen = *frozen;
                let own = self.element_node(recv);
                let result = self.intern(ValueKey::Derived(call.site, spec.name, recv, recv), |interp| {
                    Value::Set {
                        seq: SeqObj {
                            elemall: interp.graph.new_node(),
                        },
                        frozen,
                    }
                });
                let elemall = self.seq_elemall(result);
                self.graph.connect_nodes(own, elemall);
                if spec.name != "difference" {
                    if let Some(&other) = call.args.first() {
                        let elems = self.iter_node(frame, line, other);
                        self.graph.connect_nodes(elems, elemall);
                    }
                }
                result
            }
            (Value::Set { frozen, .. }, "intersection") => {
                let frozen = *frozen;
                let own = self.element_node(recv);
                let other = match call.args.first() {
                    Some(&other) => self.iter_node(frame, line, other),
                    None => Graph::UNDEFINED,
                };
                self.mixed_set(call.site, recv, frozen, own, other)
            }
            (Value::Prim(Prim::File), "readlines") => {
                let string = self.prim_node(Prim::Str);
                self.owned_list(recv, "readlines", string)
            }
            _ => {
                return Err(NodeError::Type(format!(
                    "unsupported method: {}.{}",
                    self.type_name(recv),
                    spec.name
                )))
            }
        };
        Ok(self.graph.simple_node(value))
    }
}
