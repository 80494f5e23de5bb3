//! 内建异常类层次

use super::super::graph::NodeId;
use super::super::namespace::SpaceKind;
use super::super::value::{BuiltinType, ClassObj, InstanceObj, Prim, TupleObj, Value, ValueId, ValueKey};
use super::super::Interpreter;

/// (类名, 基类名)；按拓扑序排列，基类总在子类之前
pub const TAXONOMY: &[(&str, &str)] = &[
    ("BaseException", ""),
    ("SystemExit", "BaseException"),
    ("KeyboardInterrupt", "BaseException"),
    ("GeneratorExit", "BaseException"),
    ("Exception", "BaseException"),
    ("StopIteration", "Exception"),
    ("StandardError", "Exception"),
    ("Warning", "Exception"),
    ("ArithmeticError", "StandardError"),
    ("FloatingPointError", "ArithmeticError"),
    ("OverflowError", "ArithmeticError"),
    ("ZeroDivisionError", "ArithmeticError"),
    ("AssertionError", "StandardError"),
    ("AttributeError", "StandardError"),
    ("EnvironmentError", "StandardError"),
    ("IOError", "EnvironmentError"),
    ("OSError", "EnvironmentError"),
    ("EOFError", "StandardError"),
    ("ImportError", "StandardError"),
    ("LookupError", "StandardError"),
    ("IndexError", "LookupError"),
    ("KeyError", "LookupError"),
    ("MemoryError", "StandardError"),
    ("NameError", "StandardError"),
    ("UnboundLocalError", "NameError"),
    ("RuntimeError", "StandardError"),
    ("NotImplementedError", "RuntimeError"),
    ("SyntaxError", "StandardError"),
    ("SystemError", "StandardError"),
    ("TypeError", "StandardError"),
    ("ValueError", "StandardError"),
    ("UnicodeError", "ValueError"),
    ("DeprecationWarning", "Warning"),
    ("UserWarning", "Warning"),
    ("RuntimeWarning", "Warning"),
];

impl Interpreter {
    /// 创建内建异常类并登记到内建命名空间
    pub(crate) fn install_exceptions(&mut self) {
        for &(name, base) in TAXONOMY {
            let base = match base {
                "" => self.type_value(BuiltinType::Object),
                other => self.exception_class(other),
            };
            let class = self.new_builtin_class(name, base);
            if name == "BaseException" {
                self.install_exception_attrs(class);
            }
            self.exception_classes.insert(name.to_string(), class);
            self.define_builtin(name, class);
        }
    }

    /// 只有一个基类的内建类
    fn new_builtin_class(
        &mut self,
        name: &str,
        base: ValueId,
    ) -> ValueId {
        let base_node = self.graph.simple_node(base);
        let baseklass = self.graph.new_node();
        self.graph.add(baseklass, base);
        let space = self.new_space(name, SpaceKind::Class, None);
        // 实例值需要类 ID，先占位再回填
        let instance = self.push_value(Value::Prim(Prim::Object));
        let class = self.push_value(Value::Class(Box::new(ClassObj {
            name: name.to_string(),
            qualname: name.to_string(),
            module: "exceptions".to_string(),
            line: 0,
            bases: vec![base_node],
            baseklass,
            space,
            instance,
            builtin: true,
        })));
        *self.value_mut(instance) = Value::Instance(InstanceObj {
            class,
            attrs: Default::default(),
        });
        class
    }

    /// `BaseException` 的属性：`__init__`、`message`、`args`
    fn install_exception_attrs(
        &mut self,
        class: ValueId,
    ) {
        let Some(space) = self.class_obj(class).map(|c| c.space) else {
            return;
        };
        let init = self.builtin_func("exception.__init__");
        let init_var = self.get_or_create_var(space, "__init__");
        self.graph.add(init_var, init);

        let str_value = self.prim(Prim::Str);
        let message = self.get_or_create_var(space, "message");
        self.graph.add(message, str_value);

        let elemall: NodeId = self.graph.new_node();
        self.graph.add(elemall, str_value);
        let args = self.intern(ValueKey::Const("exception.args"), |_| {
            Value::Tuple(TupleObj {
                elemall,
                elements: None,
            })
        });
        let args_var = self.get_or_create_var(space, "args");
        self.graph.add(args_var, args);
    }
}
