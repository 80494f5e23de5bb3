//! 类、实例与属性
//!
//! 类属性查找先看自己的属性表，找不到时经 `baseklass` 节点转发到每个基类
//! （基类值随推断增长，查找结果也随之增长）。实例属性读取合并实例变量与
//! 经绑定的类属性：函数绑定为方法，类方法绑定到类，静态方法返回原函数，
//! 属性（property）调用其 getter。

use std::collections::HashSet;

use super::checker::PostCheck;
use super::errors::{ErrorConfig, NodeError, NodeResult};
use super::frame::FrameId;
use super::function::CallArgs;
use super::graph::NodeId;
use super::ops::Op;
use super::value::{BuiltinType, Prim, Value, ValueId, ValueKey};
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

impl Interpreter {
    /// 类上的原始属性（未绑定），按 (类, 名字) 缓存
    pub(crate) fn class_lookup(
        &mut self,
        class: ValueId,
        name: &str,
    ) -> NodeId {
        let key = (class, name.to_string());
        if let Some(&node) = self.class_lookups.get(&key) {
            return node;
        }
        let Some((space, baseklass)) = self.class_obj(class).map(|c| (c.space, c.baseklass)) else {
            return super::graph::Graph::UNDEFINED;
        };
        let node = match self.local_var(space, name) {
            Some(var) => var,
            None => {
                let node = self.graph.new_node();
                self.attach(
                    baseklass,
                    Op::BaseLookup {
                        name: name.to_string(),
                        target: node,
                    },
                );
                node
            }
        };
        self.class_lookups.insert(key, node);
        node
    }

    /// 基类值到达：把该基类上的查找结果并入
    pub(crate) fn base_lookup_value(
        &mut self,
        base: ValueId,
        name: &str,
        target: NodeId,
    ) {
        match self.value(base) {
            Value::Class(_) => {
                let found = self.class_lookup(base, name);
                self.graph.connect_nodes(found, target);
            }
            Value::Type(_) if name == "__init__" || name == "__new__" => {
                let init = self.builtin_func("object.__init__");
                self.graph.add(target, init);
            }
            _ => {}
        }
    }

    /// 实例的属性变量，不存在则创建
    pub(crate) fn instance_var(
        &mut self,
        instance: ValueId,
        name: &str,
    ) -> NodeId {
        if let Value::Instance(inst) = self.value(instance) {
            if let Some(&var) = inst.attrs.get(name) {
                return var;
            }
        }
        let var = self.graph.new_node();
        if let Value::Instance(inst) = self.value_mut(instance) {
            inst.attrs.insert(name.to_string(), var);
        }
        var
    }

    /// 异常值共享其类的实例属性
    fn instance_of(
        &self,
        value: ValueId,
    ) -> Option<ValueId> {
        match self.value(value) {
            Value::Instance(_) => Some(value),
            Value::Exception(e) => self.class_obj(e.class).map(|c| c.instance),
            _ => None,
        }
    }

    /// 实例属性：实例变量 + 绑定后的类属性
    pub(crate) fn instance_attr(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        instance: ValueId,
        name: &str,
    ) -> NodeId {
        let key = (instance, name.to_string());
        if let Some(&node) = self.attr_nodes.get(&key) {
            return node;
        }
        let node = self.graph.new_node();
        self.attr_nodes.insert(key, node);
        let class = self.class_of(instance);
        if name == "__class__" {
            self.graph.add(node, class);
            return node;
        }
        let var = self.instance_var(instance, name);
        self.graph.connect_nodes(var, node);
        let raw = self.class_lookup(class, name);
        self.attach(
            raw,
            Op::Bind {
                recv: instance,
                class_level: false,
                frame,
                line,
                site,
                target: node,
            },
        );
        node
    }

    /// 类属性（类级绑定）
    fn class_attr(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        class: ValueId,
        name: &str,
    ) -> NodeId {
        let key = (class, name.to_string());
        if let Some(&node) = self.attr_nodes.get(&key) {
            return node;
        }
        let node = self.graph.new_node();
        self.attr_nodes.insert(key, node);
        let raw = self.class_lookup(class, name);
        self.attach(
            raw,
            Op::Bind {
                recv: class,
                class_level: true,
                frame,
                line,
                site,
                target: node,
            },
        );
        node
    }

    /// `super(C, x).name`：从 C 的基类开始查找，绑定到 x
    fn super_attr(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        sup: ValueId,
        name: &str,
    ) -> NodeId {
        let key = (sup, name.to_string());
        if let Some(&node) = self.attr_nodes.get(&key) {
            return node;
        }
        let node = self.graph.new_node();
        self.attr_nodes.insert(key, node);
        let Value::Super { class, recv } = self.value(sup) else {
            return node;
        };
        let (class, recv) = (*class, *recv);
        let Some(baseklass) = self.class_obj(class).map(|c| c.baseklass) else {
            return node;
        };
        let raw = self.graph.new_node();
        self.attach(
            baseklass,
            Op::BaseLookup {
                name: name.to_string(),
                target: raw,
            },
        );
        let class_level = matches!(self.value(recv), Value::Class(_));
        self.attach(
            raw,
            Op::Bind {
                recv,
                class_level,
                frame,
                line,
                site,
                target: node,
            },
        );
        node
    }

    pub(crate) fn bound_method(
        &mut self,
        recv: ValueId,
        func: ValueId,
    ) -> ValueId {
        self.intern(ValueKey::Bound(recv, func), |_| Value::BoundMethod { recv, func })
    }

    /// 绑定操作收到一个原始属性值
    pub(crate) fn bind_value(
        &mut self,
        recv: ValueId,
        class_level: bool,
        call: CallArgs,
        raw: ValueId,
        target: NodeId,
    ) {
        let bound = match self.value(raw) {
            Value::Function(_) if !class_level => self.bound_method(recv, raw),
            Value::ClassMethod(func) => {
                let func = *func;
                let class = if class_level { recv } else { self.class_of(recv) };
                self.bound_method(class, func)
            }
            Value::StaticMethod(func) => *func,
            Value::Property(getter) if !class_level => {
                let getter = *getter;
                let getter = self.graph.simple_node(getter);
                let recv = self.graph.simple_node(recv);
                let result = self.call_node(call.with_receiver(recv), getter);
                self.graph.connect_nodes(result, target);
                return;
            }
            _ => raw,
        };
        self.graph.add(target, bound);
    }

    /// 对象上的属性节点
    fn attr_of(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        obj: ValueId,
        name: &str,
    ) -> NodeResult<NodeId> {
        match self.value(obj) {
            Value::Instance(_) => Ok(self.instance_attr(frame, line, site, obj, name)),
            Value::Exception(_) => match self.instance_of(obj) {
                Some(instance) => Ok(self.instance_attr(frame, line, site, instance, name)),
                None => self.builtin_attr(obj, name),
            },
            Value::Class(c) => match name {
                "__name__" | "__module__" | "__doc__" => Ok(self.prim_node(Prim::Str)),
                "__bases__" => {
                    let bases = c.bases.clone();
                    let tuple = self.owned_tuple(obj, "__bases__", bases);
                    Ok(self.graph.simple_node(tuple))
                }
                "__class__" => {
                    let ty = self.type_value(BuiltinType::Type);
                    Ok(self.graph.simple_node(ty))
                }
                _ => Ok(self.class_attr(frame, line, site, obj, name)),
            },
            Value::Module(m) => {
                let module_name = m.name.clone();
                match self.local_var(m.space, name) {
                    Some(var) => Ok(var),
                    None => match name {
                        "__file__" | "__name__" | "__doc__" => Ok(self.prim_node(Prim::Str)),
                        _ => Err(NodeError::Attr(
                            ErrorConfig::attribute_not_found(&module_name, name).message,
                        )),
                    },
                }
            }
            Value::Super { .. } => Ok(self.super_attr(frame, line, site, obj, name)),
            _ => self.builtin_attr(obj, name),
        }
    }

    /// 属性引用操作收到一个对象
    pub(crate) fn attr_ref_value(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        obj: ValueId,
        name: &str,
        quiet: bool,
        target: NodeId,
    ) {
        if self.config.ignore_none && self.is_none(obj) {
            return;
        }
        match self.attr_of(frame, line, site, obj, name) {
            Ok(node) => {
                self.graph.connect_nodes(node, target);
                let checked = matches!(
                    self.value(obj),
                    Value::Instance(_) | Value::Exception(_) | Value::Class(_)
                );
                if checked && !quiet {
                    self.add_post_check(PostCheck::AttrFound {
                        node,
                        frame,
                        line,
                        obj,
                        name: name.to_string(),
                    });
                }
            }
            Err(e) => {
                if !quiet {
                    self.raise_spec(frame, line, &e.to_spec());
                }
            }
        }
    }

    /// 属性赋值操作收到一个对象
    pub(crate) fn attr_assign_value(
        &mut self,
        obj: ValueId,
        name: &str,
        value: NodeId,
    ) -> NodeResult<()> {
        match self.value(obj) {
            Value::Instance(_) | Value::Exception(_) => {
                if let Some(instance) = self.instance_of(obj) {
                    let var = self.instance_var(instance, name);
                    self.graph.connect_nodes(value, var);
                }
                Ok(())
            }
            Value::Class(c) => {
                let space = c.space;
                let var = self.get_or_create_var(space, name);
                self.graph.connect_nodes(value, var);
                // 此前的查找结果也要看到新的类属性
                if let Some(&cached) = self.class_lookups.get(&(obj, name.to_string())) {
                    self.graph.connect_nodes(var, cached);
                }
                Ok(())
            }
            Value::Module(m) => {
                let space = m.space;
                self.bind_name(space, name, value);
                Ok(())
            }
            // 函数属性不跟踪
            Value::Function(_) => Ok(()),
            Value::Prim(Prim::None) if self.config.ignore_none => Ok(()),
            _ => Err(NodeError::Assign(
                ErrorConfig::attribute_not_assignable(&self.short_name(obj), name).message,
            )),
        }
    }

    /// 构建期：`obj.name` 的结果节点
    pub(crate) fn attr_node(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        obj: NodeId,
        name: &str,
        quiet: bool,
    ) -> NodeId {
        let target = self.graph.new_node();
        self.attach(
            obj,
            Op::AttrRef {
                frame,
                line,
                site,
                name: name.to_string(),
                quiet,
                target,
            },
        );
        target
    }

    /// 构建期：`obj.name = value`
    pub(crate) fn attr_assign(
        &mut self,
        frame: FrameId,
        line: usize,
        obj: NodeId,
        name: &str,
        value: NodeId,
    ) {
        self.attach(
            obj,
            Op::AttrAssign {
                frame,
                line,
                name: name.to_string(),
                value,
            },
        );
    }

    /// `class` 是否是 `base` 的子类（自反，沿已知基类递归）
    pub fn is_subclass(
        &self,
        class: ValueId,
        base: ValueId,
    ) -> bool {
        self.subclass_rec(class, base, &mut HashSet::new())
    }

    fn subclass_rec(
        &self,
        class: ValueId,
        base: ValueId,
        visited: &mut HashSet<ValueId>,
    ) -> bool {
        if class == base {
            return true;
        }
        if !visited.insert(class) {
            return false;
        }
        let Some(obj) = self.class_obj(class) else {
            return false;
        };
        self.graph
            .types(obj.baseklass)
            .iter()
            .any(|&b| self.subclass_rec(b, base, visited))
    }
}
