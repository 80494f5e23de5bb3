//! 执行帧与异常传播
//!
//! 每个帧有一个注解节点（annotator），收集在该帧上抛出的回溯。
//! 子帧的注解节点连接到父帧；`try` 体的帧改为连接到捕获器，
//! 捕获器把匹配的异常送往处理器，其余的在不动点循环中转发给父帧。

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexSet;

use super::errors::{ErrorConfig, ExcSpec, NodeError, NodeResult};
use super::function::CallArgs;
use super::graph::{NodeId, OpId, Receiver};
use super::ops::Op;
use super::value::{ExceptionObj, Prim, TracebackObj, Value, ValueId, ValueKey};
use super::Interpreter;
use crate::frontend::parser::ast::AstId;

/// 帧 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// 帧种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    Module(ValueId),
    Function(ValueId),
    /// `try` 体，由捕获器过滤
    Try,
    /// 类体
    Class,
}

/// 执行帧
#[derive(Debug, Clone)]
pub struct Frame {
    pub parent: Option<FrameId>,
    pub annotator: NodeId,
    pub kind: FrameKind,
    /// 所在模块名
    pub module: String,
    /// 作用域限定名
    pub scope: String,
}

/// 一个 `except` 子句
#[derive(Debug, Clone)]
pub struct Handler {
    /// 可捕获的类；`None` 为裸 `except`
    pub classes: Option<NodeId>,
    /// 被捕获的异常值
    pub caught: NodeId,
}

/// 异常捕获器
#[derive(Debug, Clone)]
pub struct Catcher {
    pub frame: FrameId,
    pub parent: FrameId,
    pub handlers: Vec<Handler>,
    /// 尚未匹配的回溯
    pub pending: IndexSet<ValueId>,
    /// 已转发给父帧的回溯
    pub forwarded: HashSet<ValueId>,
}

impl Interpreter {
    /// 新建帧；`parent` 非空时注解节点直接流向父帧
    pub(crate) fn new_frame(
        &mut self,
        parent: Option<FrameId>,
        kind: FrameKind,
        module: &str,
        scope: &str,
    ) -> FrameId {
        let annotator = self.graph.new_node();
        if let Some(p) = parent {
            if kind != FrameKind::Try {
                let parent_annotator = self.frames[p.index()].annotator;
                self.graph.connect_nodes(annotator, parent_annotator);
            }
        }
        let id = FrameId(self.frames.len() as u32);
        self.frames.push(Frame {
            parent,
            annotator,
            kind,
            module: module.to_string(),
            scope: scope.to_string(),
        });
        id
    }

    pub fn frame(
        &self,
        id: FrameId,
    ) -> &Frame {
        &self.frames[id.index()]
    }

    /// `child` 的异常流向 `parent`（调用边）
    pub(crate) fn connect_frames(
        &mut self,
        child: FrameId,
        parent: FrameId,
    ) {
        if child == parent {
            return;
        }
        let from = self.frames[child.index()].annotator;
        let to = self.frames[parent.index()].annotator;
        self.graph.connect_nodes(from, to);
    }

    /// 内建异常类
    pub(crate) fn exception_class(
        &self,
        name: &str,
    ) -> ValueId {
        self.exception_classes
            .get(name)
            .or_else(|| self.exception_classes.get("Exception"))
            .copied()
            .unwrap_or_else(|| self.type_value(super::value::BuiltinType::Object))
    }

    /// 铸造带消息的异常值（按 (类, 消息) 驻留）
    pub(crate) fn mint(
        &mut self,
        spec: &ExcSpec,
    ) -> ValueId {
        let class = self.exception_class(spec.class);
        self.mint_with_class(class, &spec.message)
    }

    pub(crate) fn mint_with_class(
        &mut self,
        class: ValueId,
        message: &str,
    ) -> ValueId {
        self.intern(ValueKey::Exception(class, message.to_string()), |_| {
            Value::Exception(ExceptionObj {
                class,
                message: message.to_string(),
            })
        })
    }

    /// 在帧上抛出异常值
    pub(crate) fn raise_expt(
        &mut self,
        frame: FrameId,
        line: usize,
        expt: ValueId,
        uncertain: bool,
    ) {
        let tb = self.intern(ValueKey::Traceback(expt, frame, line, uncertain), |_| {
            Value::Traceback(TracebackObj {
                expt,
                frame,
                line,
                uncertain,
            })
        });
        let annotator = self.frames[frame.index()].annotator;
        if self.graph.add(annotator, tb) {
            tracing::trace!(
                "raise {} at {}:{}",
                self.short_name(expt),
                self.frames[frame.index()].module,
                line
            );
        }
    }

    /// 按配置决定是否抛出
    pub(crate) fn raise_spec(
        &mut self,
        frame: FrameId,
        line: usize,
        spec: &ExcSpec,
    ) {
        if !self.config.enabled(spec) {
            return;
        }
        let expt = self.mint(spec);
        self.raise_expt(frame, line, expt, spec.uncertain);
    }

    /// `raise` 语句收到一个值：类先实例化，内建异常类带上消息
    pub(crate) fn raise_value(
        &mut self,
        frame: FrameId,
        line: usize,
        site: AstId,
        args: &[NodeId],
        message: Option<&str>,
        value: ValueId,
    ) -> NodeResult<()> {
        let expt = match self.value(value) {
            Value::Class(class) => {
                let (builtin, instance) = (class.builtin, class.instance);
                // 无实参时同样经过 `__init__`，其异常与参数个数错误落在 raise 处
                let mut call = CallArgs::new(frame, line, site);
                call.args.extend(args.iter().copied());
                self.call_value(&call, value)?;
                if builtin {
                    self.mint_with_class(value, message.unwrap_or_default())
                } else {
                    instance
                }
            }
            Value::Instance(inst) => {
                let class = inst.class;
                match (message, self.class_obj(class).map(|c| c.builtin)) {
                    (Some(message), Some(true)) => self.mint_with_class(class, message),
                    _ => value,
                }
            }
            Value::Exception(_) => value,
            Value::Prim(Prim::None) if self.config.ignore_none => return Ok(()),
            _ => {
                return Err(NodeError::Type(
                    ErrorConfig::bad_exception(&self.type_name(value)).message,
                ))
            }
        };
        self.raise_expt(frame, line, expt, false);
        Ok(())
    }

    /// 为 `try` 体注册捕获器
    pub(crate) fn add_catcher(
        &mut self,
        frame: FrameId,
        parent: FrameId,
        handlers: Vec<Handler>,
    ) -> OpId {
        let annotator = self.frames[frame.index()].annotator;
        let op = self.new_op(Op::Catcher(Catcher {
            frame,
            parent,
            handlers,
            pending: IndexSet::new(),
            forwarded: HashSet::new(),
        }));
        self.catchers.push(op);
        self.graph.connect(annotator, Receiver::Op(op, 0));
        op
    }

    /// 异常是否被处理器捕获
    fn handler_matches(
        &self,
        handler: &Handler,
        expt: ValueId,
    ) -> bool {
        let Some(classes) = handler.classes else {
            return true;
        };
        let class = self.class_of(expt);
        self.graph
            .types(classes)
            .iter()
            .any(|&c| self.class_matches(class, c))
    }

    fn class_matches(
        &self,
        class: ValueId,
        handler_class: ValueId,
    ) -> bool {
        match self.value(handler_class) {
            Value::Class(_) => self.is_subclass(class, handler_class),
            Value::Tuple(t) => {
                let nodes: Vec<NodeId> = match &t.elements {
                    Some(elements) => elements.clone(),
                    None => vec![t.elemall],
                };
                nodes.iter().any(|&n| {
                    self.graph.types(n).iter().any(|&c| {
                        matches!(self.value(c), Value::Class(_)) && self.is_subclass(class, c)
                    })
                })
            }
            _ => false,
        }
    }

    /// 捕获器收到一个回溯
    pub(crate) fn catch(
        &mut self,
        catcher: &mut Catcher,
        tb: ValueId,
    ) {
        if !self.route(catcher, tb) {
            catcher.pending.insert(tb);
        }
    }

    /// 尝试把回溯送往第一个匹配的处理器
    fn route(
        &mut self,
        catcher: &Catcher,
        tb: ValueId,
    ) -> bool {
        let Value::Traceback(t) = self.value(tb) else {
            return false;
        };
        let expt = t.expt;
        let target = catcher
            .handlers
            .iter()
            .find(|h| self.handler_matches(h, expt))
            .map(|h| h.caught);
        match target {
            Some(caught) => {
                self.graph.add(caught, expt);
                true
            }
            None => false,
        }
    }

    /// 不动点循环中的捕获器步骤：先重试匹配，全部稳定后再转发未匹配的回溯
    pub(crate) fn step_catchers(&mut self) -> bool {
        let mut routed = false;
        for i in 0..self.catchers.len() {
            let id = self.catchers[i];
            let mut op = self.take_op(id);
            if let Op::Catcher(catcher) = &mut op {
                let pending: Vec<ValueId> = catcher.pending.iter().copied().collect();
                for tb in pending {
                    if self.route(catcher, tb) {
                        catcher.pending.shift_remove(&tb);
                        routed = true;
                    }
                }
            }
            self.put_op(id, op);
        }
        if routed {
            return true;
        }

        let mut forwarded = false;
        for i in 0..self.catchers.len() {
            let id = self.catchers[i];
            let mut op = self.take_op(id);
            if let Op::Catcher(catcher) = &mut op {
                let parent_annotator = self.frames[catcher.parent.index()].annotator;
                for &tb in &catcher.pending {
                    if catcher.forwarded.insert(tb) {
                        self.graph.add(parent_annotator, tb);
                        forwarded = true;
                    }
                }
            }
            self.put_op(id, op);
        }
        forwarded
    }
}
