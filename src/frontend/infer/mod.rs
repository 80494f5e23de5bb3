//! 整程序类型推断引擎
//!
//! 源程序被降为一张类型流图：节点保存可能出现在该处的值的集合，
//! 边把值从一个节点送往另一个节点或某个操作。操作（调用、属性引用、
//! 运算、下标等）对每个流入的值求结果，并可能在构建期之后继续长出节点与边。
//! 所有集合只增不减，值按构造位置驻留，因此传播必然到达不动点。
//!
//! 求值产生的异常以回溯值的形式沿帧链流动：
//! - 函数帧的异常流向调用者的帧；
//! - `try` 体的帧流向捕获器，未被捕获的转发给外层；
//! - 到达模块帧（或从未被调用的函数帧）的回溯就是最终诊断。
//!
//! # 用法
//!
//! ```
//! use typeflow::frontend::infer::Interpreter;
//! use typeflow::util::config::AnalyzerConfig;
//!
//! let mut interp = Interpreter::new(&AnalyzerConfig::default());
//! interp.load_source("m", "x = 1 + 'a'\n").unwrap();
//! interp.run();
//! let diagnostics = interp.diagnostics();
//! assert_eq!(diagnostics[0].code, "TypeError");
//! ```

mod aggregate;
mod builder;
mod builtins;
mod checker;
mod class;
mod errors;
mod frame;
mod function;
mod graph;
mod module;
mod namespace;
mod operators;
mod ops;
mod value;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

pub use errors::{ErrorConfig, ExcSpec, NodeError, NodeResult};
pub use frame::{Frame, FrameId, FrameKind};
pub use graph::{Graph, NodeId};
pub use module::ModuleError;
pub use namespace::{Namespace, SpaceId, SpaceKind};
pub use value::{BuiltinType, ClassObj, FuncObj, ModuleObj, Prim, Value, ValueId};

use crate::frontend::parser::ast::AstId;
use crate::util::config::AnalyzerConfig;
use crate::util::diagnostic::{Diagnostic, Severity};
use checker::PostCheck;
use graph::OpId;
use ops::Op;
use value::ValueKey;

/// 推断解释器：图、值表、帧与命名空间的所有者
#[derive(Debug)]
pub struct Interpreter {
    pub(crate) graph: Graph,
    pub(crate) values: Vec<Value>,
    pub(crate) interned: HashMap<ValueKey, ValueId>,
    pub(crate) ops: Vec<Op>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) spaces: Vec<Namespace>,
    pub(crate) catchers: Vec<OpId>,
    pub(crate) checks: Vec<PostCheck>,
    pub(crate) site_nodes: HashMap<(AstId, &'static str), NodeId>,
    pub(crate) class_lookups: HashMap<(ValueId, String), NodeId>,
    pub(crate) attr_nodes: HashMap<(ValueId, String), NodeId>,
    pub(crate) modules: IndexMap<String, ValueId>,
    pub(crate) module_paths: HashMap<PathBuf, ValueId>,
    pub(crate) builtin_space: SpaceId,
    pub(crate) prims: Vec<ValueId>,
    pub(crate) types: Vec<ValueId>,
    pub(crate) exception_classes: IndexMap<String, ValueId>,
    pub(crate) config: ErrorConfig,
    pub(crate) stub_dirs: Vec<PathBuf>,
    pub(crate) module_dirs: Vec<PathBuf>,
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub nodes: usize,
    pub values: usize,
    pub deliveries: u64,
    pub rounds: usize,
}

impl Interpreter {
    /// 新建解释器并安装内建命名空间
    pub fn new(config: &AnalyzerConfig) -> Self {
        let mut interp = Self {
            graph: Graph::new(),
            values: Vec::new(),
            interned: HashMap::new(),
            ops: Vec::new(),
            frames: Vec::new(),
            spaces: Vec::new(),
            catchers: Vec::new(),
            checks: Vec::new(),
            site_nodes: HashMap::new(),
            class_lookups: HashMap::new(),
            attr_nodes: HashMap::new(),
            modules: IndexMap::new(),
            module_paths: HashMap::new(),
            builtin_space: SpaceId(0),
            prims: Vec::new(),
            types: Vec::new(),
            exception_classes: IndexMap::new(),
            config: ErrorConfig::from(config),
            stub_dirs: config.stub_dirs(),
            module_dirs: config.module_dirs(),
        };
        interp.install_builtins();
        tracing::debug!(
            "interpreter ready: {} builtin values, {} exception classes",
            interp.values.len(),
            interp.exception_classes.len()
        );
        interp
    }

    /// 运行到不动点
    ///
    /// 每一轮先饱和图并推进捕获器；图与捕获器都稳定后执行饱和后检查，
    /// 检查抛出的新异常可能再次推动传播。
    pub fn run(&mut self) -> RunStats {
        let mut rounds = 0;
        loop {
            rounds += 1;
            loop {
                self.saturate();
                if !self.step_catchers() {
                    break;
                }
            }
            if !self.run_post_checks() {
                break;
            }
        }
        let stats = RunStats {
            nodes: self.graph.node_count(),
            values: self.values.len(),
            deliveries: self.graph.deliveries(),
            rounds,
        };
        tracing::info!(
            "fixpoint reached: {} nodes, {} values, {} deliveries, {} rounds",
            stats.nodes,
            stats.values,
            stats.deliveries,
            stats.rounds
        );
        stats
    }

    /// 报告诊断的帧：源码模块的模块帧，以及其中从未被调用的函数的帧
    fn root_frames(&self) -> Vec<FrameId> {
        let mut roots = Vec::new();
        for (i, frame) in self.frames.iter().enumerate() {
            // 存根只描述类型，其中的异常在被调用时才流向使用者
            let in_stub = self
                .modules
                .get(&frame.module)
                .and_then(|&m| self.module_obj(m))
                .is_some_and(|m| m.is_stub);
            if in_stub {
                continue;
            }
            let root = match &frame.kind {
                FrameKind::Module(_) => true,
                FrameKind::Function(func) => self
                    .func_obj(*func)
                    .is_some_and(|f| f.caller_frames.is_empty()),
                FrameKind::Try | FrameKind::Class => false,
            };
            if root {
                roots.push(FrameId(i as u32));
            }
        }
        roots
    }

    /// 到达根帧的全部回溯，去重并排序
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut seen = IndexSet::new();
        for frame in self.root_frames() {
            for &tb in self.graph.types(self.frames[frame.index()].annotator) {
                if let Some(diagnostic) = self.traceback_diagnostic(tb) {
                    seen.insert(diagnostic);
                }
            }
        }
        let mut diagnostics: Vec<Diagnostic> = seen.into_iter().collect();
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics
    }

    /// 某个帧上收集到的回溯（含从被调用者传来的）
    pub fn frame_diagnostics(
        &self,
        frame: FrameId,
    ) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .graph
            .types(self.frames[frame.index()].annotator)
            .iter()
            .filter_map(|&tb| self.traceback_diagnostic(tb))
            .collect();
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.dedup();
        diagnostics
    }

    fn traceback_diagnostic(
        &self,
        tb: ValueId,
    ) -> Option<Diagnostic> {
        let Value::Traceback(t) = self.value(tb) else {
            return None;
        };
        let (class, message) = match self.value(t.expt) {
            Value::Exception(e) => (self.short_name(e.class), e.message.clone()),
            _ => (self.type_name(t.expt), String::new()),
        };
        let severity = if t.uncertain {
            Severity::Warning
        } else {
            Severity::Error
        };
        let frame = &self.frames[t.frame.index()];
        Some(
            Diagnostic::new(severity, class, message)
                .at(frame.module.clone(), t.line)
                .in_scope(frame.scope.clone()),
        )
    }

    /// 节点当前的值
    pub fn node_values(
        &self,
        node: NodeId,
    ) -> Vec<ValueId> {
        self.graph.types(node).iter().copied().collect()
    }

    /// 模块级变量的节点
    pub fn module_var(
        &self,
        module: &str,
        name: &str,
    ) -> Option<NodeId> {
        let module = self.modules.get(module)?;
        let space = self.module_obj(*module)?.space;
        self.local_var(space, name)
    }

    /// 模块级变量的描述（未知名字为 `None`）
    pub fn describe_var(
        &self,
        module: &str,
        name: &str,
    ) -> Option<String> {
        self.module_var(module, name).map(|n| self.describe_node(n))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}
