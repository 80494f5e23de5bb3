//! 命名空间与名字解析
//!
//! 命名空间是带父指针的有序表（名字 → 变量节点）。查找沿父链进行，
//! 但跳过外层的类作用域（方法看不到类体中的名字）。

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use super::graph::NodeId;
use super::value::ValueId;
use super::Interpreter;
use crate::frontend::parser::ast::*;

/// 命名空间 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(pub u32);

impl SpaceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SpaceId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// 命名空间种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceKind {
    Builtin,
    Module,
    Class,
    Function,
}

/// 命名空间
#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub kind: SpaceKind,
    pub parent: Option<SpaceId>,
    pub vars: IndexMap<String, NodeId>,
    /// `global` 声明的名字
    pub globals: HashSet<String>,
    /// 在此作用域中定义的函数与类（报告用）
    pub defs: Vec<ValueId>,
}

impl Interpreter {
    pub(crate) fn new_space(
        &mut self,
        name: &str,
        kind: SpaceKind,
        parent: Option<SpaceId>,
    ) -> SpaceId {
        let id = SpaceId(self.spaces.len() as u32);
        self.spaces.push(Namespace {
            name: name.to_string(),
            kind,
            parent,
            vars: IndexMap::new(),
            globals: HashSet::new(),
            defs: Vec::new(),
        });
        id
    }

    pub fn space(
        &self,
        id: SpaceId,
    ) -> &Namespace {
        &self.spaces[id.index()]
    }

    /// 仅在本作用域查找
    pub fn local_var(
        &self,
        space: SpaceId,
        name: &str,
    ) -> Option<NodeId> {
        self.spaces[space.index()].vars.get(name).copied()
    }

    /// 沿词法链查找，跳过外层类作用域，最后查内建命名空间
    pub fn lookup(
        &self,
        space: SpaceId,
        name: &str,
    ) -> Option<NodeId> {
        if let Some(var) = self.local_var(space, name) {
            return Some(var);
        }
        let mut current = self.spaces[space.index()].parent;
        while let Some(id) = current {
            let ns = &self.spaces[id.index()];
            if ns.kind != SpaceKind::Class {
                if let Some(&var) = ns.vars.get(name) {
                    return Some(var);
                }
            }
            current = ns.parent;
        }
        self.local_var(self.builtin_space, name)
    }

    /// 本作用域的变量，不存在则创建
    pub(crate) fn get_or_create_var(
        &mut self,
        space: SpaceId,
        name: &str,
    ) -> NodeId {
        if let Some(var) = self.local_var(space, name) {
            return var;
        }
        let var = self.graph.new_node();
        self.spaces[space.index()]
            .vars
            .insert(name.to_string(), var);
        var
    }

    /// 把值节点绑定到本作用域的变量
    pub(crate) fn bind_name(
        &mut self,
        space: SpaceId,
        name: &str,
        node: NodeId,
    ) {
        let var = self.get_or_create_var(space, name);
        self.graph.connect_nodes(node, var);
    }

    /// 所在的模块命名空间
    pub(crate) fn module_space_of(
        &self,
        space: SpaceId,
    ) -> SpaceId {
        let mut current = space;
        loop {
            let ns = &self.spaces[current.index()];
            match (ns.kind, ns.parent) {
                (SpaceKind::Module, _) | (SpaceKind::Builtin, _) | (_, None) => return current,
                (_, Some(parent)) => current = parent,
            }
        }
    }

    /// `global name`：把本地槽位指向模块变量
    pub(crate) fn declare_global(
        &mut self,
        space: SpaceId,
        name: &str,
    ) {
        let module = self.module_space_of(space);
        if module == space {
            return;
        }
        let var = self.get_or_create_var(module, name);
        let ns = &mut self.spaces[space.index()];
        ns.vars.insert(name.to_string(), var);
        ns.globals.insert(name.to_string());
    }

    /// 预先声明块中可能被赋值的所有名字（不进入嵌套的函数与类）
    pub(crate) fn register_names(
        &mut self,
        space: SpaceId,
        body: &[Stmt],
    ) {
        let mut globals = Vec::new();
        let mut names = Vec::new();
        collect_block(body, &mut globals, &mut names);
        for name in &globals {
            self.declare_global(space, name);
        }
        for name in &names {
            if !self.spaces[space.index()].globals.contains(name) {
                self.get_or_create_var(space, name);
            }
        }
    }
}

fn collect_block(
    body: &[Stmt],
    globals: &mut Vec<String>,
    names: &mut Vec<String>,
) {
    for stmt in body {
        collect_stmt(stmt, globals, names);
    }
}

fn collect_stmt(
    stmt: &Stmt,
    globals: &mut Vec<String>,
    names: &mut Vec<String>,
) {
    match &stmt.kind {
        StmtKind::FunctionDef(def) => names.push(def.name.clone()),
        StmtKind::ClassDef(def) => names.push(def.name.clone()),
        StmtKind::Global(list) => globals.extend(list.iter().cloned()),
        StmtKind::Assign { targets, .. } => {
            for target in targets {
                collect_target(target, names);
            }
        }
        StmtKind::AugAssign { target, .. } => collect_target(target, names),
        StmtKind::For {
            target,
            body,
            orelse,
            ..
        } => {
            collect_target(target, names);
            collect_block(body, globals, names);
            collect_block(orelse, globals, names);
        }
        StmtKind::If { body, orelse, .. } | StmtKind::While { body, orelse, .. } => {
            collect_block(body, globals, names);
            collect_block(orelse, globals, names);
        }
        StmtKind::TryExcept {
            body,
            handlers,
            orelse,
        } => {
            collect_block(body, globals, names);
            for handler in handlers {
                if let Some(target) = &handler.target {
                    collect_target(target, names);
                }
                collect_block(&handler.body, globals, names);
            }
            collect_block(orelse, globals, names);
        }
        StmtKind::TryFinally { body, finalbody } => {
            collect_block(body, globals, names);
            collect_block(finalbody, globals, names);
        }
        StmtKind::With { target, body, .. } => {
            if let Some(target) = target {
                collect_target(target, names);
            }
            collect_block(body, globals, names);
        }
        StmtKind::Import(aliases) => {
            for alias in aliases {
                let bound = match &alias.asname {
                    Some(asname) => asname.clone(),
                    None => alias.name.split('.').next().unwrap_or_default().to_string(),
                };
                names.push(bound);
            }
        }
        StmtKind::ImportFrom { names: list, .. } => {
            for alias in list {
                names.push(alias.asname.clone().unwrap_or_else(|| alias.name.clone()));
            }
        }
        _ => {}
    }
}

fn collect_target(
    target: &Expr,
    names: &mut Vec<String>,
) {
    match &target.kind {
        ExprKind::Name(name) => names.push(name.clone()),
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                collect_target(item, names);
            }
        }
        _ => {}
    }
}
