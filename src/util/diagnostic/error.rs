//! 诊断数据结构
//!
//! 推断引擎在不动点之后把未被捕获的异常转换为 `Diagnostic`，
//! 报告器与命令行只消费这里的结构。

use std::fmt;

/// 诊断严重级别
///
/// `Error` 对应"确定发生"（occur），`Warning` 对应"可能发生"（maybe）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// 检查是否为错误级别
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// 诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// 严重级别
    pub severity: Severity,
    /// 异常类名（如 `TypeError`）
    pub code: String,
    /// 完整消息
    pub message: String,
    /// 所在模块
    pub module: String,
    /// 行号（0 表示未知）
    pub line: usize,
    /// 所在函数或类的限定名（模块级为空）
    pub scope: String,
}

impl Diagnostic {
    /// 创建诊断
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            module: String::new(),
            line: 0,
            scope: String::new(),
        }
    }

    /// 设置位置
    pub fn at(
        mut self,
        module: impl Into<String>,
        line: usize,
    ) -> Self {
        self.module = module.into();
        self.line = line;
        self
    }

    /// 设置作用域
    pub fn in_scope(
        mut self,
        scope: impl Into<String>,
    ) -> Self {
        self.scope = scope.into();
        self
    }

    /// 排序键：模块、行号、类名、消息
    pub fn sort_key(&self) -> (&str, usize, &str, &str) {
        (&self.module, self.line, &self.code, &self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
