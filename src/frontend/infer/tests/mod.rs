//! 推断引擎测试

mod builtins;
mod calls;
mod classes;
mod exceptions;
mod invariants;
mod modules;
mod scenarios;

use super::Interpreter;
use crate::util::config::AnalyzerConfig;
use crate::util::diagnostic::Diagnostic;

/// 不使用默认路径的配置
pub(super) fn config() -> AnalyzerConfig {
    AnalyzerConfig {
        use_default_path: false,
        ..AnalyzerConfig::default()
    }
}

/// 以模块 `m` 分析源码并运行到不动点
pub(super) fn analyze_with(
    source: &str,
    config: &AnalyzerConfig,
) -> Interpreter {
    let mut interp = Interpreter::new(config);
    interp.load_source("m", source).expect("parse");
    interp.run();
    interp
}

pub(super) fn analyze(source: &str) -> Interpreter {
    analyze_with(source, &config())
}

/// 同时报告 maybe 类诊断
pub(super) fn analyze_uncertain(source: &str) -> Interpreter {
    let mut config = config();
    config.raise_uncertain = true;
    analyze_with(source, &config)
}

pub(super) fn codes(interp: &Interpreter) -> Vec<String> {
    interp.diagnostics().into_iter().map(|d| d.code).collect()
}

pub(super) fn diagnostics_of(source: &str) -> Vec<Diagnostic> {
    analyze(source).diagnostics()
}

/// 模块 `m` 中变量的描述
pub(super) fn var(
    interp: &Interpreter,
    name: &str,
) -> String {
    interp
        .describe_var("m", name)
        .unwrap_or_else(|| panic!("no variable {}", name))
}
