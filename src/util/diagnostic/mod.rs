//! 统一诊断系统
//!
//! 提供诊断数据结构和文本渲染
//!
//! # 示例
//!
//! ```
//! use typeflow::util::diagnostic::{Diagnostic, DiagnosticRenderer, Severity};
//!
//! let diagnostic = Diagnostic::new(Severity::Error, "TypeError", "not callable").at("m", 3);
//! let output = DiagnosticRenderer::new().render(&diagnostic, None);
//! assert!(output.starts_with("m:3:"));
//! ```

pub mod error;

pub use error::{Diagnostic, Severity};

use crate::util::span::SourceFile;

/// 渲染器配置
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// 是否显示源码片段
    pub show_source: bool,
    /// 是否显示作用域
    pub show_scope: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            show_source: true,
            show_scope: true,
        }
    }
}

/// 诊断渲染器
#[derive(Debug, Clone, Default)]
pub struct DiagnosticRenderer {
    /// 渲染配置
    config: EmitterConfig,
}

impl DiagnosticRenderer {
    /// 创建新的渲染器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义配置创建渲染器
    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// 渲染单个诊断信息
    pub fn render(
        &self,
        diagnostic: &Diagnostic,
        source_file: Option<&SourceFile>,
    ) -> String {
        let mut output = String::new();

        // 1. 位置与消息
        let location = if diagnostic.line > 0 {
            format!("{}:{}", diagnostic.module, diagnostic.line)
        } else {
            diagnostic.module.clone()
        };
        output.push_str(&format!(
            "{}: {} [{}] {}",
            location, diagnostic.severity, diagnostic.code, diagnostic.message
        ));
        if self.config.show_scope && !diagnostic.scope.is_empty() {
            output.push_str(&format!(" (in {})", diagnostic.scope));
        }
        output.push('\n');

        // 2. 源码片段
        if self.config.show_source {
            if let Some(text) = source_file.and_then(|sf| sf.line_text(diagnostic.line)) {
                output.push_str(&format!("    | {}\n", text.trim_end()));
            }
        }

        output
    }

    /// 渲染多个诊断信息
    pub fn render_all<'a>(
        &self,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
        source_files: &[SourceFile],
    ) -> String {
        let mut output = String::new();
        for diagnostic in diagnostics {
            let source_file = source_files.iter().find(|sf| sf.name == diagnostic.module);
            output.push_str(&self.render(diagnostic, source_file));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_source() {
        let file = SourceFile::new("m".to_string(), "a = 1\nb = a.x\n".to_string());
        let diagnostic = Diagnostic::new(Severity::Error, "AttributeError", "no attr x")
            .at("m", 2)
            .in_scope("f");
        let output = DiagnosticRenderer::new().render(&diagnostic, Some(&file));
        assert!(output.contains("m:2: error [AttributeError] no attr x (in f)"));
        assert!(output.contains("| b = a.x"));
    }

    #[test]
    fn test_render_without_scope() {
        let renderer = DiagnosticRenderer::with_config(EmitterConfig {
            show_source: false,
            show_scope: false,
        });
        let diagnostic = Diagnostic::new(Severity::Warning, "KeyError", "k").at("m", 0);
        assert_eq!(renderer.render(&diagnostic, None), "m: warning [KeyError] k\n");
    }
}
