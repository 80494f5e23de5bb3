//! Text report of an analysis run
//!
//! One block per user module: the module's namespace, the exceptions that
//! reached module scope, then nested blocks for every function and class,
//! indented two spaces per level.

use std::fmt::Write;

use crate::frontend::infer::{FrameId, Interpreter, SpaceId, Value, ValueId};
use crate::util::diagnostic::Diagnostic;

/// Reporter settings
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    /// Upper bound of diagnostics listed per block (0 = unlimited)
    pub max_errors_per_frame: usize,
    /// Include namespace entries and nested definitions
    pub show_types: bool,
}

/// Renders the namespaces and diagnostics held by an [`Interpreter`]
#[derive(Debug)]
pub struct Reporter<'a> {
    interp: &'a Interpreter,
    config: ReportConfig,
    out: String,
}

impl<'a> Reporter<'a> {
    pub fn new(
        interp: &'a Interpreter,
        config: ReportConfig,
    ) -> Self {
        Self {
            interp,
            config,
            out: String::new(),
        }
    }

    /// Render every module that was loaded from source (stubs are skipped)
    pub fn render(mut self) -> String {
        let modules: Vec<ValueId> = self
            .interp
            .loaded_modules()
            .filter(|(_, m)| self.interp.module_obj(*m).is_some_and(|m| !m.is_stub))
            .map(|(_, m)| m)
            .collect();
        for module in modules {
            self.module_block(module);
        }
        self.out
    }

    fn line(
        &mut self,
        depth: usize,
        text: &str,
    ) {
        let _ = writeln!(self.out, "{:indent$}{}", "", text, indent = depth * 2);
    }

    fn module_block(
        &mut self,
        module: ValueId,
    ) {
        let Some(obj) = self.interp.module_obj(module) else {
            return;
        };
        let (space, frame) = (obj.space, obj.frame);
        let header = match &obj.path {
            Some(path) => format!("module {} ({})", obj.name, path.display()),
            None => format!("module {}", obj.name),
        };
        self.line(0, &header);
        if self.config.show_types {
            self.namespace(1, space);
        }
        self.errors(1, frame);
        self.definitions(1, space);
        self.out.push('\n');
    }

    /// `name = description` for each variable, skipping module dunders
    fn namespace(
        &mut self,
        depth: usize,
        space: SpaceId,
    ) {
        let entries: Vec<String> = self
            .interp
            .space(space)
            .vars
            .iter()
            .filter(|(name, _)| !(name.starts_with("__") && name.ends_with("__")))
            .map(|(name, &node)| format!("{} = {}", name, self.interp.describe_node(node)))
            .collect();
        for entry in entries {
            self.line(depth, &entry);
        }
    }

    fn errors(
        &mut self,
        depth: usize,
        frame: FrameId,
    ) {
        let diagnostics = self.interp.frame_diagnostics(frame);
        let limit = match self.config.max_errors_per_frame {
            0 => diagnostics.len(),
            n => n.min(diagnostics.len()),
        };
        for diagnostic in &diagnostics[..limit] {
            self.line(depth, &format_diagnostic(diagnostic));
        }
        if limit < diagnostics.len() {
            self.line(depth, &format!("! ... {} more", diagnostics.len() - limit));
        }
    }

    fn definitions(
        &mut self,
        depth: usize,
        space: SpaceId,
    ) {
        let defs = self.interp.space(space).defs.clone();
        for def in defs {
            match self.interp.value(def) {
                Value::Function(_) => self.function_block(depth, def),
                Value::Class(_) => self.class_block(depth, def),
                _ => {}
            }
        }
    }

    fn function_block(
        &mut self,
        depth: usize,
        func: ValueId,
    ) {
        let interp = self.interp;
        let Some(f) = interp.func_obj(func) else {
            return;
        };
        let mut header = format!("def {} at {}:{}", f.signature(), f.module, f.line);
        if !f.callers.is_empty() {
            let callers: Vec<String> = f
                .callers
                .iter()
                .map(|(module, line)| format!("{}:{}", module, line))
                .collect();
            let _ = write!(header, ", called from {}", callers.join(", "));
        }
        let (space, frame, body) = (f.space, f.frame, f.body);
        self.line(depth, &header);
        if self.config.show_types {
            let returns = format!("return {}", self.interp.describe_node(body));
            self.line(depth + 1, &returns);
            self.namespace(depth + 1, space);
        }
        self.errors(depth + 1, frame);
        self.definitions(depth + 1, space);
    }

    fn class_block(
        &mut self,
        depth: usize,
        class: ValueId,
    ) {
        let interp = self.interp;
        let Value::Class(c) = interp.value(class) else {
            return;
        };
        let (space, instance) = (c.space, c.instance);
        let header = format!("class {} at {}:{}", c.qualname, c.module, c.line);
        self.line(depth, &header);
        if self.config.show_types {
            self.namespace(depth + 1, space);
            if let Value::Instance(inst) = interp.value(instance) {
                for (name, &node) in &inst.attrs {
                    let attr = format!("self.{} = {}", name, interp.describe_node(node));
                    self.line(depth + 1, &attr);
                }
            }
        }
        self.definitions(depth + 1, space);
    }
}

/// `! line N: Class: message` (uncertain diagnostics are marked with `?`)
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let mark = if diagnostic.severity.is_error() { '!' } else { '?' };
    format!("{} line {}: {}", mark, diagnostic.line, diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::AnalyzerConfig;

    fn report(source: &str) -> String {
        let config = AnalyzerConfig {
            use_default_path: false,
            ..AnalyzerConfig::default()
        };
        let mut interp = Interpreter::new(&config);
        interp.load_source("m", source).unwrap();
        interp.run();
        Reporter::new(
            &interp,
            ReportConfig {
                show_types: true,
                ..ReportConfig::default()
            },
        )
        .render()
    }

    #[test]
    fn test_module_namespace_listed() {
        let out = report("x = 1\n");
        assert!(out.starts_with("module m\n"));
        assert!(out.contains("  x = int\n"));
        assert!(!out.contains("__name__"));
    }

    #[test]
    fn test_function_block_nested() {
        let out = report("def f(a, b=1):\n    return a\nf('s')\n");
        assert!(out.contains("  def f(a, b=...) at m:1, called from m:3\n"));
        assert!(out.contains("    return str\n"));
    }

    #[test]
    fn test_class_shows_instance_attributes() {
        let out = report(
            "class P:\n    def __init__(self):\n        self.v = 1.0\np = P()\n",
        );
        assert!(out.contains("  class P at m:1\n"));
        assert!(out.contains("    self.v = float\n"));
        assert!(out.contains("    def __init__(self) at m:2"));
    }

    #[test]
    fn test_errors_listed_under_module() {
        let out = report("x = 1 + 'a'\n");
        assert!(out.contains("  ! line 1: TypeError: unsupported operand"));
    }

    #[test]
    fn test_error_limit() {
        let config = AnalyzerConfig {
            use_default_path: false,
            ..AnalyzerConfig::default()
        };
        let mut interp = Interpreter::new(&config);
        interp
            .load_source("m", "a = 1 + 'a'\nb = 2 + 'b'\nc = 3 + []\n")
            .unwrap();
        interp.run();
        let out = Reporter::new(
            &interp,
            ReportConfig {
                max_errors_per_frame: 1,
                show_types: false,
            },
        )
        .render();
        assert!(out.contains("! ... 2 more"));
    }
}
