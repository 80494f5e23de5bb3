//! Analysis pipeline
//!
//! Source text is tokenized and parsed into an AST, lowered into the
//! type-flow graph by the inference engine, run to a fixpoint, and finally
//! rendered by the reporter.

pub mod infer;
pub mod lexer;
pub mod parser;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::util::config::AnalyzerConfig;
use crate::util::diagnostic::Diagnostic;
use infer::{Interpreter, RunStats};

/// Outcome of one analysis run
#[derive(Debug)]
pub struct Analysis {
    pub interp: Interpreter,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: RunStats,
}

/// Analysis driver: loads targets into one interpreter, then runs it
#[derive(Debug)]
pub struct Analyzer {
    interp: Interpreter,
}

impl Analyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            interp: Interpreter::new(config),
        }
    }

    /// Load source text as module `name`
    pub fn add_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<()> {
        debug!("adding source module {} ({} bytes)", name, source.len());
        self.interp
            .load_source(name, source)
            .with_context(|| format!("failed to load module {}", name))?;
        Ok(())
    }

    /// Load a target: a `.py` file is the main module, anything else a dotted module name
    pub fn add_target(
        &mut self,
        target: &str,
    ) -> Result<()> {
        if target.ends_with(".py") || target.ends_with(".pyi") {
            let path = Path::new(target);
            self.interp
                .load_main(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        } else {
            self.interp
                .import(target)
                .with_context(|| format!("failed to import {}", target))?;
        }
        Ok(())
    }

    /// Propagate to the fixpoint and collect diagnostics
    pub fn finish(mut self) -> Analysis {
        let stats = self.interp.run();
        let diagnostics = self.interp.diagnostics();
        debug!("{} diagnostics", diagnostics.len());
        Analysis {
            interp: self.interp,
            diagnostics,
            stats,
        }
    }
}
