//! typeflow
//!
//! Whole-program type-flow inference and error detection for Python 2
//! style programs. Every expression of the analyzed program becomes a node
//! holding the set of values that may appear there; values propagate along
//! the graph until nothing changes, and the exceptions the program could
//! raise are reported where they escape.
//!
//! # Example
//!
//! ```
//! use typeflow::{check_source, util::config::AnalyzerConfig};
//!
//! let analysis = check_source("demo", "x = [1] + 'a'\n", &AnalyzerConfig::default()).unwrap();
//! assert_eq!(analysis.diagnostics.len(), 1);
//! assert_eq!(analysis.diagnostics[0].code, "TypeError");
//! ```

#![warn(rust_2018_idioms)]

pub mod frontend;
pub mod util;

pub use anyhow::{Context, Result};

pub use frontend::{Analysis, Analyzer};

use tracing::debug;

use crate::util::config::AnalyzerConfig;

/// Tool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "typeflow";

/// Analyze one piece of source text as module `name`
pub fn check_source(
    name: &str,
    source: &str,
    config: &AnalyzerConfig,
) -> Result<Analysis> {
    debug!("check_source({})", name);
    let mut analyzer = Analyzer::new(config);
    analyzer.add_source(name, source)?;
    Ok(analyzer.finish())
}

/// Analyze files (`*.py`) and dotted module names together
pub fn check_targets(
    targets: &[String],
    config: &AnalyzerConfig,
) -> Result<Analysis> {
    debug!("check_targets({:?})", targets);
    let mut analyzer = Analyzer::new(config);
    for target in targets {
        analyzer.add_target(target)?;
    }
    Ok(analyzer.finish())
}
