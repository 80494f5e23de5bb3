//! typeflow - CLI

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use typeflow::frontend::report::{ReportConfig, Reporter};
use typeflow::util::config::{split_path_list, AnalyzerConfig};
use typeflow::util::diagnostic::{DiagnosticRenderer, EmitterConfig};
use typeflow::util::logger::{self, LogLevel};
use typeflow::util::span::SourceFile;
use typeflow::{check_targets, Analysis, NAME, VERSION};

/// Exit status for bad command lines, configuration and targets
const USAGE_ERROR: u8 = 100;

/// Whole-program type inference and error detection for Python 2 style programs
#[derive(Parser, Debug)]
#[command(name = NAME)]
#[command(version = VERSION)]
#[command(about, long_about = None)]
struct Args {
    /// Files (`*.py`) or dotted module names to analyze
    #[arg(value_name = "TARGET", required = true)]
    targets: Vec<String>,

    /// Increase debug output (repeatable)
    #[arg(short = 'd', action = ArgAction::Count)]
    debug: u8,

    /// Only list diagnostics
    #[arg(short, long)]
    quiet: bool,

    /// Also report uncertain ("maybe") diagnostics
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Load configuration from a TOML file
    #[arg(short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override one configuration key
    #[arg(short = 'C', value_name = "KEY=VAL")]
    overrides: Vec<String>,

    /// Do not search the default paths
    #[arg(short = 'D')]
    no_default_path: bool,

    /// Extend the module path (colon separated)
    #[arg(short = 'p', value_name = "PATH")]
    module_path: Vec<String>,

    /// Extend the stub path (colon separated)
    #[arg(short = 'P', value_name = "PATH")]
    stub_path: Vec<String>,
}

impl Args {
    /// Defaults, then the config file, then `-C` overrides, then flags
    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::load(path)
                .with_context(|| format!("cannot load config {}", path.display()))?,
            None => AnalyzerConfig::default(),
        };
        for assignment in &self.overrides {
            config.apply_override(assignment)?;
        }
        if self.all {
            config.raise_uncertain = true;
        }
        if self.no_default_path {
            config.use_default_path = false;
        }
        for path in &self.module_path {
            config.module_path.extend(split_path_list(path));
        }
        for path in &self.stub_path {
            config.stub_path.extend(split_path_list(path));
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(USAGE_ERROR);
        }
    };
    logger::init_with_level(LogLevel::from_verbosity(args.quiet, args.debug));

    let config = match args.analyzer_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", NAME, e);
            return ExitCode::from(USAGE_ERROR);
        }
    };
    let analysis = match check_targets(&args.targets, &config) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("{}: {:#}", NAME, e);
            return ExitCode::from(USAGE_ERROR);
        }
    };

    if args.quiet {
        print!("{}", render_diagnostics(&analysis));
    } else {
        let report = Reporter::new(
            &analysis.interp,
            ReportConfig {
                max_errors_per_frame: config.max_errors_per_frame,
                show_types: true,
            },
        );
        print!("{}", report.render());
    }
    ExitCode::SUCCESS
}

/// Flat diagnostic list with source lines where the module file is readable
fn render_diagnostics(analysis: &Analysis) -> String {
    let sources: Vec<SourceFile> = analysis
        .interp
        .loaded_modules()
        .filter_map(|(name, module)| {
            let path = analysis.interp.module_obj(module)?.path.clone()?;
            let text = fs::read_to_string(path).ok()?;
            Some(SourceFile::new(name.to_string(), text))
        })
        .collect();
    DiagnosticRenderer::with_config(EmitterConfig::default())
        .render_all(&analysis.diagnostics, &sources)
}
