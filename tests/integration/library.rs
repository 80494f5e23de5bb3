//! Library API

use typeflow::util::config::AnalyzerConfig;
use typeflow::util::diagnostic::Severity;
use typeflow::{check_source, check_targets};

fn config() -> AnalyzerConfig {
    AnalyzerConfig {
        use_default_path: false,
        ..AnalyzerConfig::default()
    }
}

#[test]
fn test_check_source_reports_errors() {
    let analysis = check_source("m", "def f(x):\n    return x.foo\nf(1)\n", &config()).unwrap();
    assert_eq!(analysis.diagnostics.len(), 1);
    let diagnostic = &analysis.diagnostics[0];
    assert_eq!(diagnostic.code, "AttributeError");
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!((diagnostic.module.as_str(), diagnostic.line), ("m", 2));
    assert_eq!(diagnostic.scope, "f");
}

#[test]
fn test_check_source_parse_error() {
    let err = check_source("m", "def f(:\n", &config()).unwrap_err();
    assert!(format!("{:#}", err).contains("syntax error"));
}

#[test]
fn test_diagnostics_sorted_and_deduplicated() {
    let source = "def f(a):\n    return a + 'x'\nf(1)\nf(2)\ny = 1 + []\n";
    let analysis = check_source("m", source, &config()).unwrap();
    let lines: Vec<usize> = analysis.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![2, 5]);
}

#[test]
fn test_check_targets_dotted_module() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg").join("__init__.py"), "").unwrap();
    std::fs::write(dir.path().join("pkg").join("core.py"), "x = [].pop(1, 2, 3)\n").unwrap();
    let mut config = config();
    config.module_path.push(dir.path().to_path_buf());

    let analysis = check_targets(&["pkg.core".to_string()], &config).unwrap();
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.diagnostics[0].module, "pkg.core");
    assert!(analysis.stats.deliveries > 0);
}

#[test]
fn test_check_targets_unknown_module() {
    assert!(check_targets(&["nothing.here".to_string()], &config()).is_err());
}
