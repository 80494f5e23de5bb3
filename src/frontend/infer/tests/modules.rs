//! 模块导入

use std::fs;

use super::*;
use crate::frontend::infer::ModuleError;

fn with_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn analyze_in(
    dir: &tempfile::TempDir,
    source: &str,
) -> Interpreter {
    let mut config = config();
    config.module_path.push(dir.path().to_path_buf());
    analyze_with(source, &config)
}

#[test]
fn test_import_module() {
    let dir = with_dir(&[("util.py", "def f(): return 1\n")]);
    let interp = analyze_in(&dir, "import util\nx = util.f()\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int");
}

#[test]
fn test_from_import() {
    let dir = with_dir(&[("util.py", "name = 'n'\n")]);
    let interp = analyze_in(&dir, "from util import name as n\n");
    assert_eq!(var(&interp, "n"), "str");
}

#[test]
fn test_star_import_skips_private() {
    let dir = with_dir(&[("util.py", "a = 1\n_b = 2\n")]);
    let interp = analyze_in(&dir, "from util import *\n");
    assert!(interp.describe_var("m", "a").is_some());
    assert!(interp.describe_var("m", "_b").is_none());
}

#[test]
fn test_package_import() {
    let dir = with_dir(&[
        ("pkg/__init__.py", ""),
        ("pkg/mod.py", "v = 1.5\n"),
    ]);
    let interp = analyze_in(&dir, "import pkg.mod\nx = pkg.mod.v\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "float");
}

#[test]
fn test_stub_preferred_over_source() {
    let dir = with_dir(&[
        ("lib.py", "def f(): return 1\n"),
        ("lib.pyi", "def f(): return ''\n"),
    ]);
    let interp = analyze_in(&dir, "import lib\nx = lib.f()\n");
    assert_eq!(var(&interp, "x"), "str");
}

#[test]
fn test_missing_module_reports_import_error() {
    let diagnostics = diagnostics_of("import nowhere_to_be_found\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "ImportError");
}

#[test]
fn test_import_errors_can_be_silenced() {
    let mut config = config();
    config.ignore_import_errors = true;
    let interp = analyze_with("import nowhere_to_be_found\n", &config);
    assert!(interp.diagnostics().is_empty());
}

#[test]
fn test_missing_name_in_module() {
    let dir = with_dir(&[("util.py", "a = 1\n")]);
    let interp = analyze_in(&dir, "from util import b\n");
    assert_eq!(codes(&interp), vec!["ImportError".to_string()]);
}

#[test]
fn test_circular_import_terminates() {
    let dir = with_dir(&[("a.py", "import b\nx = 1\n"), ("b.py", "import a\ny = a.x\n")]);
    let interp = analyze_in(&dir, "import a\nz = a.x\n");
    assert_eq!(var(&interp, "z"), "int");
}

#[test]
fn test_syntax_error_in_imported_module() {
    let dir = with_dir(&[("broken.py", "def (:\n")]);
    let interp = analyze_in(&dir, "import broken\n");
    assert_eq!(codes(&interp), vec!["ImportError".to_string()]);
}

#[test]
fn test_module_memoized_by_name() {
    let dir = with_dir(&[("util.py", "a = 1\n")]);
    let mut config = config();
    config.module_path.push(dir.path().to_path_buf());
    let mut interp = Interpreter::new(&config);
    let first = interp.import("util").unwrap();
    assert_eq!(interp.import("util").unwrap(), first);
    assert!(matches!(interp.import("utill"), Err(ModuleError::NotFound(_))));
}

#[test]
fn test_errors_in_imported_module_reported_there() {
    let dir = with_dir(&[("bad.py", "x = 1 + 'a'\n")]);
    let interp = analyze_in(&dir, "import bad\n");
    let diagnostics = interp.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].module, "bad");
}
