//! Integration tests for the `typeflow` binary

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn typeflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typeflow"))
        .args(args)
        .output()
        .unwrap()
}

/// Helper function to create a test file
fn create_test_file(
    dir: &TempDir,
    name: &str,
    content: &str,
) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_report_for_clean_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(
        &temp_dir,
        "clean.py",
        "def double(x):\n    return x * 2\ny = double(21)\n",
    );

    let output = typeflow(&["-D", file.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("module clean"));
    assert!(stdout.contains("y = int"));
    assert!(stdout.contains("def double(x) at clean:1, called from clean:3"));
    assert!(!stdout.contains("! line"));
}

#[test]
fn test_quiet_lists_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(&temp_dir, "bad.py", "x = 1\ny = x.upper()\n");

    let output = typeflow(&["-D", "-q", file.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bad:2: error [AttributeError]"));
    assert!(stdout.contains("| y = x.upper()"));
}

#[test]
fn test_uncertain_needs_flag() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(&temp_dir, "maybe.py", "d = {'a': 1}\nv = d['a']\n");
    let path = file.to_str().unwrap();

    let quiet = typeflow(&["-D", "-q", path]);
    assert!(String::from_utf8_lossy(&quiet.stdout).is_empty());

    let all = typeflow(&["-D", "-q", "-a", path]);
    assert!(String::from_utf8_lossy(&all.stdout).contains("warning [KeyError]"));
}

#[test]
fn test_module_path_flag() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir, "helper.py", "def f():\n    return 'x'\n");
    let main = create_test_file(&temp_dir, "main.py", "import helper\nv = helper.f()\n");

    let output = typeflow(&[
        "-D",
        "-p",
        temp_dir.path().to_str().unwrap(),
        main.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("v = str"));
    assert!(stdout.contains("module helper"));
}

#[test]
fn test_config_override() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(&temp_dir, "imp.py", "import not_there\n");
    let path = file.to_str().unwrap();

    let reported = typeflow(&["-D", "-q", path]);
    assert!(String::from_utf8_lossy(&reported.stdout).contains("ImportError"));

    let silenced = typeflow(&["-D", "-q", "-C", "ignore_import_errors=true", path]);
    assert!(String::from_utf8_lossy(&silenced.stdout).is_empty());
}

#[test]
fn test_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_file(&temp_dir, "typeflow.toml", "raise_uncertain = true\n");
    let file = create_test_file(&temp_dir, "div.py", "def f(a, b):\n    return a / b\nf(1, 2)\n");

    let output = typeflow(&[
        "-D",
        "-q",
        "-c",
        config.to_str().unwrap(),
        file.to_str().unwrap(),
    ]);

    assert!(String::from_utf8_lossy(&output.stdout).contains("ZeroDivisionError"));
}

#[test]
fn test_usage_errors_exit_100() {
    assert_eq!(typeflow(&[]).status.code(), Some(100));
    assert_eq!(typeflow(&["--no-such-flag", "x.py"]).status.code(), Some(100));
    assert_eq!(typeflow(&["-C", "bogus=1", "x.py"]).status.code(), Some(100));
    assert_eq!(typeflow(&["-D", "/nonexistent/dir/x.py"]).status.code(), Some(100));
}

#[test]
fn test_help_succeeds() {
    let output = typeflow(&["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}
