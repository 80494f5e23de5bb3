//! The bundled stub modules

use typeflow::check_source;
use typeflow::util::config::AnalyzerConfig;

fn describe(
    source: &str,
    name: &str,
) -> (String, Vec<String>) {
    let analysis = check_source("m", source, &AnalyzerConfig::default()).unwrap();
    let described = analysis.interp.describe_var("m", name).unwrap();
    let codes = analysis.diagnostics.into_iter().map(|d| d.code).collect();
    (described, codes)
}

#[test]
fn test_stubs_import_cleanly() {
    let source = "import sys, os, os.path, re, string, math, time, random\n";
    let analysis = check_source("m", source, &AnalyzerConfig::default()).unwrap();
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
}

#[test]
fn test_os_path_join() {
    let (ty, codes) = describe("import os\np = os.path.join('a', 'b')\n", "p");
    assert_eq!(ty, "str");
    assert!(codes.is_empty());
}

#[test]
fn test_stub_argument_checked() {
    let (_, codes) = describe("import math\nr = math.sqrt('x')\n", "r");
    assert_eq!(codes, vec!["TypeError".to_string()]);
}

#[test]
fn test_regex_match_may_be_none() {
    let (ty, _) = describe("import re\nm2 = re.match('a', 'abc')\n", "m2");
    assert_eq!(ty, "<MatchObject>|None");
}

#[test]
fn test_sys_exit_raises() {
    let (_, codes) = describe("import sys\nx = sys.exit(1)\n", "x");
    assert_eq!(codes, vec!["SystemExit".to_string()]);
}
