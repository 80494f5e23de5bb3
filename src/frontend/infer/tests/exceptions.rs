//! raise / try / except 与帧间传播

use super::*;

#[test]
fn test_raise_builtin_class_with_message() {
    let diagnostics = diagnostics_of("raise ValueError('bad value')\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "ValueError");
    assert_eq!(diagnostics[0].message, "bad value");
}

#[test]
fn test_raise_comma_form() {
    let diagnostics = diagnostics_of("raise KeyError, 'k'\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "KeyError");
    assert_eq!(diagnostics[0].message, "k");
}

#[test]
fn test_handler_catches_subclass() {
    let diagnostics = diagnostics_of(
        "try:\n    raise KeyError('k')\nexcept LookupError:\n    pass\n",
    );
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_unmatched_handler_forwards() {
    let diagnostics = diagnostics_of(
        "try:\n    raise KeyError('k')\nexcept ValueError:\n    pass\n",
    );
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "KeyError");
}

#[test]
fn test_tuple_of_handler_classes() {
    let diagnostics = diagnostics_of(
        "try:\n    raise KeyError('k')\nexcept (ValueError, KeyError):\n    pass\n",
    );
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_bare_except_catches_everything() {
    let diagnostics = diagnostics_of("try:\n    x = 1 + 'a'\nexcept:\n    pass\n");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_user_exception_class() {
    let interp = analyze(
        "class MyError(Exception): pass\n\
         def f():\n\
         \x20   raise MyError()\n\
         try:\n\
         \x20   f()\n\
         except MyError, e:\n\
         \x20   caught = e\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "caught"), "<MyError>");
}

#[test]
fn test_reraise_in_handler() {
    let diagnostics = diagnostics_of(
        "try:\n    raise KeyError('k')\nexcept KeyError:\n    raise\n",
    );
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "KeyError");
}

#[test]
fn test_bare_raise_outside_handler() {
    let diagnostics = diagnostics_of("raise\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "SyntaxError");
}

#[test]
fn test_raise_non_exception() {
    let diagnostics = diagnostics_of("raise 1\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_exception_propagates_through_calls() {
    let diagnostics = diagnostics_of(
        "def a():\n    raise IOError('io')\ndef b():\n    a()\nb()\n",
    );
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "IOError");
    assert_eq!(diagnostics[0].scope, "a");
}

#[test]
fn test_builtin_exception_attributes_are_opaque() {
    let diagnostics = diagnostics_of(
        "try:\n    pass\nexcept IOError, e:\n    x = e.errno\n",
    );
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn test_bare_raise_runs_constructor() {
    let diagnostics = diagnostics_of(
        "class E(Exception):\n    def __init__(self, a): pass\nraise E\n",
    );
    assert!(
        diagnostics
            .iter()
            .any(|d| d.code == "TypeError" && d.line == 3 && d.message == "too few args: 1 given, 2 required"),
        "{:?}",
        diagnostics
    );
}
