//! 调用：实参绑定、关键字、可变参数、闭包

use super::*;

#[test]
fn test_too_many_args() {
    let diagnostics = diagnostics_of("def f(a): return a\nf(1, 2)\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].message, "too many args: 2 given, 1 allowed");
}

#[test]
fn test_keyword_binding() {
    let interp = analyze("def f(a, b=None): return b\nx = f(1, b='s')\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "None|str");
}

#[test]
fn test_invalid_keyword() {
    let diagnostics = diagnostics_of("def f(a): return a\nf(1, c=2)\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert!(diagnostics[0].message.contains("c"));
}

#[test]
fn test_varargs_collect_extra_positionals() {
    let interp = analyze("def f(*args): return args\nx = f(1, 'a')\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "(int|str, ...)");
}

#[test]
fn test_kwargs_collect_extra_keywords() {
    let interp = analyze("def f(**kw): return kw\nx = f(a=1)\n");
    assert_eq!(var(&interp, "x"), "{str: int}");
}

#[test]
fn test_call_non_callable() {
    let diagnostics = diagnostics_of("x = 1\nx()\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
    assert!(diagnostics[0].message.starts_with("not callable"));
}

#[test]
fn test_closure_sees_enclosing_names() {
    let interp = analyze(
        "def outer():\n\
         \x20   y = 'a'\n\
         \x20   def inner():\n\
         \x20       return y\n\
         \x20   return inner()\n\
         x = outer()\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "str");
}

#[test]
fn test_lambda_call() {
    let interp = analyze("f = lambda a: [a]\nx = f(1)\n");
    assert_eq!(var(&interp, "x"), "[int]");
}

#[test]
fn test_implicit_none_return() {
    let interp = analyze("def f():\n    pass\nx = f()\n");
    assert_eq!(var(&interp, "x"), "None");
}

#[test]
fn test_errors_in_uncalled_function_reported() {
    let diagnostics = diagnostics_of("def f():\n    return 1 + 'a'\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].scope, "f");
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn test_callee_error_reaches_caller_module() {
    let diagnostics = diagnostics_of("def f(a):\n    return a + 1\nf('s')\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn test_undefined_name() {
    let diagnostics = diagnostics_of("x = y\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "NameError");
}

#[test]
fn test_global_declaration() {
    let interp = analyze("x = 1\ndef f():\n    global x\n    x = 'a'\nf()\n");
    assert_eq!(var(&interp, "x"), "int|str");
}

#[test]
fn test_star_tuple_overflows_params() {
    let diagnostics = diagnostics_of("def f(a, b): return a\nf(*(1, 2, 3))\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
    assert_eq!(diagnostics[0].message, "too many args: 3 given, 2 allowed");
}

#[test]
fn test_star_tuple_spills_into_varargs() {
    let interp = analyze("def f(a, *rest): return rest\nx = f(*(1, 'a', 'b'))\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "(str, ...)");
}

#[test]
fn test_dstar_fills_defaulted_params() {
    let interp = analyze("def f(a, b=1): return b\nx = f(**{'a': 's'})\n");
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int|str");
}
