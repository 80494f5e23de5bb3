//! 端到端场景

use super::*;
use crate::util::diagnostic::Severity;

#[test]
fn test_method_dispatch_across_inheritance() {
    let interp = analyze(
        "class A:\n    def f(self): return 1\n\
         class B(A):\n    def g(self): return self.f()\n\
         x = B().g()\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int");
}

#[test]
fn test_attribute_not_found() {
    let diagnostics = diagnostics_of("class C: pass\nC().missing\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "AttributeError");
    assert!(diagnostics[0].message.contains("missing"));
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn test_arity_mismatch_with_defaults() {
    let diagnostics = diagnostics_of("def h(a, b=1): return a+b\nh()\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
    assert_eq!(diagnostics[0].message, "too few args: 0 given, 1 required");
}

#[test]
fn test_generator_return() {
    let interp = analyze(
        "def gen():\n    yield 1\n    yield \"x\"\n\
         g = gen()\n\
         for v in g: pass\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "v"), "int|str");
    assert_eq!(var(&interp, "g"), "<generator int|str>");
}

#[test]
fn test_exception_caught() {
    let interp = analyze_uncertain(
        "def p(d):\n\
         \x20   try:\n\
         \x20       return d[\"k\"]\n\
         \x20   except KeyError:\n\
         \x20       return None\n\
         r = p({\"k\": 1})\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "r"), "None|int");
}

#[test]
fn test_key_error_escapes_without_handler() {
    let interp = analyze_uncertain("def p(d):\n    return d['k']\nr = p({'k': 1})\n");
    let diagnostics = interp.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "KeyError");
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_uncertain_suppressed_by_default() {
    assert!(diagnostics_of("d = {'k': 1}\nx = d['k']\n").is_empty());
}

#[test]
fn test_tuple_unpacking_mismatch() {
    let diagnostics = diagnostics_of("(a, b, c) = (1, 2)\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "ValueError");
}

#[test]
fn test_clean_program_has_no_diagnostics() {
    let interp = analyze(
        "def fib(n):\n\
         \x20   if n < 2:\n\
         \x20       return n\n\
         \x20   return fib(n - 1) + fib(n - 2)\n\
         x = fib(10)\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int");
}
