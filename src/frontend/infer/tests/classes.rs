//! 类、实例属性与方法绑定

use super::*;

#[test]
fn test_instance_attributes_from_init() {
    let interp = analyze(
        "class P:\n\
         \x20   def __init__(self, x):\n\
         \x20       self.x = x\n\
         p = P(1)\n\
         y = p.x\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "y"), "int");
}

#[test]
fn test_constructor_arity_checked() {
    let diagnostics = diagnostics_of(
        "class P:\n    def __init__(self, x):\n        self.x = x\nP()\n",
    );
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_class_attribute_through_instance() {
    let interp = analyze("class C:\n    k = 'a'\nx = C().k\n");
    assert_eq!(var(&interp, "x"), "str");
}

#[test]
fn test_method_returns_self() {
    let interp = analyze(
        "class C:\n    def me(self): return self\nx = C().me().me()\n",
    );
    assert_eq!(var(&interp, "x"), "<C>");
}

#[test]
fn test_staticmethod_and_classmethod() {
    let interp = analyze(
        "class C:\n\
         \x20   @staticmethod\n\
         \x20   def s(a): return a\n\
         \x20   @classmethod\n\
         \x20   def c(cls): return cls\n\
         x = C.s(1)\n\
         y = C().c()\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int");
    assert_eq!(var(&interp, "y"), "<class C>");
}

#[test]
fn test_property_access() {
    let interp = analyze(
        "class C:\n\
         \x20   @property\n\
         \x20   def p(self): return 1.0\n\
         x = C().p\n",
    );
    assert_eq!(var(&interp, "x"), "float");
}

#[test]
fn test_super_call() {
    let interp = analyze(
        "class A(object):\n\
         \x20   def f(self): return 1\n\
         class B(A):\n\
         \x20   def f(self): return super(B, self).f()\n\
         x = B().f()\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "int");
}

#[test]
fn test_operator_overloading() {
    let interp = analyze(
        "class V:\n\
         \x20   def __add__(self, other): return 'sum'\n\
         x = V() + 1\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "x"), "str");
}

#[test]
fn test_missing_operator_reported() {
    let diagnostics = diagnostics_of("class V: pass\nx = V() + 1\n");
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    assert_eq!(diagnostics[0].code, "TypeError");
}

#[test]
fn test_iteration_protocol() {
    let interp = analyze(
        "class It:\n\
         \x20   def __iter__(self): return self\n\
         \x20   def next(self): return 1\n\
         for v in It(): pass\n",
    );
    assert!(interp.diagnostics().is_empty(), "{:?}", interp.diagnostics());
    assert_eq!(var(&interp, "v"), "int");
}
