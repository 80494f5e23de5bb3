//! 不变量：单调性、驻留、子类关系

use super::*;
use crate::frontend::infer::{NodeId, Value, ValueId};

#[test]
fn test_literal_interned_once_per_site() {
    let interp = analyze("def f():\n    return [1]\na = f()\nb = f()\n");
    let a = interp.module_var("m", "a").unwrap();
    let b = interp.module_var("m", "b").unwrap();
    assert_eq!(interp.node_values(a), interp.node_values(b));
    assert_eq!(interp.node_values(a).len(), 1);
}

#[test]
fn test_distinct_sites_distinct_lists() {
    let interp = analyze("a = [1]\nb = [1]\n");
    let a = interp.module_var("m", "a").unwrap();
    let b = interp.module_var("m", "b").unwrap();
    assert_ne!(interp.node_values(a), interp.node_values(b));
}

#[test]
fn test_bound_method_interned() {
    let interp = analyze(
        "class C:\n    def m(self): pass\nc = C()\nx = c.m\ny = c.m\n",
    );
    let x = interp.module_var("m", "x").unwrap();
    let y = interp.module_var("m", "y").unwrap();
    let xs = interp.node_values(x);
    assert_eq!(xs, interp.node_values(y));
    assert!(matches!(interp.value(xs[0]), Value::BoundMethod { .. }));
}

#[test]
fn test_subclass_after_saturation() {
    let interp = analyze("class A: pass\nclass B(A): pass\nclass C(B): pass\n");
    let class = |name: &str| -> ValueId {
        interp.node_values(interp.module_var("m", name).unwrap())[0]
    };
    assert!(interp.is_subclass(class("C"), class("A")));
    assert!(interp.is_subclass(class("C"), class("C")));
    assert!(!interp.is_subclass(class("A"), class("C")));
}

#[test]
fn test_monotone_growth_across_rounds() {
    let mut interp = Interpreter::new(&config());
    interp
        .load_source("m", "x = []\nx.append(1)\ny = x\n")
        .unwrap();
    let snapshots: Vec<(NodeId, Vec<ValueId>)> = (0..interp.graph().node_count() as u32)
        .map(NodeId)
        .map(|n| (n, interp.node_values(n)))
        .collect();
    interp.run();
    for (node, before) in snapshots {
        let after = interp.node_values(node);
        assert!(before.iter().all(|v| after.contains(v)), "node {} shrank", node);
    }
    assert_eq!(var(&interp, "y"), "[int]");
}

#[test]
fn test_run_is_idempotent() {
    let mut interp = Interpreter::new(&config());
    interp.load_source("m", "x = [1, 'a']\n").unwrap();
    interp.run();
    let first = interp.describe_var("m", "x");
    let stats = interp.run();
    assert_eq!(interp.describe_var("m", "x"), first);
    assert_eq!(stats.rounds, 1);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// 任意整数/字符串字面量序列的列表元素类型是出现过的类型之并
        #[test]
        fn list_elements_are_union(items in proptest::collection::vec(any::<bool>(), 1..8)) {
            let literals: Vec<&str> = items.iter().map(|&s| if s { "'s'" } else { "1" }).collect();
            let source = format!("x = [{}]\n", literals.join(", "));
            let interp = analyze(&source);
            let mut expected = Vec::new();
            if items.iter().any(|&s| !s) {
                expected.push("int");
            }
            if items.iter().any(|&s| s) {
                expected.push("str");
            }
            prop_assert_eq!(var(&interp, "x"), format!("[{}]", expected.join("|")));
        }

        /// 加法链的结果类型取最高的数值等级
        #[test]
        fn numeric_promotion(kinds in proptest::collection::vec(0u8..3, 1..6)) {
            let literals: Vec<&str> = kinds
                .iter()
                .map(|k| match k { 0 => "1", 1 => "1L", _ => "1.0" })
                .collect();
            let source = format!("x = {}\n", literals.join(" + "));
            let interp = analyze(&source);
            let expected = match kinds.iter().max() {
                Some(0) => "int",
                Some(1) => "long",
                _ => "float",
            };
            prop_assert_eq!(var(&interp, "x"), expected);
            prop_assert!(interp.diagnostics().is_empty());
        }
    }
}
