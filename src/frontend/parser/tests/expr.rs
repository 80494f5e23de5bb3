//! Expression parser tests

use crate::frontend::parser::ast::*;
use crate::frontend::parser::parse_expression;

fn expr(source: &str) -> ExprKind {
    parse_expression(source).unwrap().kind
}

#[test]
fn test_parse_literals() {
    assert!(matches!(expr("42"), ExprKind::Const(Constant::Int(42))));
    assert!(matches!(expr("1.5"), ExprKind::Const(Constant::Float(_))));
    assert!(matches!(expr("3j"), ExprKind::Const(Constant::Complex(_))));
    assert!(matches!(expr("10L"), ExprKind::Const(Constant::Long(_))));
}

#[test]
fn test_adjacent_strings_concatenate() {
    match expr("'a' 'b'") {
        ExprKind::Const(Constant::Str(s)) => assert_eq!(s, "ab"),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        expr("'a' u'b'"),
        ExprKind::Const(Constant::Unicode(_))
    ));
}

#[test]
fn test_precedence() {
    // 1 + 2 * 3 => Add(1, Mul(2, 3))
    match expr("1 + 2 * 3") {
        ExprKind::BinOp { op, right, .. } => {
            assert_eq!(op, BinOp::Add);
            assert!(matches!(right.kind, ExprKind::BinOp { op: BinOp::Mul, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_power_binds_tighter_than_unary() {
    match expr("-2 ** 2") {
        ExprKind::UnaryOp { op, operand } => {
            assert_eq!(op, UnaryOp::Neg);
            assert!(matches!(operand.kind, ExprKind::BinOp { op: BinOp::Pow, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_comparison_chain() {
    match expr("a < b is not c not in d") {
        ExprKind::Compare { ops, .. } => {
            let ops: Vec<CmpOp> = ops.into_iter().map(|(op, _)| op).collect();
            assert_eq!(ops, vec![CmpOp::Lt, CmpOp::IsNot, CmpOp::NotIn]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_bool_ops_and_conditional() {
    assert!(matches!(
        expr("a or b or c"),
        ExprKind::BoolOp { op: BoolOp::Or, ref values } if values.len() == 3
    ));
    assert!(matches!(expr("x if c else y"), ExprKind::IfExp { .. }));
    assert!(matches!(
        expr("not a"),
        ExprKind::UnaryOp { op: UnaryOp::Not, .. }
    ));
}

#[test]
fn test_tuple_and_parenthesized() {
    assert!(matches!(expr("()"), ExprKind::Tuple(ref v) if v.is_empty()));
    assert!(matches!(expr("(1,)"), ExprKind::Tuple(ref v) if v.len() == 1));
    assert!(matches!(expr("(1)"), ExprKind::Const(Constant::Int(1))));
    assert!(matches!(expr("1, 2"), ExprKind::Tuple(ref v) if v.len() == 2));
}

#[test]
fn test_displays() {
    assert!(matches!(expr("[1, 2]"), ExprKind::List(ref v) if v.len() == 2));
    assert!(matches!(expr("{}"), ExprKind::Dict(ref v) if v.is_empty()));
    assert!(matches!(expr("{1: 2, 3: 4}"), ExprKind::Dict(ref v) if v.len() == 2));
    assert!(matches!(expr("{1, 2}"), ExprKind::Set(ref v) if v.len() == 2));
    assert!(matches!(expr("`x`"), ExprKind::Backquote(_)));
}

#[test]
fn test_comprehensions() {
    match expr("[x for x in y if x for z in x]") {
        ExprKind::ListComp { generators, .. } => {
            assert_eq!(generators.len(), 2);
            assert_eq!(generators[0].ifs.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(expr("(x for x in y)"), ExprKind::GeneratorExp { .. }));
}

#[test]
fn test_call_arguments() {
    match expr("f(a, b=1, *c, **d)") {
        ExprKind::Call {
            args,
            keywords,
            star,
            dstar,
            ..
        } => {
            assert_eq!(args.len(), 1);
            assert_eq!(keywords.len(), 1);
            assert_eq!(keywords[0].0, "b");
            assert!(star.is_some());
            assert!(dstar.is_some());
        }
        other => panic!("unexpected {:?}", other),
    }
    match expr("sum(x for x in y)") {
        ExprKind::Call { args, .. } => {
            assert!(matches!(args[0].kind, ExprKind::GeneratorExp { .. }))
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_subscripts_and_slices() {
    assert!(matches!(expr("a[0]"), ExprKind::Subscript { .. }));
    assert!(matches!(expr("a[1:2]"), ExprKind::Slice { .. }));
    assert!(matches!(expr("a[:]"), ExprKind::Slice { lower: None, upper: None, .. }));
    match expr("a[::2]") {
        ExprKind::Subscript { index, .. } => {
            assert!(matches!(index.kind, ExprKind::SliceObj { step: Some(_), .. }))
        }
        other => panic!("unexpected {:?}", other),
    }
    match expr("a[1, 2]") {
        ExprKind::Subscript { index, .. } => {
            assert!(matches!(index.kind, ExprKind::Tuple(_)))
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_attribute_chain() {
    match expr("a.b.c") {
        ExprKind::Attribute { value, attr } => {
            assert_eq!(attr, "c");
            assert!(matches!(value.kind, ExprKind::Attribute { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lambda() {
    match expr("lambda x, y=1, *a, **k: x") {
        ExprKind::Lambda { args, .. } => {
            assert_eq!(args.params.len(), 2);
            assert_eq!(args.defaults.len(), 1);
            assert_eq!(args.vararg.as_deref(), Some("a"));
            assert_eq!(args.kwarg.as_deref(), Some("k"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_negative_constant() {
    assert_eq!(parse_expression("-3").unwrap().const_int(), Some(-3));
}

#[test]
fn test_trailing_garbage_rejected() {
    assert!(parse_expression("1 2").is_err());
}
