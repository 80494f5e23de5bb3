//! Statement parser tests

use crate::frontend::parser::ast::*;
use crate::frontend::parser::{parse_source, ParseError};

fn body(source: &str) -> Vec<Stmt> {
    parse_source(source, "__main__").unwrap().body
}

#[test]
fn test_parse_empty_module() {
    assert!(body("").is_empty());
    assert!(body("\n\n# only a comment\n").is_empty());
}

#[test]
fn test_simple_statements_on_one_line() {
    let stmts = body("a = 1; b = 2; pass\n");
    assert_eq!(stmts.len(), 3);
    assert!(matches!(stmts[2].kind, StmtKind::Pass));
}

#[test]
fn test_assignment_chain() {
    let stmts = body("a = b = 3\n");
    match &stmts[0].kind {
        StmtKind::Assign { targets, .. } => assert_eq!(targets.len(), 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_augmented_assignment() {
    let stmts = body("x += 1\n");
    assert!(matches!(
        stmts[0].kind,
        StmtKind::AugAssign { op: BinOp::Add, .. }
    ));
}

#[test]
fn test_invalid_targets() {
    assert!(matches!(
        parse_source("f() = 1\n", "m"),
        Err(ParseError::InvalidTarget { line: 1, .. })
    ));
    assert!(matches!(
        parse_source("(a, b) += 1\n", "m"),
        Err(ParseError::InvalidTarget { .. })
    ));
}

#[test]
fn test_function_definition() {
    let stmts = body("@dec\ndef f(a, (b, c), d=1, *args, **kw):\n    return a\n");
    match &stmts[0].kind {
        StmtKind::FunctionDef(def) => {
            assert_eq!(def.name, "f");
            assert_eq!(def.decorators.len(), 1);
            assert_eq!(def.args.params.len(), 3);
            assert_eq!(def.args.params[1].display(), "(b, c)");
            assert_eq!(def.args.defaults.len(), 1);
            assert_eq!(def.body.len(), 1);
            assert_eq!(def.line, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_class_definition() {
    let stmts = body("class A(B, C):\n    x = 1\n    def m(self): pass\n");
    match &stmts[0].kind {
        StmtKind::ClassDef(def) => {
            assert_eq!(def.bases.len(), 2);
            assert_eq!(def.body.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_if_elif_else_nests() {
    let stmts = body("if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n");
    match &stmts[0].kind {
        StmtKind::If { orelse, .. } => {
            assert_eq!(orelse.len(), 1);
            assert!(matches!(orelse[0].kind, StmtKind::If { ref orelse, .. } if orelse.len() == 1));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_loops_with_else() {
    let stmts = body("for i, j in x:\n    break\nelse:\n    pass\nwhile 1:\n    continue\n");
    assert!(matches!(
        stmts[0].kind,
        StmtKind::For { ref target, ref orelse, .. }
            if matches!(target.kind, ExprKind::Tuple(_)) && orelse.len() == 1
    ));
    assert!(matches!(stmts[1].kind, StmtKind::While { .. }));
}

#[test]
fn test_try_forms() {
    let stmts = body("try:\n    a\nexcept (E, F), e:\n    b\nexcept:\n    c\nelse:\n    d\n");
    match &stmts[0].kind {
        StmtKind::TryExcept {
            handlers, orelse, ..
        } => {
            assert_eq!(handlers.len(), 2);
            assert!(handlers[0].target.is_some());
            assert!(handlers[1].class.is_none());
            assert_eq!(orelse.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    let stmts = body("try:\n    a\nexcept E as e:\n    b\nfinally:\n    c\n");
    match &stmts[0].kind {
        StmtKind::TryFinally { body, finalbody } => {
            assert!(matches!(body[0].kind, StmtKind::TryExcept { .. }));
            assert_eq!(finalbody.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    assert!(parse_source("try:\n    a\nx = 1\n", "m").is_err());
}

#[test]
fn test_raise_print_exec() {
    let stmts = body("raise E, 'msg'\nraise\nprint >>f, a, b,\nprint\nexec code in g, l\n");
    assert!(matches!(
        stmts[0].kind,
        StmtKind::Raise { expt: Some(_), arg: Some(_), traceback: None }
    ));
    assert!(matches!(stmts[1].kind, StmtKind::Raise { expt: None, .. }));
    assert!(matches!(
        stmts[2].kind,
        StmtKind::Print { dest: Some(_), ref values } if values.len() == 2
    ));
    assert!(matches!(stmts[3].kind, StmtKind::Print { dest: None, ref values } if values.is_empty()));
    assert!(matches!(
        stmts[4].kind,
        StmtKind::Exec { globals: Some(_), locals: Some(_), .. }
    ));
}

#[test]
fn test_imports() {
    let stmts = body("import os.path as p, sys\nfrom . import a\nfrom x.y import (b as c, d,)\nfrom m import *\n");
    match &stmts[0].kind {
        StmtKind::Import(aliases) => {
            assert_eq!(aliases[0].name, "os.path");
            assert_eq!(aliases[0].asname.as_deref(), Some("p"));
            assert_eq!(aliases[1].name, "sys");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        stmts[1].kind,
        StmtKind::ImportFrom { level: 1, ref module, .. } if module.is_empty()
    ));
    assert!(matches!(
        stmts[2].kind,
        StmtKind::ImportFrom { ref names, .. } if names.len() == 2
    ));
    assert!(matches!(
        stmts[3].kind,
        StmtKind::ImportFrom { ref names, .. } if names.is_empty()
    ));
}

#[test]
fn test_misc_statements() {
    let stmts = body("global a, b\nassert x, 'm'\ndel a[0], b\nwith f() as g, h:\n    pass\nyield 1\n");
    assert!(matches!(stmts[0].kind, StmtKind::Global(ref n) if n.len() == 2));
    assert!(matches!(stmts[1].kind, StmtKind::Assert { msg: Some(_), .. }));
    assert!(matches!(stmts[2].kind, StmtKind::Delete(ref t) if t.len() == 2));
    match &stmts[3].kind {
        StmtKind::With { target, body, .. } => {
            assert!(target.is_some());
            assert!(matches!(body[0].kind, StmtKind::With { target: None, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        stmts[4].kind,
        StmtKind::Expr(Expr { kind: ExprKind::Yield(Some(_)), .. })
    ));
}

#[test]
fn test_with_items_each_bind_one_target() {
    let stmts = body("with a as x, b as (y, z):\n    pass\n");
    match &stmts[0].kind {
        StmtKind::With { target: Some(outer), body, .. } => {
            assert!(matches!(outer.kind, ExprKind::Name(_)));
            match &body[0].kind {
                StmtKind::With { target: Some(inner), .. } => {
                    assert!(matches!(inner.kind, ExprKind::Tuple(ref t) if t.len() == 2));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_statement_lines() {
    let stmts = body("a = 1\n\nb = 2\n");
    assert_eq!(stmts[0].line, 1);
    assert_eq!(stmts[1].line, 3);
}

#[test]
fn test_lex_error_surfaces() {
    assert!(matches!(
        parse_source("x = 'oops\n", "m"),
        Err(ParseError::Lex(_))
    ));
}
