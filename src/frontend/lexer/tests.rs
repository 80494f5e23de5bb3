use super::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_simple_tokenization() {
    assert_eq!(
        kinds("abc"),
        vec![
            TokenKind::Name("abc".to_string()),
            TokenKind::Newline,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_indent_dedent() {
    let toks = kinds("if x:\n    y\nz\n");
    assert_eq!(
        toks,
        vec![
            TokenKind::Kw(Keyword::If),
            TokenKind::Name("x".to_string()),
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Name("y".to_string()),
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Name("z".to_string()),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_blank_lines_and_comments_do_not_indent() {
    let toks = kinds("def f():\n\n    # comment\n    pass\n");
    let indents = toks.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn test_brackets_join_lines() {
    let toks = kinds("x = [1,\n     2]\n");
    assert!(!toks.contains(&TokenKind::Indent));
    assert_eq!(toks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
}

#[test]
fn test_numbers() {
    assert_eq!(kinds("123")[0], TokenKind::Int(123));
    assert_eq!(kinds("0x1f")[0], TokenKind::Int(31));
    assert_eq!(kinds("017")[0], TokenKind::Int(15));
    assert_eq!(kinds("10L")[0], TokenKind::Long("10".to_string()));
    assert_eq!(kinds("1.5")[0], TokenKind::Float(1.5));
    assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
    assert_eq!(kinds("2j")[0], TokenKind::Imaginary(2.0));
    assert!(matches!(kinds("99999999999999999999")[0], TokenKind::Long(_)));
}

#[test]
fn test_strings() {
    assert_eq!(kinds("'a\\nb'")[0], TokenKind::Str("a\nb".to_string()));
    assert_eq!(kinds("r'a\\nb'")[0], TokenKind::Str("a\\nb".to_string()));
    assert_eq!(kinds("u\"x\"")[0], TokenKind::Unicode("x".to_string()));
    assert_eq!(
        kinds("'''a\nb'''")[0],
        TokenKind::Str("a\nb".to_string())
    );
}

#[test]
fn test_operators() {
    let toks = kinds("a //= b ** c <> d");
    assert_eq!(toks[1], TokenKind::AugAssign("//"));
    assert_eq!(toks[3], TokenKind::DoubleStar);
    assert_eq!(toks[5], TokenKind::NotEq);
}

#[test]
fn test_unterminated_string() {
    assert!(matches!(
        tokenize("'abc"),
        Err(LexError::UnterminatedString { .. })
    ));
}

#[test]
fn test_inconsistent_dedent() {
    let err = tokenize("if x:\n    a\n  b\n").unwrap_err();
    assert_eq!(err, LexError::InconsistentDedent { line: 3 });
    assert_eq!(err.line(), 3);
}

#[test]
fn test_unexpected_char() {
    assert!(matches!(
        tokenize("a $ b"),
        Err(LexError::UnexpectedChar { ch: '$', .. })
    ));
}
