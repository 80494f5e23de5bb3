//! Token types

use crate::util::span::Span;

/// Lexer error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string starting at {position}")]
    UnterminatedString { position: String },
    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),
    #[error("Unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: String },
    #[error("Unindent does not match any outer indentation level at line {line}")]
    InconsistentDedent { line: usize },
}

impl LexError {
    /// Line the error refers to (0 when unknown)
    pub fn line(&self) -> usize {
        let position = match self {
            LexError::UnterminatedString { position } => position,
            LexError::UnexpectedChar { position, .. } => position,
            LexError::InconsistentDedent { line } => return *line,
            LexError::InvalidNumber(_) => return 0,
        };
        position
            .split(':')
            .next()
            .and_then(|l| l.parse().ok())
            .unwrap_or(0)
    }
}

/// Keywords of the source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    As,
    Assert,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Exec,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Not,
    Or,
    Pass,
    Print,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,
}

impl Keyword {
    /// Look up a keyword by its spelling
    pub fn from_ident(ident: &str) -> Option<Keyword> {
        let kw = match ident {
            "and" => Keyword::And,
            "as" => Keyword::As,
            "assert" => Keyword::Assert,
            "break" => Keyword::Break,
            "class" => Keyword::Class,
            "continue" => Keyword::Continue,
            "def" => Keyword::Def,
            "del" => Keyword::Del,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "except" => Keyword::Except,
            "exec" => Keyword::Exec,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "from" => Keyword::From,
            "global" => Keyword::Global,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "is" => Keyword::Is,
            "lambda" => Keyword::Lambda,
            "not" => Keyword::Not,
            "or" => Keyword::Or,
            "pass" => Keyword::Pass,
            "print" => Keyword::Print,
            "raise" => Keyword::Raise,
            "return" => Keyword::Return,
            "try" => Keyword::Try,
            "while" => Keyword::While,
            "with" => Keyword::With,
            "yield" => Keyword::Yield,
            _ => return None,
        };
        Some(kw)
    }
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Identifiers and keywords
    Name(String),
    Kw(Keyword),

    // Literals
    Int(i64),
    Long(String),
    Float(f64),
    Imaginary(f64),
    Str(String),
    Unicode(String),

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LShift,
    RShift,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    /// Augmented assignment, carrying the binary operator spelling (`+`, `//`, ...)
    AugAssign(&'static str),

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,
    Assign,
    Backquote,
    At,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Check for a specific keyword
    #[inline]
    pub fn is_kw(
        &self,
        kw: Keyword,
    ) -> bool {
        matches!(self, TokenKind::Kw(k) if *k == kw)
    }
}

/// Token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
    ) -> Self {
        Self { kind, span }
    }
}
