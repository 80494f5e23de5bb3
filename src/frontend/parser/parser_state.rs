//! Parser state and error handling

use crate::frontend::lexer::tokens::*;
use crate::util::span::Span;

/// Parse error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Expected a specific token
    #[error("line {line}: expected {expected}, found {found:?}")]
    ExpectedToken {
        expected: String,
        found: TokenKind,
        line: usize,
    },
    /// Unexpected token encountered
    #[error("line {line}: unexpected token {found:?}")]
    UnexpectedToken { found: TokenKind, line: usize },
    /// Invalid assignment or deletion target
    #[error("line {line}: can't assign to {what}")]
    InvalidTarget { what: String, line: usize },
    /// Lexer failure
    #[error(transparent)]
    Lex(#[from] crate::frontend::lexer::LexError),
}

impl ParseError {
    /// Line the error refers to
    pub fn line(&self) -> usize {
        match self {
            ParseError::ExpectedToken { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::InvalidTarget { line, .. } => *line,
            ParseError::Lex(e) => e.line(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser state
pub struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ParserState<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Kind of the current token (`Eof` past the end)
    pub fn kind(&self) -> &TokenKind {
        self.current().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    pub fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub fn span(&self) -> Span {
        self.current().map(|t| t.span).unwrap_or(Span::dummy())
    }

    /// Line of the current token
    pub fn line(&self) -> usize {
        self.span().line()
    }

    pub fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    pub fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.kind() == kind
    }

    pub fn at_kw(
        &self,
        kw: Keyword,
    ) -> bool {
        self.kind().is_kw(kw)
    }

    pub fn skip(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn skip_kw(
        &mut self,
        kw: Keyword,
    ) -> bool {
        if self.at_kw(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn expect(
        &mut self,
        kind: &TokenKind,
    ) -> ParseResult<()> {
        if self.skip(kind) {
            Ok(())
        } else {
            Err(self.expected(&format!("{:?}", kind)))
        }
    }

    pub fn expect_kw(
        &mut self,
        kw: Keyword,
    ) -> ParseResult<()> {
        if self.skip_kw(kw) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{:?}'", kw).to_lowercase()))
        }
    }

    pub fn expect_name(&mut self) -> ParseResult<String> {
        match self.kind().clone() {
            TokenKind::Name(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.expected("identifier")),
        }
    }

    /// Build an "expected X" error at the current token
    pub fn expected(
        &self,
        what: &str,
    ) -> ParseError {
        ParseError::ExpectedToken {
            expected: what.to_string(),
            found: self.kind().clone(),
            line: self.line(),
        }
    }

    pub fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.kind().clone(),
            line: self.line(),
        }
    }
}
