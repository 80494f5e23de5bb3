//! Tokenizer with indentation tracking

use super::tokens::*;
use crate::util::span::{Position, Span};

/// Width a tab advances the indentation column to (next multiple)
const TAB_WIDTH: usize = 8;

/// Indentation-aware lexer
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
    indents: Vec<usize>,
    paren_depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            paren_depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    /// Current position
    pub fn position(&self) -> Position {
        Position::with_offset(self.line, self.column, self.offset())
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.source.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(
        &self,
        n: usize,
    ) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(
        &mut self,
        kind: TokenKind,
        start: Position,
    ) {
        let end = self.position();
        self.tokens.push(Token::new(kind, Span::new(start, end)));
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start && self.paren_depth == 0 {
                if !self.handle_indentation()? {
                    break;
                }
            }

            let Some(c) = self.peek() else { break };
            let start = self.position();
            match c {
                '\n' => {
                    self.advance();
                    if self.paren_depth == 0 {
                        self.push(TokenKind::Newline, start);
                        self.at_line_start = true;
                    }
                }
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '\\' if matches!(self.peek_at(1), Some('\n')) => {
                    self.advance();
                    self.advance();
                }
                '\\' if self.peek_at(1) == Some('\r') && self.peek_at(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                '"' | '\'' => {
                    let kind = self.lex_string(false, false, start)?;
                    self.push(kind, start);
                }
                c if c.is_ascii_digit() => {
                    let kind = self.lex_number()?;
                    self.push(kind, start);
                }
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    let kind = self.lex_number()?;
                    self.push(kind, start);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let kind = self.lex_name_or_prefixed_string(start)?;
                    self.push(kind, start);
                }
                _ => {
                    let kind = self.lex_operator(start)?;
                    self.push(kind, start);
                }
            }
        }

        let end = self.position();
        if !matches!(
            self.tokens.last().map(|t| &t.kind),
            None | Some(TokenKind::Newline)
        ) {
            self.push(TokenKind::Newline, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end);
        }
        self.push(TokenKind::Eof, end);
        Ok(self.tokens)
    }

    /// Measure leading whitespace and emit INDENT/DEDENT.
    /// Returns false at end of input.
    fn handle_indentation(&mut self) -> Result<bool, LexError> {
        loop {
            let mut width = 0;
            while let Some(c) = self.peek() {
                match c {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.advance();
            }

            match self.peek() {
                None => return Ok(false),
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('\r') if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                _ => {}
            }

            let start = self.position();
            let current = *self.indents.last().unwrap_or(&0);
            if width > current {
                self.indents.push(width);
                self.push(TokenKind::Indent, start);
            } else if width < current {
                while width < *self.indents.last().unwrap_or(&0) {
                    self.indents.pop();
                    self.push(TokenKind::Dedent, start);
                }
                if width != *self.indents.last().unwrap_or(&0) {
                    return Err(LexError::InconsistentDedent { line: self.line });
                }
            }
            self.at_line_start = false;
            return Ok(true);
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_name_or_prefixed_string(
        &mut self,
        start: Position,
    ) -> Result<TokenKind, LexError> {
        let begin = self.offset();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let ident = &self.source[begin..self.offset()];

        if matches!(self.peek(), Some('"') | Some('\'')) {
            let lower = ident.to_ascii_lowercase();
            if matches!(lower.as_str(), "r" | "u" | "b" | "ur" | "br") {
                let raw = lower.contains('r');
                let unicode = lower.contains('u');
                return self.lex_string(raw, unicode, start);
            }
        }

        Ok(match Keyword::from_ident(ident) {
            Some(kw) => TokenKind::Kw(kw),
            None => TokenKind::Name(ident.to_string()),
        })
    }

    fn lex_string(
        &mut self,
        raw: bool,
        unicode: bool,
        start: Position,
    ) -> Result<TokenKind, LexError> {
        let unterminated = || LexError::UnterminatedString {
            position: start.to_string(),
        };
        let quote = self.advance().ok_or_else(unterminated)?;
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();
        loop {
            let c = self.advance().ok_or_else(unterminated)?;
            if c == quote {
                if !triple {
                    break;
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.advance();
                    self.advance();
                    break;
                }
                value.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(unterminated());
            }
            if c == '\\' {
                let escaped = self.advance().ok_or_else(unterminated)?;
                if raw {
                    value.push('\\');
                    value.push(escaped);
                    continue;
                }
                match escaped {
                    '\n' => {}
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    'x' => {
                        let hex: String = (0..2).filter_map(|_| self.advance()).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(ch) => value.push(ch),
                            None => {
                                value.push_str("\\x");
                                value.push_str(&hex);
                            }
                        }
                    }
                    'u' if unicode => {
                        let hex: String = (0..4).filter_map(|_| self.advance()).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(ch) => value.push(ch),
                            None => {
                                value.push_str("\\u");
                                value.push_str(&hex);
                            }
                        }
                    }
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                continue;
            }
            value.push(c);
        }

        Ok(if unicode {
            TokenKind::Unicode(value)
        } else {
            TokenKind::Str(value)
        })
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let begin = self.offset();

        // 十六进制
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = self.source[begin + 2..self.offset()].to_string();
            if matches!(self.peek(), Some('l') | Some('L')) {
                self.advance();
                return Ok(TokenKind::Long(format!("0x{}", digits)));
            }
            return Ok(match i64::from_str_radix(&digits, 16) {
                Ok(n) => TokenKind::Int(n),
                Err(_) if !digits.is_empty() => TokenKind::Long(format!("0x{}", digits)),
                Err(_) => return Err(LexError::InvalidNumber(format!("0x{}", digits))),
            });
        }

        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_or_digit = self.peek_at(1);
            let exponent_follows = match sign_or_digit {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = self.source[begin..self.offset()].to_string();
        let invalid = || LexError::InvalidNumber(text.clone());

        if matches!(self.peek(), Some('j') | Some('J')) {
            self.advance();
            let value: f64 = text.parse().map_err(|_| invalid())?;
            return Ok(TokenKind::Imaginary(value));
        }
        if is_float {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            return Ok(TokenKind::Float(value));
        }
        if matches!(self.peek(), Some('l') | Some('L')) {
            self.advance();
            return Ok(TokenKind::Long(text));
        }

        // 旧式八进制：前导 0
        let parsed = if text.len() > 1 && text.starts_with('0') {
            i64::from_str_radix(&text[1..], 8).or_else(|_| text.parse())
        } else {
            text.parse()
        };
        Ok(match parsed {
            Ok(n) => TokenKind::Int(n),
            Err(_) => TokenKind::Long(text),
        })
    }

    fn lex_operator(
        &mut self,
        start: Position,
    ) -> Result<TokenKind, LexError> {
        let Some(c) = self.advance() else {
            return Ok(TokenKind::Eof);
        };
        let next = self.peek();
        let third = self.peek_at(1);

        let kind = match c {
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LBracket
            }
            '{' => {
                self.paren_depth += 1;
                TokenKind::LBrace
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RParen
            }
            ']' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RBracket
            }
            '}' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RBrace
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            '`' => TokenKind::Backquote,
            '@' => TokenKind::At,
            '~' => TokenKind::Tilde,
            '+' | '-' | '%' | '&' | '|' | '^' if next == Some('=') => {
                self.advance();
                TokenKind::AugAssign(match c {
                    '+' => "+",
                    '-' => "-",
                    '%' => "%",
                    '&' => "&",
                    '|' => "|",
                    _ => "^",
                })
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '%' => TokenKind::Percent,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '*' if next == Some('*') && third == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::AugAssign("**")
            }
            '*' if next == Some('*') => {
                self.advance();
                TokenKind::DoubleStar
            }
            '*' if next == Some('=') => {
                self.advance();
                TokenKind::AugAssign("*")
            }
            '*' => TokenKind::Star,
            '/' if next == Some('/') && third == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::AugAssign("//")
            }
            '/' if next == Some('/') => {
                self.advance();
                TokenKind::DoubleSlash
            }
            '/' if next == Some('=') => {
                self.advance();
                TokenKind::AugAssign("/")
            }
            '/' => TokenKind::Slash,
            '<' if next == Some('<') && third == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::AugAssign("<<")
            }
            '<' if next == Some('<') => {
                self.advance();
                TokenKind::LShift
            }
            '<' if next == Some('=') => {
                self.advance();
                TokenKind::Le
            }
            '<' if next == Some('>') => {
                self.advance();
                TokenKind::NotEq
            }
            '<' => TokenKind::Lt,
            '>' if next == Some('>') && third == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::AugAssign(">>")
            }
            '>' if next == Some('>') => {
                self.advance();
                TokenKind::RShift
            }
            '>' if next == Some('=') => {
                self.advance();
                TokenKind::Ge
            }
            '>' => TokenKind::Gt,
            '=' if next == Some('=') => {
                self.advance();
                TokenKind::EqEq
            }
            '=' => TokenKind::Assign,
            '!' if next == Some('=') => {
                self.advance();
                TokenKind::NotEq
            }
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    position: start.to_string(),
                })
            }
        };
        Ok(kind)
    }
}
