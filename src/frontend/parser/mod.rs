//! Parser module
//!
//! Recursive-descent parser turning the token stream into the
//! [`ast::Module`] consumed by the inference engine.

pub mod ast;
mod expr;
mod parser_state;
mod stmt;

#[cfg(test)]
mod tests;

pub use parser_state::{ParseError, ParseResult, ParserState};

use std::path::Path;

use crate::frontend::lexer::{tokenize, Token};
use ast::*;

/// Parse tokens into a module named `name`
pub fn parse(
    tokens: &[Token],
    name: &str,
) -> ParseResult<Module> {
    let mut state = ParserState::new(tokens);
    let body = state.parse_file_input()?;
    tracing::debug!("parsed module {}: {} statements", name, body.len());
    Ok(Module {
        name: name.to_string(),
        path: None,
        is_stub: false,
        body,
    })
}

/// Lex and parse source text
pub fn parse_source(
    source: &str,
    name: &str,
) -> ParseResult<Module> {
    let tokens = tokenize(source)?;
    parse(&tokens, name)
}

/// Lex and parse source text read from `path`; `.pyi` files are stubs
pub fn parse_file_source(
    source: &str,
    name: &str,
    path: &Path,
) -> ParseResult<Module> {
    let mut module = parse_source(source, name)?;
    module.is_stub = path.extension().is_some_and(|ext| ext == "pyi");
    module.path = Some(path.to_path_buf());
    Ok(module)
}

/// Parse a single expression
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let tokens = tokenize(source)?;
    let mut state = ParserState::new(&tokens);
    let expr = state.parse_testlist()?;
    while state.skip(&crate::frontend::lexer::TokenKind::Newline) {}
    if !state.at_end() {
        return Err(state.unexpected());
    }
    Ok(expr)
}
