//! Lexer module
//!
//! Turns source text into a token stream with synthesized
//! `Newline`/`Indent`/`Dedent` layout tokens.

pub mod tokenizer;
pub mod tokens;

#[cfg(test)]
mod tests;

// Re-export types
pub use tokenizer::Lexer;
pub use tokens::{Keyword, LexError, Token, TokenKind};

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    tracing::trace!("lexing {} bytes", source.len());
    let tokens = Lexer::new(source).tokenize()?;
    tracing::trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}
