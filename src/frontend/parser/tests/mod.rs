//! Parser tests module

mod expr;
mod stmt;
