//! Syntax tree the compiler consumes
//!
//! Parsing happens elsewhere. Programs arrive as ESTree-shaped JSON or are
//! built in code, and this module gives them types, precedence rules and a
//! printer.

pub mod ast;
pub mod precedence;
pub mod printer;
pub mod visit;

pub use ast::*;
pub use precedence::Precedence;
pub use printer::{print_expr, print_statements, Printer};

#[cfg(test)]
pub(crate) mod tests;
