//! Emitters for the continuation tree
//!
//! [`SourceEmitter`] writes the tree back out as source text calling a
//! builder object; [`CompiledFunction`] runs it in memory against a
//! [`Builder`](crate::builder::Builder).

pub mod callable;
pub mod source;

pub use callable::CompiledFunction;
pub use source::SourceEmitter;

#[cfg(test)]
mod tests;
