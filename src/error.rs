//! Compile-time and runtime error types
//!
//! User-level exceptions are not here: they are `Value`s travelling in
//! `Err(Value)` or `Completion::Throw`. These types cover the compiler
//! refusing an input and the runtime being driven out of protocol.

use crate::runtime::TaskStatus;
use crate::syntax::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A construct the transformer cannot compile without changing its meaning
    #[error("unsupported construct at {span}: {construct}")]
    Unsupported { construct: String, span: Span },

    #[error("no builder named '{name}' is registered")]
    UnknownBuilder { name: String },

    #[error("function is not marked for compilation")]
    NotCompiled,
}

impl CompileError {
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        CompileError::Unsupported {
            construct: construct.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// `start`/`complete` out of sequence, or a listener added after completion
    #[error("cannot {operation} a task that is {status}")]
    ProtocolMisuse {
        operation: &'static str,
        status: TaskStatus,
    },

    #[error("no host event loop is running")]
    HostUnavailable,
}
