pub mod builder;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod runtime;
pub mod syntax;
pub mod transform;
pub mod value;

// Re-export main types
pub use builder::{Builder, Completion, Step};
pub use compiler::{BuilderTable, Compiler, CompilerConfig};
pub use config::Settings;
pub use error::{CompileError, RuntimeError};
pub use interpreter::Interpreter;
pub use runtime::{CancellationToken, Task, TaskStatus};
pub use transform::{transform, WindNode};
pub use value::Value;
