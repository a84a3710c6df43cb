//! Reference host evaluator
//!
//! Gives `Raw` fragments and header expressions their native meaning while
//! compiled code runs, and runs whole programs around compiled functions.

pub mod control;
pub mod env;
pub mod expressions;
pub mod statements;
pub mod stdlib;

pub use control::{Control, EvalResult};
pub use env::Env;
pub use expressions::{assign_target, call_function, eval};
pub use statements::{exec_block, exec_stmt, hoist};

use crate::compiler::Compiler;
use crate::syntax::{Expr, Program};
use crate::value::Value;
use std::rc::Rc;

/// Everything a running function body needs: its scope, `this` and the compiler
/// for marked function literals it creates
#[derive(Clone)]
pub struct Activation {
    pub env: Env,
    pub this: Value,
    pub compiler: Rc<Compiler>,
}

impl Activation {
    pub fn new(env: Env, this: Value, compiler: Rc<Compiler>) -> Self {
        Self { env, this, compiler }
    }
}

pub struct Interpreter {
    compiler: Rc<Compiler>,
    globals: Env,
}

impl Interpreter {
    /// An interpreter with the standard globals installed
    pub fn new(compiler: Rc<Compiler>) -> Self {
        Self {
            compiler,
            globals: stdlib::global_env(),
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn define(&self, name: &str, value: Value) {
        env::define(&self.globals, name, value);
    }

    pub fn compiler(&self) -> &Rc<Compiler> {
        &self.compiler
    }

    /// Run a program in a fresh top-level scope. A top-level `return` ends it with that value.
    pub fn run(&self, program: &Program) -> EvalResult {
        let scope = env::new_env(Some(self.globals.clone()));
        let activation = Activation::new(scope, Value::Undefined, self.compiler.clone());
        hoist(&program.body, &activation);
        match exec_block(&program.body, &activation) {
            Control::None => Ok(Value::Undefined),
            Control::Return(value) => Ok(value),
            Control::Throw(error) => Err(error),
            Control::Break(_) | Control::Continue(_) => {
                Err(Value::syntax_error("break or continue outside of a loop"))
            }
        }
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult {
        let scope = env::new_env(Some(self.globals.clone()));
        eval(expr, &Activation::new(scope, Value::Undefined, self.compiler.clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests;
