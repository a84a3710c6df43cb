//! Builder protocol
//!
//! Compiled code is a tree of [`Step`]s assembled through a [`Builder`].
//! A step is lazy and runs once: `run(ctx, callback)` eventually calls
//! `callback` exactly once with a [`Completion`]. A builder only has to
//! supply `lift` and `start`; everything else defaults to [`base`].

pub mod base;
pub mod sync;

use crate::value::Value;
use std::fmt;
use std::rc::Rc;

pub use sync::SyncBuilder;

/* ===================== Completion ===================== */

/// How a step finished
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(Value),
    Return(Value),
    Throw(Value),
    Break,
    Continue,
}

impl Completion {
    pub fn is_normal(&self) -> bool {
        matches!(self, Completion::Normal(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Completion::Normal(_) => "normal",
            Completion::Return(_) => "return",
            Completion::Throw(_) => "throw",
            Completion::Break => "break",
            Completion::Continue => "continue",
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Normal(v) | Completion::Return(v) | Completion::Throw(v) => {
                write!(f, "{}({})", self.kind(), v)
            }
            _ => write!(f, "{}", self.kind()),
        }
    }
}

/* ===================== Step ===================== */

/// Receives the completion of a step. Called exactly once.
pub type Callback = Box<dyn FnOnce(Completion)>;

pub trait Step {
    fn run(self: Box<Self>, ctx: &Value, callback: Callback);
}

pub type BoxStep = Box<dyn Step>;

/// Building a step may evaluate user code, which may throw
pub type StepResult = Result<BoxStep, Value>;

pub type Thunk = Box<dyn FnOnce() -> StepResult>;
pub type StepFactory = Rc<dyn Fn() -> StepResult>;
pub type KeyedFactory = Rc<dyn Fn(Value) -> StepResult>;
pub type Continuation = Box<dyn FnOnce(Value) -> StepResult>;
pub type CatchHandler = Box<dyn FnOnce(Value) -> StepResult>;
pub type Predicate = Rc<dyn Fn() -> Result<bool, Value>>;
pub type Action = Rc<dyn Fn() -> Result<(), Value>>;

/// A step backed by a closure
pub struct FnStep<F>(F);

impl<F> Step for FnStep<F>
where
    F: FnOnce(&Value, Callback),
{
    fn run(self: Box<Self>, ctx: &Value, callback: Callback) {
        (self.0)(ctx, callback)
    }
}

pub fn step(f: impl FnOnce(&Value, Callback) + 'static) -> BoxStep {
    Box::new(FnStep(f))
}

/* ===================== Builder ===================== */

pub trait Builder {
    /// Name used in the builder table and in emitted source
    fn name(&self) -> &str;

    /// Turn a bound operand into a step
    fn lift(&self, operand: Value) -> BoxStep;

    /// Entry point of a compiled function
    fn start(&self, ctx: Value, root: BoxStep) -> Result<Value, Value>;

    fn bind(&self, operand: Value, k: Continuation) -> BoxStep {
        base::bind(self.lift(operand), k)
    }

    fn delay(&self, thunk: Thunk) -> BoxStep {
        base::delay(thunk)
    }

    fn combine(&self, first: BoxStep, second: BoxStep) -> BoxStep {
        base::combine(first, second)
    }

    fn for_loop(
        &self,
        test: Option<Predicate>,
        update: Option<Action>,
        body: StepFactory,
    ) -> BoxStep {
        base::for_loop(test, update, body)
    }

    fn while_loop(&self, test: Predicate, body: StepFactory) -> BoxStep {
        base::while_loop(test, body)
    }

    fn do_loop(&self, body: StepFactory, test: Predicate) -> BoxStep {
        base::do_loop(body, test)
    }

    fn for_in(&self, object: Value, body: KeyedFactory) -> BoxStep {
        base::for_in(object, body)
    }

    fn try_catch(
        &self,
        body: BoxStep,
        catch: Option<CatchHandler>,
        finally: Option<BoxStep>,
    ) -> BoxStep {
        base::try_catch(body, catch, finally)
    }

    fn return_value(&self, value: Value) -> BoxStep {
        base::return_value(value)
    }

    fn normal(&self) -> BoxStep {
        base::normal()
    }

    fn break_loop(&self) -> BoxStep {
        base::break_loop()
    }

    fn continue_loop(&self) -> BoxStep {
        base::continue_loop()
    }

    fn throw(&self, error: Value) -> BoxStep {
        base::throw(error)
    }
}

#[cfg(test)]
mod tests;
