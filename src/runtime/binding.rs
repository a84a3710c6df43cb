//! Binding adapters: callback-style operations as task-returning functions
//!
//! Two callback conventions are supported. `Standard` callbacks take an
//! error first (`null`/`undefined` meaning success); `Plain` callbacks take
//! only success values. With result names, the success arguments are packed
//! into one object; without, the first one is the result.

use super::task::{Outcome, Task};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::Cell;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    Standard,
    Plain,
}

/// Starts the wrapped operation. An `Err` fails the task.
pub type Operation = Rc<dyn Fn(Vec<Value>, BindingCallback) -> Result<(), Value>>;

/// The completion callback handed to a bound operation. Only the first call counts.
#[derive(Clone)]
pub struct BindingCallback {
    inner: Rc<CallbackInner>,
}

struct CallbackInner {
    task: Task,
    convention: Convention,
    names: Vec<String>,
    fired: Cell<bool>,
}

impl BindingCallback {
    pub fn invoke(&self, args: Vec<Value>) {
        if self.inner.fired.replace(true) {
            warn!(task = self.inner.task.id(), "callback invoked more than once; ignored");
            return;
        }
        let outcome = self.outcome(args);
        let _ = self.inner.task.complete(outcome);
    }

    fn outcome(&self, mut args: Vec<Value>) -> Outcome {
        if self.inner.convention == Convention::Standard {
            let error = if args.is_empty() {
                Value::Undefined
            } else {
                args.remove(0)
            };
            if !error.is_nullish() {
                return Outcome::Failure(error);
            }
        }

        if self.inner.names.is_empty() {
            return Outcome::Success(args.into_iter().next().unwrap_or_default());
        }
        let mut args = args.into_iter();
        let packed: IndexMap<String, Value> = self
            .inner
            .names
            .iter()
            .map(|name| (name.clone(), args.next().unwrap_or_default()))
            .collect();
        Outcome::Success(Value::obj(packed))
    }
}

pub type BoundFunction = Rc<dyn Fn(Vec<Value>) -> Task>;

pub fn bind_operation(
    convention: Convention,
    operation: Operation,
    names: Vec<String>,
) -> BoundFunction {
    let names = Rc::new(names);
    Rc::new(move |args: Vec<Value>| {
        let operation = operation.clone();
        let names = names.clone();
        Task::new(move |task| {
            let callback = BindingCallback {
                inner: Rc::new(CallbackInner {
                    task: task.clone(),
                    convention,
                    names: names.as_ref().clone(),
                    fired: Cell::new(false),
                }),
            };
            if let Err(error) = operation(args, callback.clone()) {
                if !callback.inner.fired.replace(true) {
                    let _ = task.complete(Outcome::Failure(error));
                }
            }
        })
    })
}

pub fn from_standard(operation: Operation, names: Vec<String>) -> BoundFunction {
    bind_operation(Convention::Standard, operation, names)
}

pub fn from_plain(operation: Operation, names: Vec<String>) -> BoundFunction {
    bind_operation(Convention::Plain, operation, names)
}
