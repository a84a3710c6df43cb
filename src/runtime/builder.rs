//! The async builder: bind points await tasks, compiled functions return tasks

use super::task::{Outcome, Task, TaskStatus};
use crate::builder::{base, step, BoxStep, Builder, Callback, Completion};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub const ASYNC_BUILDER: &str = "async";

#[derive(Debug, Default, Clone, Copy)]
pub struct AsyncBuilder;

impl Builder for AsyncBuilder {
    fn name(&self) -> &str {
        ASYNC_BUILDER
    }

    fn lift(&self, operand: Value) -> BoxStep {
        match operand {
            Value::Task(task) => step(move |_, callback| await_task(task, callback)),
            other => base::throw(Value::type_error(format!(
                "only tasks can be awaited, got {}",
                other.type_of()
            ))),
        }
    }

    /// The returned task is ready; starting it runs the function body
    fn start(&self, ctx: Value, root: BoxStep) -> Result<Value, Value> {
        let task = Task::new(move |task| {
            let task = task.clone();
            root.run(
                &ctx,
                Box::new(move |completion| {
                    let outcome = match completion {
                        Completion::Normal(_) => Outcome::Success(Value::Undefined),
                        Completion::Return(value) => Outcome::Success(value),
                        Completion::Throw(error) => Outcome::Failure(error),
                        Completion::Break | Completion::Continue => Outcome::Failure(
                            Value::syntax_error("break or continue escaped the function body"),
                        ),
                    };
                    let _ = task.complete(outcome);
                }),
            )
        });
        debug!(task = task.id(), "async function invoked");
        Ok(Value::Task(task))
    }
}

fn await_task(task: Task, callback: Callback) {
    if task.status() == TaskStatus::Ready {
        let _ = task.start();
    }
    if task.is_completed() {
        return callback(completion_of(&task));
    }

    let pending = Rc::new(RefCell::new(Some(callback)));
    let resume = pending.clone();
    let registered = task.on_complete(move |task| {
        let callback = resume.borrow_mut().take();
        if let Some(callback) = callback {
            callback(completion_of(task));
        }
    });
    if let Err(err) = registered {
        let callback = pending.borrow_mut().take();
        if let Some(callback) = callback {
            callback(Completion::Throw(Value::error("Error", err.to_string())));
        }
    }
}

fn completion_of(task: &Task) -> Completion {
    match task.outcome() {
        Some(Outcome::Success(value)) => Completion::Normal(value),
        Some(Outcome::Failure(error)) => Completion::Throw(error),
        None => Completion::Throw(Value::error("Error", "awaited task has not settled")),
    }
}
