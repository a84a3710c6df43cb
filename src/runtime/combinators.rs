//! whenAll / whenAny over lists or keyed maps of tasks

use super::task::{Outcome, Task, TaskStatus};
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// Input of the combinators; the shape of the `when_all` result follows it
#[derive(Debug, Clone)]
pub enum TaskSet {
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl TaskSet {
    /// Script-level arguments: a single list or object is the set itself,
    /// anything else is a variadic list
    pub fn from_args(args: Vec<Value>) -> TaskSet {
        if args.len() == 1 {
            match &args[0] {
                Value::List(items) => return TaskSet::List(items.borrow().clone()),
                Value::Obj(map) => return TaskSet::Map(map.borrow().clone()),
                _ => {}
            }
        }
        TaskSet::List(args)
    }

    pub fn len(&self) -> usize {
        match self {
            TaskSet::List(items) => items.len(),
            TaskSet::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (key, value) pairs in definition order. List keys are indices.
    fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            TaskSet::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::Num(i as f64), v.clone()))
                .collect(),
            TaskSet::Map(map) => map
                .iter()
                .map(|(k, v)| (Value::str(k.clone()), v.clone()))
                .collect(),
        }
    }

    /// Rebuild the same shape around `values`, in entry order
    fn reshape(&self, values: Vec<Value>) -> Value {
        match self {
            TaskSet::List(_) => Value::list(values),
            TaskSet::Map(map) => Value::obj(map.keys().cloned().zip(values).collect()),
        }
    }
}

/* ===================== whenAll ===================== */

/// A ready task that waits for every task in `set`.
///
/// Succeeds with the same-shaped results; non-task entries pass through.
/// Fails with an `AggregateError` of every child error in settlement order.
pub fn when_all(set: TaskSet) -> Task {
    Task::new(move |task| {
        let entries = set.entries();
        if entries.is_empty() {
            let _ = task.complete(Outcome::Success(set.reshape(Vec::new())));
            return;
        }

        let results = Rc::new(RefCell::new(
            entries
                .iter()
                .map(|(_, v)| match v {
                    Value::Task(_) => Value::Undefined,
                    other => other.clone(),
                })
                .collect::<Vec<_>>(),
        ));
        let errors = Rc::new(RefCell::new(Vec::new()));
        // one extra count held until every child is wired up
        let pending = Rc::new(Cell::new(1usize));
        let set = Rc::new(set);

        let finish = {
            let task = task.clone();
            let results = results.clone();
            let errors = errors.clone();
            let pending = pending.clone();
            let set = set.clone();
            Rc::new(move || {
                pending.set(pending.get() - 1);
                if pending.get() > 0 {
                    return;
                }
                let errors = std::mem::take(&mut *errors.borrow_mut());
                let outcome = if errors.is_empty() {
                    Outcome::Success(set.reshape(results.borrow().clone()))
                } else {
                    debug!(task = task.id(), failed = errors.len(), "whenAll failed");
                    Outcome::Failure(Value::aggregate_error(errors))
                };
                let _ = task.complete(outcome);
            })
        };

        for (index, (_, value)) in entries.into_iter().enumerate() {
            let Value::Task(child) = value else { continue };
            pending.set(pending.get() + 1);

            let record = {
                let results = results.clone();
                let errors = errors.clone();
                let finish = finish.clone();
                move |child: &Task| {
                    match child.outcome() {
                        Some(Outcome::Success(v)) => results.borrow_mut()[index] = v,
                        Some(Outcome::Failure(e)) => errors.borrow_mut().push(e),
                        None => {}
                    }
                    finish();
                }
            };

            if child.is_completed() {
                record(&child);
                continue;
            }
            if let Err(err) = child.on_complete(record) {
                errors.borrow_mut().push(Value::error("Error", err.to_string()));
                finish();
                continue;
            }
            if child.status() == TaskStatus::Ready {
                let _ = child.start();
            }
        }
        finish();
    })
}

/* ===================== whenAny ===================== */

/// A ready task that resolves to `{key, task}` for the first task to settle.
///
/// Already settled inputs win synchronously, first in definition order.
/// Every other task is pre-observed so its failure is never reported as
/// unobserved.
pub fn when_any(set: TaskSet) -> Task {
    Task::new(move |task| {
        let entries = set.entries();
        if entries.is_empty() {
            let _ = task.complete(Outcome::Failure(Value::range_error(
                "whenAny requires at least one task",
            )));
            return;
        }

        let mut tasks = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match value {
                Value::Task(child) => tasks.push((key, child)),
                other => {
                    let _ = task.complete(Outcome::Failure(Value::type_error(format!(
                        "whenAny expects tasks, got {}",
                        other.type_of()
                    ))));
                    return;
                }
            }
        }
        let tasks = Rc::new(tasks);

        if let Some(index) = tasks.iter().position(|(_, child)| child.is_completed()) {
            observe_others(&tasks, index);
            let (key, child) = &tasks[index];
            let _ = task.complete(Outcome::Success(winner(key, child)));
            return;
        }

        let done = Rc::new(Cell::new(false));
        let ids = Rc::new(RefCell::new(Vec::new()));
        for (index, (key, child)) in tasks.iter().enumerate() {
            let listener = {
                let task = task.clone();
                let tasks = tasks.clone();
                let done = done.clone();
                let ids = ids.clone();
                let key = key.clone();
                move |child: &Task| {
                    if done.replace(true) {
                        return;
                    }
                    observe_others(&tasks, index);
                    for (other, (_, other_task)) in tasks.iter().enumerate() {
                        if other != index {
                            if let Some(id) = ids.borrow().get(other).copied().flatten() {
                                other_task.remove_listener(id);
                            }
                        }
                    }
                    let _ = task.complete(Outcome::Success(winner(&key, child)));
                }
            };
            let id = child.on_complete(listener).ok();
            ids.borrow_mut().push(id);
        }

        for (_, child) in tasks.iter() {
            if done.get() {
                break;
            }
            if child.status() == TaskStatus::Ready {
                let _ = child.start();
            }
        }
    })
}

fn winner(key: &Value, task: &Task) -> Value {
    let mut entry = IndexMap::new();
    entry.insert("key".to_string(), key.clone());
    entry.insert("task".to_string(), Value::Task(task.clone()));
    Value::obj(entry)
}

fn observe_others(tasks: &[(Value, Task)], winner: usize) {
    for (index, (_, task)) in tasks.iter().enumerate() {
        if index != winner {
            task.observe();
        }
    }
}
