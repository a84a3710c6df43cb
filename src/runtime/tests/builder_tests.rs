use super::{after, fail, ok, on_loop};
use crate::builder::{base, Builder};
use crate::runtime::{AsyncBuilder, Outcome, Task, TaskStatus};
use crate::value::Value;

fn returning_bound(operand: Value) -> Task {
    let root = AsyncBuilder.bind(operand, Box::new(|value| Ok(base::return_value(value))));
    let started = AsyncBuilder.start(Value::Undefined, root).unwrap();
    started.as_task().expect("start returns a task").clone()
}

#[test]
fn test_start_returns_a_ready_task() {
    let task = returning_bound(Value::Task(Task::settled_with(ok(3.0))));
    assert_eq!(task.status(), TaskStatus::Ready);
    task.start().unwrap();
    assert_eq!(task.result(), Value::Num(3.0));
}

#[test]
fn test_awaiting_a_ready_task_starts_it() {
    on_loop(async {
        let inner = after(20, ok("inner"));
        let task = returning_bound(Value::Task(inner.clone()));
        task.start().unwrap();
        assert_eq!(inner.status(), TaskStatus::Running);
        assert_eq!(task.settled().await, ok("inner"));
    });
}

#[test]
fn test_awaited_failure_fails_the_outer_task() {
    let task = returning_bound(Value::Task(Task::settled_with(fail("inner failed"))));
    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Faulted);
    assert_eq!(task.error(), Value::error("Error", "inner failed"));
}

#[test]
fn test_awaiting_a_non_task_throws() {
    let task = returning_bound(Value::Num(1.0));
    task.start().unwrap();
    let error = task.error();
    assert_eq!(error.as_error().map(|e| e.name.as_str()), Some("TypeError"));
}

#[test]
fn test_normal_completion_succeeds_with_undefined() {
    let task = AsyncBuilder
        .start(Value::Undefined, base::normal())
        .unwrap()
        .as_task()
        .cloned()
        .unwrap();
    task.start().unwrap();
    assert_eq!(task.outcome(), Some(Outcome::Success(Value::Undefined)));
}
