use super::{fail, manual, ok};
use crate::error::RuntimeError;
use crate::runtime::{Outcome, Task, TaskEvent, TaskStatus};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_task_lifecycle() {
    let task = manual();
    assert_eq!(task.status(), TaskStatus::Ready);

    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Running);
    assert!(task.outcome().is_none());

    task.complete(ok(5.0)).unwrap();
    assert_eq!(task.status(), TaskStatus::Succeeded);
    assert!(task.is_completed());
    assert_eq!(task.result(), Value::Num(5.0));
}

#[test]
fn test_start_twice_is_misuse() {
    let task = manual();
    task.start().unwrap();
    assert_eq!(
        task.start(),
        Err(RuntimeError::ProtocolMisuse {
            operation: "start",
            status: TaskStatus::Running,
        })
    );
}

#[test]
fn test_complete_requires_running() {
    let task = manual();
    assert!(matches!(
        task.complete(ok(1.0)),
        Err(RuntimeError::ProtocolMisuse {
            operation: "complete",
            status: TaskStatus::Ready,
        })
    ));

    task.start().unwrap();
    task.complete(ok(1.0)).unwrap();
    assert!(task.complete(ok(2.0)).is_err());
    assert_eq!(task.result(), Value::Num(1.0));
}

#[test]
fn test_cancellation_error_cancels_instead_of_faulting() {
    let canceled = manual();
    canceled.start().unwrap();
    canceled
        .complete(Outcome::Failure(Value::cancellation_error()))
        .unwrap();
    assert_eq!(canceled.status(), TaskStatus::Canceled);

    let faulted = manual();
    faulted.start().unwrap();
    faulted.complete(fail("broken")).unwrap();
    assert_eq!(faulted.status(), TaskStatus::Faulted);
    assert_eq!(faulted.error(), Value::error("Error", "broken"));
}

#[test]
fn test_delegate_runs_on_start_only() {
    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    let task = Task::new(move |task| {
        *flag.borrow_mut() = true;
        let _ = task.complete(Outcome::Success(Value::Null));
    });
    assert!(!*ran.borrow());
    task.start().unwrap();
    assert!(*ran.borrow());
    assert_eq!(task.status(), TaskStatus::Succeeded);
}

#[test]
fn test_panicking_delegate_faults_the_task() {
    let task = Task::new(|_| panic!("delegate blew up"));
    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Faulted);
    assert_eq!(task.error(), Value::error("Error", "task delegate panicked"));
}

#[test]
fn test_listeners_fire_specific_event_then_complete() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let task = manual();
    for (event, name) in [
        (TaskEvent::Complete, "complete"),
        (TaskEvent::Failure, "failure"),
        (TaskEvent::Success, "success"),
    ] {
        let events = events.clone();
        task.add_listener(event, move |_| {
            events.borrow_mut().push(name);
            Ok(())
        })
        .unwrap();
    }
    task.start().unwrap();
    task.complete(ok(true)).unwrap();
    assert_eq!(*events.borrow(), vec!["success", "complete"]);
}

#[test]
fn test_failing_listener_does_not_abort_siblings() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let task = manual();

    let first = seen.clone();
    task.add_listener(TaskEvent::Complete, move |_| {
        first.borrow_mut().push("first");
        panic!("listener panicked")
    })
    .unwrap();
    task.add_listener(TaskEvent::Complete, |_| anyhow::bail!("listener failed"))
        .unwrap();
    let last = seen.clone();
    task.add_listener(TaskEvent::Complete, move |_| {
        last.borrow_mut().push("last");
        Ok(())
    })
    .unwrap();

    task.start().unwrap();
    task.complete(ok(1.0)).unwrap();
    assert_eq!(*seen.borrow(), vec!["first", "last"]);
    assert_eq!(task.status(), TaskStatus::Succeeded);
}

#[test]
fn test_removed_listener_is_not_called() {
    let calls = Rc::new(RefCell::new(0));
    let task = manual();
    let counter = calls.clone();
    let id = task
        .add_listener(TaskEvent::Complete, move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .unwrap();
    assert!(task.remove_listener(id));
    assert!(!task.remove_listener(id));
    task.start().unwrap();
    task.complete(ok(1.0)).unwrap();
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_listening_to_completed_task_is_misuse() {
    let task = Task::settled_with(ok("done"));
    assert!(task.is_completed());
    assert!(matches!(
        task.on_complete(|_| {}),
        Err(RuntimeError::ProtocolMisuse {
            operation: "listen to",
            ..
        })
    ));
}

#[test]
fn test_reading_result_observes() {
    let task = Task::settled_with(ok(1.0));
    assert!(!task.is_observed());
    task.result();
    assert!(task.is_observed());
}

#[test]
fn test_display() {
    let task = manual();
    assert_eq!(task.to_string(), format!("[Task #{} ready]", task.id()));
    assert_eq!(TaskStatus::Canceled.as_str(), "canceled");
}

#[test]
fn test_settled_future_resolves_on_completion() {
    super::on_loop(async {
        let task = super::after(10, ok("late"));
        task.start().unwrap();
        assert_eq!(task.settled().await, ok("late"));
        assert!(task.is_observed());
    });
}
