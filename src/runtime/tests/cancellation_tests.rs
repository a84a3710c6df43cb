use super::on_loop;
use crate::error::RuntimeError;
use crate::runtime::{host, CancellationToken, TaskStatus};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn recorder() -> (Rc<RefCell<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() -> anyhow::Result<()>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let handler = move |n: u32| -> Box<dyn FnOnce() -> anyhow::Result<()>> {
        let sink = sink.clone();
        Box::new(move || {
            sink.borrow_mut().push(n);
            Ok(())
        })
    };
    (seen, handler)
}

#[test]
fn test_handlers_run_once_in_registration_order() {
    let token = CancellationToken::new();
    let (seen, handler) = recorder();
    token.register(handler(1));
    token.register(handler(2));
    token.register(handler(3));

    token.cancel();
    token.cancel();
    assert!(token.is_cancellation_requested());
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_register_after_cancel_runs_immediately() {
    let token = CancellationToken::new();
    token.cancel();
    let (seen, handler) = recorder();
    token.register(handler(7));
    assert_eq!(*seen.borrow(), vec![7]);
}

#[test]
fn test_unregistered_handler_does_not_run() {
    let token = CancellationToken::new();
    let (seen, handler) = recorder();
    let id = token.register(handler(1));
    token.register(handler(2));
    assert!(token.unregister(id));
    token.cancel();
    assert_eq!(*seen.borrow(), vec![2]);
}

#[test]
fn test_failing_handler_does_not_stop_the_rest() {
    let token = CancellationToken::new();
    let (seen, handler) = recorder();
    token.register(|| anyhow::bail!("handler failed"));
    token.register(|| panic!("handler panicked"));
    token.register(handler(3));
    token.cancel();
    assert_eq!(*seen.borrow(), vec![3]);
}

#[test]
fn test_throw_if_cancellation_requested() {
    let token = CancellationToken::new();
    assert!(token.throw_if_cancellation_requested().is_ok());
    token.cancel();
    let err = token.throw_if_cancellation_requested().unwrap_err();
    assert!(err.is_cancellation());
}

#[test]
fn test_sleep_succeeds_after_its_duration() {
    on_loop(async {
        let begin = tokio::time::Instant::now();
        let task = host::sleep(Duration::from_millis(250), None);
        task.start().unwrap();
        assert_eq!(task.status(), TaskStatus::Running);
        task.settled().await;
        assert_eq!(task.status(), TaskStatus::Succeeded);
        assert!(begin.elapsed() >= Duration::from_millis(250));
    });
}

#[test]
fn test_sleep_with_canceled_token_cancels_on_start() {
    on_loop(async {
        let token = CancellationToken::new();
        token.cancel();
        let task = host::sleep(Duration::from_secs(60), Some(token));
        task.start().unwrap();
        assert_eq!(task.status(), TaskStatus::Canceled);
        assert!(task.error().is_cancellation());
    });
}

#[test]
fn test_cancel_during_sleep() {
    on_loop(async {
        let token = CancellationToken::new();
        let task = host::sleep(Duration::from_secs(60), Some(token.clone()));
        task.start().unwrap();

        let canceller = token.clone();
        host::set_timeout(Duration::from_millis(10), move || canceller.cancel()).unwrap();
        task.settled().await;
        assert_eq!(task.status(), TaskStatus::Canceled);
    });
}

#[test]
fn test_sleep_without_host_loop_faults() {
    let task = host::sleep(Duration::from_millis(1), None);
    task.start().unwrap();
    assert_eq!(task.status(), TaskStatus::Faulted);
    assert_eq!(
        task.error(),
        Value::error("Error", "no host event loop is running")
    );
}

#[test]
fn test_timer_without_host_loop_is_refused() {
    let timer = host::set_timeout(Duration::from_millis(1), || {});
    assert_eq!(timer.err(), Some(RuntimeError::HostUnavailable));
}

#[test]
fn test_nested_host_loop_is_refused() {
    on_loop(async {
        assert!(host::is_active());
        assert!(host::block_on(async {}).is_err());
    });
    assert!(!host::is_active());
}
