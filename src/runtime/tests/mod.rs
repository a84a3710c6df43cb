//! Tests for the task runtime

mod builder_tests;
mod cancellation_tests;
mod task_tests;

use super::host;
use super::task::{Outcome, Task};
use crate::value::Value;
use std::future::Future;
use std::time::Duration;

/// Run `future` on a host loop with paused time
pub(crate) fn on_loop<F: Future>(future: F) -> F::Output {
    crate::logging::init_for_tests();
    host::block_on(async {
        tokio::time::pause();
        future.await
    })
    .expect("host loop failed")
}

/// A ready task the test completes by hand after starting it
pub(crate) fn manual() -> Task {
    Task::new(|_| {})
}

/// A ready task that settles with `outcome` after `ms` of host time
pub(crate) fn after(ms: u64, outcome: Outcome) -> Task {
    Task::new(move |task| {
        let task = task.clone();
        let _ = host::set_timeout(Duration::from_millis(ms), move || {
            let _ = task.complete(outcome);
        });
    })
}

pub(crate) fn ok(value: impl Into<Value>) -> Outcome {
    Outcome::Success(value.into())
}

pub(crate) fn fail(message: &str) -> Outcome {
    Outcome::Failure(Value::error("Error", message))
}
