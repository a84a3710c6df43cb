//! Host event loop
//!
//! A tokio current-thread runtime driving a `LocalSet`, so timers and tasks
//! can hold `Rc` state. Timers are only available while [`block_on`] runs.

use super::cancellation::CancellationToken;
use super::task::{Outcome, Task};
use crate::error::RuntimeError;
use crate::value::Value;
use anyhow::{bail, Context, Result};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{JoinHandle, LocalSet};
use tracing::debug;

thread_local! {
    static ACTIVE: Cell<usize> = Cell::new(0);
}

struct ActiveGuard;

impl ActiveGuard {
    fn enter() -> Self {
        ACTIVE.with(|active| active.set(active.get() + 1));
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.set(active.get() - 1));
    }
}

/// Run `future` to completion on a fresh host loop
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if is_active() {
        bail!("a host loop is already running on this thread");
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build host runtime")?;
    let local = LocalSet::new();
    let _guard = ActiveGuard::enter();
    Ok(local.block_on(&runtime, future))
}

pub fn is_active() -> bool {
    ACTIVE.with(|active| active.get() > 0)
}

/// A pending timer; dropping it leaves the timer armed
#[derive(Debug)]
pub struct TimerHandle {
    handle: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

/// Call `f` after `delay`
pub fn set_timeout(
    delay: Duration,
    f: impl FnOnce() + 'static,
) -> Result<TimerHandle, RuntimeError> {
    if !is_active() {
        return Err(RuntimeError::HostUnavailable);
    }
    let handle = tokio::task::spawn_local(async move {
        tokio::time::sleep(delay).await;
        f();
    });
    Ok(TimerHandle { handle })
}

/// A ready task that succeeds after `duration`, or is canceled through `token`
pub fn sleep(duration: Duration, token: Option<CancellationToken>) -> Task {
    Task::new(move |task| {
        if let Some(token) = &token {
            if token.is_cancellation_requested() {
                let _ = task.complete(Outcome::Failure(Value::cancellation_error()));
                return;
            }
        }

        let registration = Rc::new(RefCell::new(None));
        let timer = {
            let task = task.clone();
            let token = token.clone();
            let registration = registration.clone();
            set_timeout(duration, move || {
                if let (Some(token), Some(id)) = (&token, registration.borrow_mut().take()) {
                    token.unregister(id);
                }
                if !task.is_completed() {
                    let _ = task.complete(Outcome::Success(Value::Undefined));
                }
            })
        };

        let timer = match timer {
            Ok(timer) => timer,
            Err(err) => {
                debug!(task = task.id(), "sleep requested without a host loop");
                let _ = task.complete(Outcome::Failure(Value::error("Error", err.to_string())));
                return;
            }
        };

        if let Some(token) = &token {
            let task = task.clone();
            let id = token.register(move || {
                timer.cancel();
                if !task.is_completed() {
                    task.complete(Outcome::Failure(Value::cancellation_error()))?;
                }
                Ok(())
            });
            *registration.borrow_mut() = Some(id);
        }
    })
}
