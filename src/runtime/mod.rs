//! Task runtime
//!
//! Reference implementation of the builder protocol on top of a
//! single-threaded host loop: tasks, cancellation tokens, the whenAll and
//! whenAny combinators, callback binding adapters and the unobserved-error
//! watchdog.

pub mod binding;
pub mod builder;
pub mod cancellation;
pub mod combinators;
pub mod diagnostics;
pub mod host;
pub mod task;

pub use binding::{from_plain, from_standard, BindingCallback, Convention};
pub use builder::{AsyncBuilder, ASYNC_BUILDER};
pub use cancellation::{CancellationToken, RegistrationId};
pub use combinators::{when_all, when_any, TaskSet};
pub use diagnostics::{clear_unobserved_hook, set_unobserved_hook, UnobservedError};
pub use task::{ListenerId, Outcome, Task, TaskEvent, TaskStatus};

use crate::config::RuntimeSettings;
use std::cell::RefCell;
use std::time::Duration;
use tracing::debug;

thread_local! {
    static SETTINGS: RefCell<RuntimeSettings> = RefCell::new(RuntimeSettings::default());
}

/// Apply runtime settings for the current thread
pub fn configure(settings: RuntimeSettings) {
    debug!(?settings, "runtime configured");
    SETTINGS.with(|current| *current.borrow_mut() = settings);
}

pub fn settings() -> RuntimeSettings {
    SETTINGS.with(|current| current.borrow().clone())
}

pub(crate) fn unobserved_timeout() -> Duration {
    Duration::from_millis(settings().unobserved_timeout_ms)
}

#[cfg(test)]
mod tests;
