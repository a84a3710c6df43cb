//! Unobserved-failure diagnostics and fault isolation

use crate::value::Value;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{error, warn};

/// A failed task whose error nobody read before the watchdog fired
#[derive(Debug, Clone)]
pub struct UnobservedError {
    pub task_id: u64,
    pub error: Value,
}

type UnobservedHook = Rc<dyn Fn(&UnobservedError)>;

thread_local! {
    static HOOK: RefCell<Option<UnobservedHook>> = RefCell::new(None);
}

/// Install a process-level hook for unobserved failures on this thread
pub fn set_unobserved_hook(hook: impl Fn(&UnobservedError) + 'static) {
    HOOK.with(|slot| *slot.borrow_mut() = Some(Rc::new(hook)));
}

pub fn clear_unobserved_hook() {
    HOOK.with(|slot| *slot.borrow_mut() = None);
}

pub(crate) fn report_unobserved(report: UnobservedError) {
    error!(
        task = report.task_id,
        error = %report.error,
        "task failure was never observed"
    );
    let hook = HOOK.with(|slot| slot.borrow().clone());
    if let Some(hook) = hook {
        if panic::catch_unwind(AssertUnwindSafe(|| hook(&report))).is_err() {
            warn!(task = report.task_id, "unobserved-error hook panicked");
        }
    }
}

/// Run a listener or handler so that its error or panic stays contained
pub(crate) fn isolated(what: &str, f: impl FnOnce() -> anyhow::Result<()>) {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "{} failed", what),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(panic = %message, "{} panicked", what)
        }
    }
}
