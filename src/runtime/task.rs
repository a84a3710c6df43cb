//! Task: a shared handle to a single asynchronous operation
//!
//! ```text
//! ready --start()--> running --complete(success)--> succeeded
//!                            --complete(failure)--> faulted | canceled
//! ```
//!
//! Reading `result` or `error` observes the task. A failure nobody observes
//! within the unobserved timeout is reported through
//! [`diagnostics`](super::diagnostics).

use super::diagnostics::{self, UnobservedError};
use super::host::{self, TimerHandle};
use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tokio::sync::oneshot;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Ready,
    Running,
    Succeeded,
    Faulted,
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Faulted => "faulted",
            TaskStatus::Canceled => "canceled",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Faulted | TaskStatus::Canceled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Success,
    Failure,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Rc<dyn Fn(&Task) -> anyhow::Result<()>>;

type Delegate = Box<dyn FnOnce(&Task)>;

thread_local! {
    static NEXT_TASK_ID: Cell<u64> = Cell::new(1);
}

struct TaskState {
    status: TaskStatus,
    result: Value,
    error: Value,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, TaskEvent, Listener)>,
}

struct TaskInner {
    id: u64,
    state: RefCell<TaskState>,
    delegate: RefCell<Option<Delegate>>,
    listeners: RefCell<Listeners>,
    observed: Cell<bool>,
    watchdog: RefCell<Option<TimerHandle>>,
}

#[derive(Clone)]
pub struct Task {
    inner: Rc<TaskInner>,
}

impl Task {
    /// A ready task; `delegate` runs on `start` and must eventually call `complete`
    pub fn new(delegate: impl FnOnce(&Task) + 'static) -> Task {
        let id = NEXT_TASK_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Task {
            inner: Rc::new(TaskInner {
                id,
                state: RefCell::new(TaskState {
                    status: TaskStatus::Ready,
                    result: Value::Undefined,
                    error: Value::Undefined,
                }),
                delegate: RefCell::new(Some(Box::new(delegate))),
                listeners: RefCell::new(Listeners::default()),
                observed: Cell::new(false),
                watchdog: RefCell::new(None),
            }),
        }
    }

    /// A started task already completed with `outcome`
    pub fn settled_with(outcome: Outcome) -> Task {
        let task = Task::new(move |task| {
            let _ = task.complete(outcome);
        });
        let _ = task.start();
        task
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn status(&self) -> TaskStatus {
        self.inner.state.borrow().status
    }

    pub fn is_completed(&self) -> bool {
        self.status().is_completed()
    }

    pub fn ptr_eq(&self, other: &Task) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /* ===================== Transitions ===================== */

    pub fn start(&self) -> Result<(), RuntimeError> {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.status != TaskStatus::Ready {
                return Err(self.misuse("start", state.status));
            }
            state.status = TaskStatus::Running;
        }
        debug!(task = self.inner.id, "task started");

        let delegate = self.inner.delegate.borrow_mut().take();
        if let Some(delegate) = delegate {
            if panic::catch_unwind(AssertUnwindSafe(|| delegate(self))).is_err()
                && !self.is_completed()
            {
                let _ = self.complete(Outcome::Failure(Value::error(
                    "Error",
                    "task delegate panicked",
                )));
            }
        }
        Ok(())
    }

    pub fn complete(&self, outcome: Outcome) -> Result<(), RuntimeError> {
        let failed = {
            let mut state = self.inner.state.borrow_mut();
            if state.status != TaskStatus::Running {
                return Err(self.misuse("complete", state.status));
            }
            match outcome {
                Outcome::Success(value) => {
                    state.status = TaskStatus::Succeeded;
                    state.result = value;
                    false
                }
                Outcome::Failure(error) => {
                    state.status = if error.is_cancellation() {
                        TaskStatus::Canceled
                    } else {
                        TaskStatus::Faulted
                    };
                    state.error = error;
                    true
                }
            }
        };
        debug!(task = self.inner.id, status = %self.status(), "task completed");

        if failed {
            self.arm_watchdog();
            self.fire(TaskEvent::Failure);
        } else {
            self.fire(TaskEvent::Success);
        }
        self.fire(TaskEvent::Complete);
        self.inner.listeners.borrow_mut().entries.clear();
        Ok(())
    }

    fn misuse(&self, operation: &'static str, status: TaskStatus) -> RuntimeError {
        error!(task = self.inner.id, operation, %status, "task protocol misuse");
        RuntimeError::ProtocolMisuse { operation, status }
    }

    /* ===================== Listeners ===================== */

    pub fn add_listener(
        &self,
        event: TaskEvent,
        listener: impl Fn(&Task) -> anyhow::Result<()> + 'static,
    ) -> Result<ListenerId, RuntimeError> {
        let status = self.status();
        if status.is_completed() {
            return Err(self.misuse("listen to", status));
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push((id, event, Rc::new(listener)));
        Ok(id)
    }

    /// Register a one-shot `complete` listener
    pub fn on_complete(
        &self,
        listener: impl FnOnce(&Task) + 'static,
    ) -> Result<ListenerId, RuntimeError> {
        let slot = RefCell::new(Some(listener));
        self.add_listener(TaskEvent::Complete, move |task| {
            let listener = slot.borrow_mut().take();
            if let Some(listener) = listener {
                listener(task);
            }
            Ok(())
        })
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _, _)| *entry != id);
        listeners.entries.len() != before
    }

    /// Fire one event over a snapshot of its listeners
    fn fire(&self, event: TaskEvent) {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .entries
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            diagnostics::isolated("task listener", || listener(self));
        }
    }

    /* ===================== Observation ===================== */

    /// The success value; observes the task
    pub fn result(&self) -> Value {
        self.observe();
        self.inner.state.borrow().result.clone()
    }

    /// The failure value; observes the task
    pub fn error(&self) -> Value {
        self.observe();
        self.inner.state.borrow().error.clone()
    }

    /// The outcome once completed; observes the task
    pub fn outcome(&self) -> Option<Outcome> {
        match self.status() {
            TaskStatus::Succeeded => Some(Outcome::Success(self.result())),
            TaskStatus::Faulted | TaskStatus::Canceled => Some(Outcome::Failure(self.error())),
            _ => None,
        }
    }

    /// Mark the failure as handled, before or after it happens
    pub fn observe(&self) {
        self.inner.observed.set(true);
        let watchdog = self.inner.watchdog.borrow_mut().take();
        if let Some(watchdog) = watchdog {
            watchdog.cancel();
        }
    }

    pub fn is_observed(&self) -> bool {
        self.inner.observed.get()
    }

    fn arm_watchdog(&self) {
        if self.inner.observed.get() {
            return;
        }
        let task = self.clone();
        let timer = host::set_timeout(super::unobserved_timeout(), move || {
            task.inner.watchdog.borrow_mut().take();
            if !task.inner.observed.get() {
                let error = task.inner.state.borrow().error.clone();
                diagnostics::report_unobserved(UnobservedError {
                    task_id: task.inner.id,
                    error,
                });
            }
        });
        match timer {
            Ok(timer) => *self.inner.watchdog.borrow_mut() = Some(timer),
            Err(_) => debug!(
                task = self.inner.id,
                "no host loop; unobserved-error watchdog skipped"
            ),
        }
    }

    /// Wait for the task from Rust. Observes the task.
    pub async fn settled(&self) -> Outcome {
        if let Some(outcome) = self.outcome() {
            return outcome;
        }
        let (sender, receiver) = oneshot::channel();
        let registered = self.on_complete(move |task| {
            if let Some(outcome) = task.outcome() {
                let _ = sender.send(outcome);
            }
        });
        if let Err(err) = registered {
            return Outcome::Failure(Value::error("Error", err.to_string()));
        }
        receiver.await.unwrap_or_else(|_| {
            Outcome::Failure(Value::error("Error", "task was dropped before it settled"))
        })
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Task #{} {}]", self.inner.id, self.status())
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
