//! Cooperative cancellation

use super::diagnostics;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

type Handler = Box<dyn FnOnce() -> anyhow::Result<()>>;

#[derive(Default)]
struct TokenInner {
    requested: Cell<bool>,
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(RegistrationId, Handler)>>,
}

#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Rc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.inner.requested.get()
    }

    /// Add a handler. On an already canceled token it runs immediately.
    pub fn register(&self, handler: impl FnOnce() -> anyhow::Result<()> + 'static) -> RegistrationId {
        let id = RegistrationId(self.inner.next_id.get() + 1);
        self.inner.next_id.set(id.0);
        if self.is_cancellation_requested() {
            diagnostics::isolated("cancellation handler", handler);
        } else {
            self.inner.handlers.borrow_mut().push((id, Box::new(handler)));
        }
        id
    }

    pub fn unregister(&self, id: RegistrationId) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(entry, _)| *entry != id);
        handlers.len() != before
    }

    /// Request cancellation. Only the first call runs the handlers.
    pub fn cancel(&self) {
        if self.inner.requested.replace(true) {
            return;
        }
        let handlers = std::mem::take(&mut *self.inner.handlers.borrow_mut());
        debug!(handlers = handlers.len(), "cancellation requested");
        for (_, handler) in handlers {
            diagnostics::isolated("cancellation handler", handler);
        }
    }

    pub fn throw_if_cancellation_requested(&self) -> Result<(), Value> {
        if self.is_cancellation_requested() {
            Err(Value::cancellation_error())
        } else {
            Ok(())
        }
    }

    pub fn ptr_eq(&self, other: &CancellationToken) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_cancellation_requested() {
            write!(f, "[CancellationToken canceled]")
        } else {
            write!(f, "[CancellationToken]")
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
