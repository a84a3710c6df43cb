//! Synchronous builder
//!
//! `lift` passes the operand through unchanged, so a compiled function runs
//! to completion inside `start` and returns its value directly.

use super::{step, BoxStep, Builder, Completion};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

pub const SYNC_BUILDER: &str = "sync";

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncBuilder;

impl Builder for SyncBuilder {
    fn name(&self) -> &str {
        SYNC_BUILDER
    }

    fn lift(&self, operand: Value) -> BoxStep {
        step(move |_, callback| callback(Completion::Normal(operand)))
    }

    fn start(&self, ctx: Value, root: BoxStep) -> Result<Value, Value> {
        let slot: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
        let sink = slot.clone();
        root.run(
            &ctx,
            Box::new(move |completion| *sink.borrow_mut() = Some(completion)),
        );

        let completion = slot.borrow_mut().take();
        debug!(completion = ?completion, "sync builder finished");
        match completion {
            Some(Completion::Normal(_)) => Ok(Value::Undefined),
            Some(Completion::Return(value)) => Ok(value),
            Some(Completion::Throw(error)) => Err(error),
            Some(Completion::Break) | Some(Completion::Continue) => Err(Value::syntax_error(
                "break or continue escaped the function body",
            )),
            None => Err(Value::type_error(
                "sync builder: function did not complete synchronously",
            )),
        }
    }
}
