//! Tests for the builder protocol

mod base_tests;
mod loop_tests;

use super::{BoxStep, Callback, Completion};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Run a step that completes synchronously and return its completion
pub(crate) fn run(step: BoxStep) -> Completion {
    let slot: Rc<RefCell<Option<Completion>>> = Rc::new(RefCell::new(None));
    let sink = slot.clone();
    step.run(
        &Value::Undefined,
        Box::new(move |completion| *sink.borrow_mut() = Some(completion)),
    );
    let completion = slot.borrow_mut().take();
    completion.expect("step did not complete synchronously")
}

/// A step that parks its callback until the test resumes it
pub(crate) fn parked(slot: &Rc<RefCell<Option<Callback>>>) -> BoxStep {
    let slot = slot.clone();
    super::step(move |_, callback| *slot.borrow_mut() = Some(callback))
}
