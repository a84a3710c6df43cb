//! Native control flow signals

use crate::value::Value;

/// Active control flow after executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    None,
    Break(Option<String>),    // optional label
    Continue(Option<String>), // optional label
    Return(Value),
    Throw(Value),
}

impl Control {
    pub fn is_none(&self) -> bool {
        matches!(self, Control::None)
    }
}

/// Expression result; `Err` carries a thrown value
pub type EvalResult = Result<Value, Value>;
