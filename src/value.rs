//! Runtime values
//!
//! Shared by the task runtime and the interpreter. Lists and objects are
//! shared mutable references, so cloning a `Value` never deep-copies.

use crate::compiler::Compiler;
use crate::emit::CompiledFunction;
use crate::interpreter::Env;
use crate::runtime::{CancellationToken, Task};
use crate::syntax::printer::format_number;
use crate::syntax::Stmt;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/* ===================== Error names ===================== */

pub const TYPE_ERROR: &str = "TypeError";
pub const REFERENCE_ERROR: &str = "ReferenceError";
pub const SYNTAX_ERROR: &str = "SyntaxError";
pub const RANGE_ERROR: &str = "RangeError";
pub const CANCELLATION_ERROR: &str = "CancellationError";
pub const AGGREGATE_ERROR: &str = "AggregateError";

pub type List = Rc<RefCell<Vec<Value>>>;
pub type Object = Rc<RefCell<IndexMap<String, Value>>>;

/* ===================== Value ===================== */

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(List),
    Obj(Object),
    Function(Rc<Function>),
    Task(Task),
    Token(CancellationToken),
    Error(Rc<ErrorValue>),
}

/// An error value: `name`, `message` and, for aggregates, the child errors
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub errors: Vec<Value>,
}

pub type NativeFn = Rc<dyn Fn(&Value, Vec<Value>) -> Result<Value, Value>>;

/// A function implemented in Rust. Receives `this` and the arguments.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub f: NativeFn,
}

/// A plain function literal closed over its defining scope
#[derive(Clone)]
pub struct Closure {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub env: Env,
    pub compiler: Rc<Compiler>,
}

/// A builder-compiled function closed over its defining scope
#[derive(Clone)]
pub struct CompiledClosure {
    pub compiled: Rc<CompiledFunction>,
    pub env: Env,
    pub compiler: Rc<Compiler>,
}

pub enum Function {
    Native(NativeFunction),
    Closure(Closure),
    Compiled(CompiledClosure),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Native(native) => &native.name,
            Function::Closure(closure) => closure.name.as_deref().unwrap_or(""),
            Function::Compiled(compiled) => compiled.compiled.name(),
        }
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn obj(entries: IndexMap<String, Value>) -> Value {
        Value::Obj(Rc::new(RefCell::new(entries)))
    }

    pub fn native(
        name: impl Into<String>,
        f: impl Fn(&Value, Vec<Value>) -> Result<Value, Value> + 'static,
    ) -> Value {
        Value::Function(Rc::new(Function::Native(NativeFunction {
            name: name.into(),
            f: Rc::new(f),
        })))
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Value {
        Value::Error(Rc::new(ErrorValue {
            name: name.into(),
            message: message.into(),
            errors: Vec::new(),
        }))
    }

    pub fn type_error(message: impl Into<String>) -> Value {
        Value::error(TYPE_ERROR, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Value {
        Value::error(REFERENCE_ERROR, message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Value {
        Value::error(SYNTAX_ERROR, message)
    }

    pub fn range_error(message: impl Into<String>) -> Value {
        Value::error(RANGE_ERROR, message)
    }

    pub fn cancellation_error() -> Value {
        Value::error(CANCELLATION_ERROR, "the operation was canceled")
    }

    pub fn aggregate_error(errors: Vec<Value>) -> Value {
        Value::Error(Rc::new(ErrorValue {
            name: AGGREGATE_ERROR.to_string(),
            message: format!("{} task(s) failed", errors.len()),
            errors,
        }))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
            Value::Null
            | Value::List(_)
            | Value::Obj(_)
            | Value::Task(_)
            | Value::Token(_)
            | Value::Error(_) => "object",
        }
    }

    /// True for error values named `CancellationError`
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Value::Error(e) if e.name == CANCELLATION_ERROR)
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Value::Task(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Num(n) => *n,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Obj(a), Value::Obj(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Task(a), Value::Task(b)) => a.ptr_eq(b),
            (Value::Token(a), Value::Token(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`: nullish values equal each other, primitives compare as numbers
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Num(_) | Value::Str(_) | Value::Bool(_), Value::Num(_) | Value::Str(_) | Value::Bool(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_equals(other),
        }
    }

    /// Keys enumerated by `for-in`, in definition order
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Obj(map) => map.borrow().keys().cloned().collect(),
            Value::List(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
            Value::Str(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }
}

/* ===================== Formatting ===================== */

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Num(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                let items = items.borrow();
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Obj(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(f, "function {}() {{ [code] }}", func.name()),
            Value::Task(task) => write!(f, "{}", task),
            Value::Token(token) => write!(f, "{}", token),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Obj(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            other => write!(f, "{}", other),
        }
    }
}

/// Structural for data, identity for handles
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Obj(a), Value::Obj(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => self.strict_equals(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Task> for Value {
    fn from(task: Task) -> Self {
        Value::Task(task)
    }
}
