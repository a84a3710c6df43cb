//! Standard library globals
//!
//! `Task` (whenAll, whenAny, sleep, fromStandard, fromPlain),
//! `CancellationToken`, `Error`, `CancellationError` and `console.log`.

use super::env::{self, Env};
use super::expressions::call_function;
use crate::runtime::binding::{self, BindingCallback, Convention, Operation};
use crate::runtime::{host, when_all, when_any, CancellationToken, TaskSet};
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::info;

/* ===================== Environment ===================== */

pub fn global_env() -> Env {
    let globals = env::new_env(None);
    env::define(&globals, "undefined", Value::Undefined);
    env::define(&globals, "NaN", Value::Num(f64::NAN));
    env::define(&globals, "Infinity", Value::Num(f64::INFINITY));
    env::define(&globals, "Task", task_object());
    env::define(
        &globals,
        "CancellationToken",
        Value::native("CancellationToken", |_, _| {
            Ok(Value::Token(CancellationToken::new()))
        }),
    );
    env::define(
        &globals,
        "Error",
        Value::native("Error", |_, args| {
            let message = args.first().map(|m| m.to_string()).unwrap_or_default();
            Ok(Value::error("Error", message))
        }),
    );
    env::define(
        &globals,
        "CancellationError",
        Value::native("CancellationError", |_, _| Ok(Value::cancellation_error())),
    );
    env::define(&globals, "console", console_object());
    globals
}

fn console_object() -> Value {
    let mut console = IndexMap::new();
    console.insert(
        "log".to_string(),
        Value::native("log", |_, args| {
            let line: Vec<String> = args.iter().map(|v| v.to_string()).collect();
            info!(target: "console", "{}", line.join(" "));
            Ok(Value::Undefined)
        }),
    );
    Value::obj(console)
}

fn task_object() -> Value {
    let mut task = IndexMap::new();
    task.insert(
        "whenAll".to_string(),
        Value::native("whenAll", |_, args| {
            Ok(Value::Task(when_all(TaskSet::from_args(args))))
        }),
    );
    task.insert(
        "whenAny".to_string(),
        Value::native("whenAny", |_, args| {
            Ok(Value::Task(when_any(TaskSet::from_args(args))))
        }),
    );
    task.insert("sleep".to_string(), Value::native("sleep", sleep));
    task.insert(
        "fromStandard".to_string(),
        Value::native("fromStandard", |_, args| bind(Convention::Standard, args)),
    );
    task.insert(
        "fromPlain".to_string(),
        Value::native("fromPlain", |_, args| bind(Convention::Plain, args)),
    );
    Value::obj(task)
}

/* ===================== Task functions ===================== */

/// Task.sleep(ms, token?)
fn sleep(_this: &Value, args: Vec<Value>) -> Result<Value, Value> {
    let ms = args.first().map(|v| v.to_number()).unwrap_or(0.0);
    if !ms.is_finite() || ms < 0.0 {
        return Err(Value::range_error(format!("invalid sleep duration: {}", ms)));
    }
    let token = match args.get(1) {
        None | Some(Value::Undefined) | Some(Value::Null) => None,
        Some(Value::Token(token)) => Some(token.clone()),
        Some(other) => {
            return Err(Value::type_error(format!(
                "expected a CancellationToken, got {}",
                other.type_of()
            )))
        }
    };
    Ok(Value::Task(host::sleep(
        Duration::from_millis(ms as u64),
        token,
    )))
}

/// Task.fromStandard(fn, ...names) / Task.fromPlain(fn, ...names)
fn bind(convention: Convention, args: Vec<Value>) -> Result<Value, Value> {
    let mut args = args.into_iter();
    let target = args.next().unwrap_or_default();
    if !matches!(target, Value::Function(_)) {
        return Err(Value::type_error(format!(
            "expected a function to bind, got {}",
            target.type_of()
        )));
    }
    let names: Vec<String> = args.map(|name| name.to_string()).collect();

    let operation: Operation = Rc::new(move |mut call_args: Vec<Value>, callback: BindingCallback| {
        call_args.push(Value::native("callback", move |_, args| {
            callback.invoke(args);
            Ok(Value::Undefined)
        }));
        call_function(&target, Value::Undefined, call_args).map(|_| ())
    });
    let bound = binding::bind_operation(convention, operation, names);
    Ok(Value::native("bound", move |_, args| Ok(Value::Task(bound(args)))))
}
