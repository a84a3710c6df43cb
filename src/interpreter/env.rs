//! Variable environments
//!
//! Scopes are function-level: one scope per call, chained to the scope the
//! function was defined in. Blocks do not introduce scopes.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type Env = Rc<RefCell<Scope>>;

#[derive(Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Env>,
}

pub fn new_env(parent: Option<Env>) -> Env {
    Rc::new(RefCell::new(Scope {
        vars: HashMap::new(),
        parent,
    }))
}

/// Bind `name` in this scope, replacing any existing binding
pub fn define(env: &Env, name: &str, value: Value) {
    env.borrow_mut().vars.insert(name.to_string(), value);
}

/// Bind `name` to `undefined` in this scope unless it is already bound here
pub fn hoist_var(env: &Env, name: &str) {
    env.borrow_mut()
        .vars
        .entry(name.to_string())
        .or_insert(Value::Undefined);
}

pub fn lookup(env: &Env, name: &str) -> Option<Value> {
    let scope = env.borrow();
    match scope.vars.get(name) {
        Some(value) => Some(value.clone()),
        None => scope.parent.as_ref().and_then(|parent| lookup(parent, name)),
    }
}

/// Update the nearest binding of `name`. False if it is not declared anywhere.
pub fn assign(env: &Env, name: &str, value: Value) -> bool {
    let mut scope = env.borrow_mut();
    if let Some(slot) = scope.vars.get_mut(name) {
        *slot = value;
        return true;
    }
    match scope.parent.clone() {
        Some(parent) => {
            drop(scope);
            assign(&parent, name, value)
        }
        None => false,
    }
}
