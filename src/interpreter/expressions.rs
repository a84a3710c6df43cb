//! Expression evaluation

use super::control::{Control, EvalResult};
use super::env;
use super::statements::{exec_block, hoist};
use super::Activation;
use crate::syntax::{
    BinaryOp, Expr, Function as FunctionNode, Lit, LogicalOp, UnaryOp, UpdateOp,
};
use crate::value::{Closure, CompiledClosure, Function, Value};
use indexmap::IndexMap;
use std::rc::Rc;

pub fn eval(expr: &Expr, act: &Activation) -> EvalResult {
    match expr {
        Expr::Identifier { name, .. } => env::lookup(&act.env, name)
            .ok_or_else(|| Value::reference_error(format!("{} is not defined", name))),

        Expr::Literal { value, .. } => Ok(match value {
            Lit::Null => Value::Null,
            Lit::Bool(b) => Value::Bool(*b),
            Lit::Num(n) => Value::Num(*n),
            Lit::Str(s) => Value::Str(s.clone()),
        }),

        Expr::ThisExpression { .. } => Ok(act.this.clone()),

        Expr::ArrayExpression { elements, .. } => {
            let items = elements
                .iter()
                .map(|element| eval(element, act))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(items))
        }

        Expr::ObjectExpression { properties, .. } => {
            let mut map = IndexMap::new();
            for property in properties {
                map.insert(property.key.clone(), eval(&property.value, act)?);
            }
            Ok(Value::obj(map))
        }

        Expr::FunctionExpression(function) => make_function(function, act),

        Expr::UnaryExpression {
            operator, argument, ..
        } => {
            // typeof tolerates undeclared names
            if let (UnaryOp::TypeOf, Expr::Identifier { name, .. }) = (operator, argument.as_ref()) {
                let value = env::lookup(&act.env, name).unwrap_or_default();
                return Ok(Value::str(value.type_of()));
            }
            let value = eval(argument, act)?;
            Ok(match operator {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Minus => Value::Num(-value.to_number()),
                UnaryOp::Plus => Value::Num(value.to_number()),
                UnaryOp::BitNot => Value::Num(!to_int32(&value) as f64),
                UnaryOp::TypeOf => Value::str(value.type_of()),
                UnaryOp::Void => Value::Undefined,
            })
        }

        Expr::UpdateExpression {
            operator,
            prefix,
            argument,
            ..
        } => {
            let target = Reference::resolve(argument, act)?;
            let old = target.get(act)?.to_number();
            let new = match operator {
                UpdateOp::Increment => old + 1.0,
                UpdateOp::Decrement => old - 1.0,
            };
            target.set(Value::Num(new), act)?;
            Ok(Value::Num(if *prefix { new } else { old }))
        }

        Expr::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = eval(left, act)?;
            let right = eval(right, act)?;
            binary(*operator, &left, &right)
        }

        Expr::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = eval(left, act)?;
            match (operator, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => eval(right, act),
            }
        }

        Expr::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => {
            let target = Reference::resolve(left, act)?;
            let value = match operator.binary() {
                None => eval(right, act)?,
                Some(op) => {
                    let current = target.get(act)?;
                    let rhs = eval(right, act)?;
                    binary(op, &current, &rhs)?
                }
            };
            target.set(value.clone(), act)?;
            Ok(value)
        }

        Expr::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if eval(test, act)?.is_truthy() {
                eval(consequent, act)
            } else {
                eval(alternate, act)
            }
        }

        Expr::CallExpression {
            callee, arguments, ..
        } => {
            let (this, function) = match callee.as_ref() {
                Expr::MemberExpression {
                    object,
                    property,
                    computed,
                    ..
                } => {
                    let object = eval(object, act)?;
                    let key = member_key(property, *computed, act)?;
                    let function = get_member(&object, &key)?;
                    (object, function)
                }
                other => (Value::Undefined, eval(other, act)?),
            };
            let args = eval_args(arguments, act)?;
            call_function(&function, this, args)
        }

        Expr::NewExpression {
            callee, arguments, ..
        } => {
            let function = eval(callee, act)?;
            let args = eval_args(arguments, act)?;
            let this = Value::obj(IndexMap::new());
            let result = call_function(&function, this.clone(), args)?;
            Ok(match result {
                Value::Undefined | Value::Null | Value::Bool(_) | Value::Num(_) | Value::Str(_) => this,
                other => other,
            })
        }

        Expr::MemberExpression {
            object,
            property,
            computed,
            ..
        } => {
            let object = eval(object, act)?;
            let key = member_key(property, *computed, act)?;
            get_member(&object, &key)
        }

        Expr::SequenceExpression { expressions, .. } => {
            let mut last = Value::Undefined;
            for expression in expressions {
                last = eval(expression, act)?;
            }
            Ok(last)
        }
    }
}

fn eval_args(arguments: &[Expr], act: &Activation) -> Result<Vec<Value>, Value> {
    arguments.iter().map(|argument| eval(argument, act)).collect()
}

fn member_key(property: &Expr, computed: bool, act: &Activation) -> Result<String, Value> {
    match (computed, property) {
        (false, Expr::Identifier { name, .. }) => Ok(name.clone()),
        _ => Ok(eval(property, act)?.to_string()),
    }
}

/// Create the function value for a literal; marked literals are compiled
pub(crate) fn make_function(function: &FunctionNode, act: &Activation) -> EvalResult {
    let value = if function.compile.is_some() {
        let compiled = act
            .compiler
            .compile_function(function)
            .map_err(|err| Value::syntax_error(err.to_string()))?;
        Function::Compiled(CompiledClosure {
            compiled,
            env: act.env.clone(),
            compiler: act.compiler.clone(),
        })
    } else {
        Function::Closure(Closure {
            name: function.id.clone(),
            params: function.params.clone(),
            body: Rc::new(function.body.clone()),
            env: act.env.clone(),
            compiler: act.compiler.clone(),
        })
    };
    Ok(Value::Function(Rc::new(value)))
}

/* ===================== Calls ===================== */

pub fn call_function(function: &Value, this: Value, args: Vec<Value>) -> EvalResult {
    let Value::Function(function) = function else {
        return Err(Value::type_error(format!("{} is not a function", function)));
    };
    match function.as_ref() {
        Function::Native(native) => (native.f)(&this, args),

        Function::Closure(closure) => {
            let scope = env::new_env(Some(closure.env.clone()));
            let mut args = args.into_iter();
            for param in &closure.params {
                env::define(&scope, param, args.next().unwrap_or_default());
            }
            let act = Activation::new(scope, this, closure.compiler.clone());
            hoist(&closure.body, &act);
            match exec_block(&closure.body, &act) {
                Control::None => Ok(Value::Undefined),
                Control::Return(value) => Ok(value),
                Control::Throw(error) => Err(error),
                Control::Break(_) | Control::Continue(_) => {
                    Err(Value::syntax_error("break or continue outside of a loop"))
                }
            }
        }

        Function::Compiled(compiled) => {
            compiled
                .compiled
                .invoke(this, args, &compiled.env, &compiled.compiler)
        }
    }
}

/* ===================== Assignment ===================== */

/// An assignment target with its object and key already evaluated
#[derive(Debug, Clone)]
pub enum Reference {
    Binding(String),
    Member { object: Value, key: String },
}

impl Reference {
    pub fn resolve(target: &Expr, act: &Activation) -> Result<Reference, Value> {
        match target {
            Expr::Identifier { name, .. } => Ok(Reference::Binding(name.clone())),
            Expr::MemberExpression {
                object,
                property,
                computed,
                ..
            } => {
                let object = eval(object, act)?;
                let key = member_key(property, *computed, act)?;
                Ok(Reference::Member { object, key })
            }
            _ => Err(Value::syntax_error("invalid assignment target")),
        }
    }

    pub fn get(&self, act: &Activation) -> EvalResult {
        match self {
            Reference::Binding(name) => env::lookup(&act.env, name)
                .ok_or_else(|| Value::reference_error(format!("{} is not defined", name))),
            Reference::Member { object, key } => get_member(object, key),
        }
    }

    pub fn set(&self, value: Value, act: &Activation) -> Result<(), Value> {
        match self {
            Reference::Binding(name) => {
                if env::assign(&act.env, name, value) {
                    Ok(())
                } else {
                    Err(Value::reference_error(format!("{} is not defined", name)))
                }
            }
            Reference::Member { object, key } => set_member(object, key, value),
        }
    }
}

/// Store `value` into an identifier or member target
pub fn assign_target(target: &Expr, value: Value, act: &Activation) -> Result<(), Value> {
    Reference::resolve(target, act)?.set(value, act)
}

/* ===================== Members ===================== */

fn method(name: &'static str, f: impl Fn(&Value, Vec<Value>) -> EvalResult + 'static) -> Value {
    Value::native(name, f)
}

pub fn get_member(object: &Value, key: &str) -> EvalResult {
    match object {
        Value::Undefined | Value::Null => Err(Value::type_error(format!(
            "cannot read property '{}' of {}",
            key, object
        ))),

        Value::Obj(map) => Ok(map.borrow().get(key).cloned().unwrap_or_default()),

        Value::List(items) => match key {
            "length" => Ok(Value::Num(items.borrow().len() as f64)),
            "push" => Ok(method("push", |this, args| match this {
                Value::List(items) => {
                    let mut items = items.borrow_mut();
                    items.extend(args);
                    Ok(Value::Num(items.len() as f64))
                }
                _ => Err(Value::type_error("push called on a non-list")),
            })),
            _ => Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.borrow().get(index).cloned())
                .unwrap_or_default()),
        },

        Value::Str(s) => match key {
            "length" => Ok(Value::Num(s.chars().count() as f64)),
            _ => Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| s.chars().nth(index))
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or_default()),
        },

        Value::Task(task) => Ok(match key {
            "id" => Value::Num(task.id() as f64),
            "status" => Value::str(task.status().as_str()),
            "result" => task.result(),
            "error" => task.error(),
            "isCompleted" => Value::Bool(task.is_completed()),
            "start" => method("start", |this, _| match this {
                Value::Task(task) => {
                    task.start()
                        .map_err(|err| Value::error("Error", err.to_string()))?;
                    Ok(this.clone())
                }
                _ => Err(Value::type_error("start called on a non-task")),
            }),
            _ => Value::Undefined,
        }),

        Value::Token(token) => Ok(match key {
            "isCancellationRequested" => Value::Bool(token.is_cancellation_requested()),
            "cancel" => method("cancel", |this, _| match this {
                Value::Token(token) => {
                    token.cancel();
                    Ok(Value::Undefined)
                }
                _ => Err(Value::type_error("cancel called on a non-token")),
            }),
            "register" => method("register", |this, args| match this {
                Value::Token(token) => {
                    let handler = args.into_iter().next().unwrap_or_default();
                    token.register(move || {
                        call_function(&handler, Value::Undefined, Vec::new())
                            .map(|_| ())
                            .map_err(|error| anyhow::anyhow!("{}", error))
                    });
                    Ok(Value::Undefined)
                }
                _ => Err(Value::type_error("register called on a non-token")),
            }),
            "throwIfCancellationRequested" => {
                method("throwIfCancellationRequested", |this, _| match this {
                    Value::Token(token) => {
                        token.throw_if_cancellation_requested()?;
                        Ok(Value::Undefined)
                    }
                    _ => Err(Value::type_error(
                        "throwIfCancellationRequested called on a non-token",
                    )),
                })
            }
            _ => Value::Undefined,
        }),

        Value::Error(error) => Ok(match key {
            "name" => Value::str(error.name.clone()),
            "message" => Value::str(error.message.clone()),
            "errors" => Value::list(error.errors.clone()),
            _ => Value::Undefined,
        }),

        Value::Bool(_) | Value::Num(_) | Value::Function(_) => Ok(Value::Undefined),
    }
}

pub fn set_member(object: &Value, key: &str, value: Value) -> Result<(), Value> {
    match object {
        Value::Obj(map) => {
            map.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        Value::List(items) => {
            let index = key
                .parse::<usize>()
                .map_err(|_| Value::type_error(format!("cannot set '{}' on a list", key)))?;
            let mut items = items.borrow_mut();
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
            Ok(())
        }
        other => Err(Value::type_error(format!(
            "cannot set property '{}' on {}",
            key,
            other.type_of()
        ))),
    }
}

/* ===================== Operators ===================== */

fn to_int32(value: &Value) -> i32 {
    let n = value.to_number();
    if !n.is_finite() {
        return 0;
    }
    (n.trunc() as i64) as i32
}

fn to_uint32(value: &Value) -> u32 {
    to_int32(value) as u32
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let num = |f: fn(f64, f64) -> f64| Value::Num(f(left.to_number(), right.to_number()));
    Ok(match op {
        BinaryOp::Add => match (left, right) {
            (Value::Num(a), Value::Num(b)) => Value::Num(a + b),
            (Value::Str(_), _) | (_, Value::Str(_)) | (Value::List(_), _) | (_, Value::List(_)) => {
                Value::Str(format!("{}{}", left, right))
            }
            _ => Value::Num(left.to_number() + right.to_number()),
        },
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Rem => num(|a, b| a % b),
        BinaryOp::Shl => Value::Num(to_int32(left).wrapping_shl(to_uint32(right) & 31) as f64),
        BinaryOp::Shr => Value::Num(to_int32(left).wrapping_shr(to_uint32(right) & 31) as f64),
        BinaryOp::UShr => Value::Num(to_uint32(left).wrapping_shr(to_uint32(right) & 31) as f64),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            Value::Bool(compare(op, left, right))
        }
        BinaryOp::In => match right {
            Value::Obj(map) => Value::Bool(map.borrow().contains_key(&left.to_string())),
            Value::List(items) => Value::Bool(
                left.to_string()
                    .parse::<usize>()
                    .map(|index| index < items.borrow().len())
                    .unwrap_or(false),
            ),
            other => {
                return Err(Value::type_error(format!(
                    "cannot use 'in' on {}",
                    other.type_of()
                )))
            }
        },
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
        BinaryOp::BitAnd => Value::Num((to_int32(left) & to_int32(right)) as f64),
        BinaryOp::BitXor => Value::Num((to_int32(left) ^ to_int32(right)) as f64),
        BinaryOp::BitOr => Value::Num((to_int32(left) | to_int32(right)) as f64),
    })
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}
