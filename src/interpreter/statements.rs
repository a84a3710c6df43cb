//! Statement execution
//!
//! Each statement yields a [`Control`]. Loops and labeled statements consume
//! the breaks and continues aimed at them; everything else propagates.

use super::control::Control;
use super::env;
use super::expressions::{assign_target, eval, make_function};
use super::Activation;
use crate::syntax::visit::{walk_stmt, Visitor};
use crate::syntax::{Expr, ForInLeft, Function, Stmt, VariableDeclarator};
use crate::value::Value;

macro_rules! eval_or_throw {
    ($expr:expr, $act:expr) => {
        match eval($expr, $act) {
            Ok(value) => value,
            Err(error) => return Control::Throw(error),
        }
    };
}

/* ===================== Hoisting ===================== */

/// Declare every `var` of a function body and bind its function declarations
pub fn hoist(body: &[Stmt], act: &Activation) {
    struct Declarations<'ast> {
        vars: Vec<&'ast str>,
        functions: Vec<&'ast Function>,
    }

    impl<'ast> Visitor<'ast> for Declarations<'ast> {
        fn visit_stmt(&mut self, stmt: &'ast Stmt) {
            match stmt {
                Stmt::VariableDeclaration { declarations, .. }
                | Stmt::ForInStatement {
                    left: ForInLeft::VariableDeclaration { declarations, .. },
                    ..
                } => {
                    self.vars.extend(declarations.iter().map(|d| d.id.as_str()));
                }
                Stmt::FunctionDeclaration(function) => {
                    self.functions.push(function);
                    return;
                }
                _ => {}
            }
            walk_stmt(self, stmt)
        }

        // nested function bodies hoist on their own call
        fn visit_function(&mut self, _function: &'ast Function) {}
    }

    let mut declarations = Declarations {
        vars: Vec::new(),
        functions: Vec::new(),
    };
    for stmt in body {
        declarations.visit_stmt(stmt);
    }

    for name in declarations.vars {
        env::hoist_var(&act.env, name);
    }
    for function in declarations.functions {
        if let Some(name) = &function.id {
            match make_function(function, act) {
                Ok(value) => env::define(&act.env, name, value),
                // a marked declaration that fails to compile throws when called
                Err(error) => env::define(&act.env, name, thrower(error)),
            }
        }
    }
}

fn thrower(error: Value) -> Value {
    Value::native("", move |_, _| Err(error.clone()))
}

/* ===================== Execution ===================== */

pub fn exec_block(stmts: &[Stmt], act: &Activation) -> Control {
    for stmt in stmts {
        let control = exec_stmt(stmt, act);
        if !control.is_none() {
            return control;
        }
    }
    Control::None
}

pub fn exec_stmt(stmt: &Stmt, act: &Activation) -> Control {
    exec_labeled(stmt, &[], act)
}

/// What a loop does with the control its body produced
enum LoopStep {
    Next,
    Exit(Control),
}

fn after_body(control: Control, labels: &[String]) -> LoopStep {
    match control {
        Control::None | Control::Continue(None) => LoopStep::Next,
        Control::Continue(Some(label)) if labels.contains(&label) => LoopStep::Next,
        Control::Break(None) => LoopStep::Exit(Control::None),
        Control::Break(Some(label)) if labels.contains(&label) => LoopStep::Exit(Control::None),
        other => LoopStep::Exit(other),
    }
}

fn exec_labeled(stmt: &Stmt, labels: &[String], act: &Activation) -> Control {
    match stmt {
        Stmt::ExpressionStatement { expression, .. } => {
            eval_or_throw!(expression, act);
            Control::None
        }

        Stmt::VariableDeclaration { declarations, .. } => declare(declarations, act),

        // bound during hoisting
        Stmt::FunctionDeclaration(_) | Stmt::EmptyStatement { .. } => Control::None,

        Stmt::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(argument) => eval_or_throw!(argument, act),
                None => Value::Undefined,
            };
            Control::Return(value)
        }

        Stmt::BreakStatement { label, .. } => Control::Break(label.clone()),
        Stmt::ContinueStatement { label, .. } => Control::Continue(label.clone()),

        Stmt::ThrowStatement { argument, .. } => Control::Throw(eval_or_throw!(argument, act)),

        Stmt::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if eval_or_throw!(test, act).is_truthy() {
                exec_stmt(consequent, act)
            } else if let Some(alternate) = alternate {
                exec_stmt(alternate, act)
            } else {
                Control::None
            }
        }

        Stmt::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            if let Some(init) = init {
                let control = exec_stmt(init, act);
                if !control.is_none() {
                    return control;
                }
            }
            loop {
                if let Some(test) = test {
                    if !eval_or_throw!(test, act).is_truthy() {
                        return Control::None;
                    }
                }
                if let LoopStep::Exit(control) = after_body(exec_stmt(body, act), labels) {
                    return control;
                }
                if let Some(update) = update {
                    eval_or_throw!(update, act);
                }
            }
        }

        Stmt::ForInStatement {
            left, right, body, ..
        } => {
            let target = match left {
                ForInLeft::VariableDeclaration { declarations, .. } => match declarations.as_slice() {
                    [declarator] => Expr::ident(declarator.id.clone()),
                    _ => {
                        return Control::Throw(Value::syntax_error(
                            "for-in declares exactly one variable",
                        ))
                    }
                },
                ForInLeft::Identifier { name, .. } => Expr::ident(name.clone()),
            };
            let object = eval_or_throw!(right, act);
            for key in object.keys() {
                if let Err(error) = assign_target(&target, Value::Str(key), act) {
                    return Control::Throw(error);
                }
                if let LoopStep::Exit(control) = after_body(exec_stmt(body, act), labels) {
                    return control;
                }
            }
            Control::None
        }

        Stmt::WhileStatement { test, body, .. } => loop {
            if !eval_or_throw!(test, act).is_truthy() {
                return Control::None;
            }
            if let LoopStep::Exit(control) = after_body(exec_stmt(body, act), labels) {
                return control;
            }
        },

        Stmt::DoWhileStatement { body, test, .. } => loop {
            if let LoopStep::Exit(control) = after_body(exec_stmt(body, act), labels) {
                return control;
            }
            if !eval_or_throw!(test, act).is_truthy() {
                return Control::None;
            }
        },

        Stmt::SwitchStatement {
            discriminant,
            cases,
            ..
        } => {
            let value = eval_or_throw!(discriminant, act);
            let mut start = None;
            for (index, case) in cases.iter().enumerate() {
                if let Some(test) = &case.test {
                    if eval_or_throw!(test, act).strict_equals(&value) {
                        start = Some(index);
                        break;
                    }
                }
            }
            let start = start.or_else(|| cases.iter().position(|case| case.test.is_none()));
            let Some(start) = start else {
                return Control::None;
            };
            // fall through from the selected case
            for case in &cases[start..] {
                match exec_block(&case.consequent, act) {
                    Control::None => {}
                    Control::Break(None) => return Control::None,
                    other => return other,
                }
            }
            Control::None
        }

        Stmt::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            let mut control = exec_block(block, act);
            if let Some(handler) = handler {
                control = match control {
                    Control::Throw(error) => {
                        env::define(&act.env, &handler.param, error);
                        exec_block(&handler.body, act)
                    }
                    other => other,
                };
            }
            if let Some(finalizer) = finalizer {
                let after = exec_block(finalizer, act);
                if !after.is_none() {
                    return after;
                }
            }
            control
        }

        Stmt::BlockStatement { body, .. } => exec_block(body, act),

        Stmt::LabeledStatement { label, body, .. } => {
            let mut labels = labels.to_vec();
            labels.push(label.clone());
            match exec_labeled(body, &labels, act) {
                Control::Break(Some(target)) if &target == label => Control::None,
                other => other,
            }
        }
    }
}

fn declare(declarations: &[VariableDeclarator], act: &Activation) -> Control {
    for declarator in declarations {
        match &declarator.init {
            Some(init) => {
                let value = eval_or_throw!(init, act);
                env::define(&act.env, &declarator.id, value);
            }
            None => env::hoist_var(&act.env, &declarator.id),
        }
    }
    Control::None
}
