//! Callable emitter
//!
//! Runs a `WindNode` tree directly: every node becomes a builder call,
//! `Raw` fragments and header expressions go through the interpreter.

use crate::builder::{
    Action, BoxStep, Builder, CatchHandler, Predicate, StepFactory, StepResult,
};
use crate::compiler::Compiler;
use crate::interpreter::{self, env, Activation, Control, Env, EvalResult};
use crate::syntax::{Expr, Function, Stmt};
use crate::transform::{BindKind, NodeRef, WindNode};
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// A marked function compiled against one builder
pub struct CompiledFunction {
    name: String,
    params: Vec<String>,
    body: Rc<Vec<Stmt>>,
    root: NodeRef,
    builder: Rc<dyn Builder>,
}

impl CompiledFunction {
    pub fn new(function: &Function, root: NodeRef, builder: Rc<dyn Builder>) -> Self {
        Self {
            name: function.id.clone().unwrap_or_default(),
            params: function.params.clone(),
            body: Rc::new(function.body.clone()),
            root,
            builder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    pub fn builder(&self) -> &Rc<dyn Builder> {
        &self.builder
    }

    /// Call the function: bind parameters, hoist declarations, then hand the
    /// root step to the builder's `start`
    pub fn invoke(
        &self,
        this: Value,
        args: Vec<Value>,
        closure: &Env,
        compiler: &Rc<Compiler>,
    ) -> EvalResult {
        let scope = env::new_env(Some(closure.clone()));
        let mut args = args.into_iter();
        for param in &self.params {
            env::define(&scope, param, args.next().unwrap_or_default());
        }

        let act = Activation::new(scope, this.clone(), compiler.clone());
        interpreter::hoist(&self.body, &act);

        trace!(function = %self.name, builder = self.builder.name(), "starting compiled function");
        let runner = Runner {
            act,
            builder: self.builder.clone(),
        };
        let root = runner.deferred(&self.root);
        self.builder.start(this, root)
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("builder", &self.builder.name())
            .field("root", &self.root.to_string())
            .finish()
    }
}

/// Builds steps for one activation of a compiled function
#[derive(Clone)]
struct Runner {
    act: Activation,
    builder: Rc<dyn Builder>,
}

impl Runner {
    fn eval(&self, expr: &Expr) -> EvalResult {
        interpreter::eval(expr, &self.act)
    }

    /// A node in deferred position: wrapped in `delay` unless it is lazy
    fn deferred(&self, node: &NodeRef) -> BoxStep {
        if let Some(lazy) = node.collapsed() {
            return self.build(lazy).unwrap_or_else(|error| self.builder.throw(error));
        }
        let runner = self.clone();
        let node = node.clone();
        self.builder.delay(Box::new(move || runner.build(&node)))
    }

    fn factory(&self, body: &NodeRef) -> StepFactory {
        let runner = self.clone();
        let body = body.clone();
        Rc::new(move || -> StepResult { Ok(runner.deferred(&body)) })
    }

    fn predicate(&self, test: &Rc<Expr>) -> Predicate {
        let runner = self.clone();
        let test = test.clone();
        Rc::new(move || -> Result<bool, Value> { Ok(runner.eval(&test)?.is_truthy()) })
    }

    /// Run a raw statement; a jump out of it ends the current list
    fn raw(&self, stmt: &Stmt) -> Result<Option<BoxStep>, Value> {
        match interpreter::exec_stmt(stmt, &self.act) {
            Control::None => Ok(None),
            Control::Return(value) => Ok(Some(self.builder.return_value(value))),
            Control::Break(_) => Ok(Some(self.builder.break_loop())),
            Control::Continue(_) => Ok(Some(self.builder.continue_loop())),
            Control::Throw(error) => Err(error),
        }
    }

    /// Build the step for `node`, evaluating whatever it needs up front
    fn build(&self, node: &NodeRef) -> StepResult {
        let builder = &self.builder;
        match node.as_ref() {
            WindNode::Delay { children } => {
                let Some((raws, tail)) = node.split_delay() else {
                    return Ok(builder.normal());
                };
                debug_assert_eq!(raws.len() + 1, children.len());
                for raw in raws {
                    let WindNode::Raw(stmt) = raw.as_ref() else {
                        return Err(Value::syntax_error(format!(
                            "{} node before the tail of a statement list",
                            raw.kind_name()
                        )));
                    };
                    if let Some(jump) = self.raw(stmt)? {
                        return Ok(jump);
                    }
                }
                self.build(tail)
            }

            WindNode::Combine { first, second } => {
                Ok(builder.combine(self.build(first)?, self.deferred(second)))
            }

            WindNode::Bind {
                expr,
                kind,
                continuation,
            } => {
                let operand = self.eval(expr)?;
                let runner = self.clone();
                let kind = kind.clone();
                let continuation = continuation.clone();
                Ok(builder.bind(
                    operand,
                    Box::new(move |value: Value| -> StepResult {
                        match &kind {
                            BindKind::Discard => {}
                            BindKind::Declare(name) => env::define(&runner.act.env, name, value),
                            BindKind::Assign(target) => {
                                interpreter::assign_target(target, value, &runner.act)?
                            }
                            BindKind::Return => return Ok(runner.builder.return_value(value)),
                        }
                        match &continuation {
                            Some(next) => runner.build(next),
                            None => Ok(runner.builder.normal()),
                        }
                    }),
                ))
            }

            WindNode::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    if let Some(jump) = self.raw(init)? {
                        return Ok(jump);
                    }
                }
                let test = test.as_ref().map(|test| self.predicate(test));
                let update = update.as_ref().map(|update| {
                    let runner = self.clone();
                    let update = update.clone();
                    Rc::new(move || runner.eval(&update).map(|_| ())) as Action
                });
                Ok(builder.for_loop(test, update, self.factory(body)))
            }

            WindNode::ForIn {
                key_param,
                object,
                body,
                ..
            } => {
                let object = self.eval(object)?;
                let runner = self.clone();
                let key_param = key_param.clone();
                let body = body.clone();
                Ok(builder.for_in(
                    object,
                    Rc::new(move |key: Value| -> StepResult {
                        env::define(&runner.act.env, &key_param, key);
                        Ok(runner.deferred(&body))
                    }),
                ))
            }

            WindNode::While { test, body } => {
                Ok(builder.while_loop(self.predicate(test), self.factory(body)))
            }

            WindNode::Do { body, test } => {
                Ok(builder.do_loop(self.factory(body), self.predicate(test)))
            }

            WindNode::If {
                branches,
                otherwise,
            } => {
                for (test, branch) in branches {
                    if self.eval(test)?.is_truthy() {
                        return self.build(branch);
                    }
                }
                match otherwise {
                    Some(otherwise) => self.build(otherwise),
                    None => Ok(builder.normal()),
                }
            }

            WindNode::Switch {
                discriminant,
                cases,
            } => {
                let value = self.eval(discriminant)?;
                for arm in cases {
                    if let Some(test) = &arm.test {
                        if value.strict_equals(&self.eval(test)?) {
                            return self.build(&arm.body);
                        }
                    }
                }
                match cases.iter().find(|arm| arm.test.is_none()) {
                    Some(default) => self.build(&default.body),
                    None => Ok(builder.normal()),
                }
            }

            WindNode::Try {
                body,
                catch,
                finally,
            } => {
                let catch = catch.as_ref().map(|(param, handler)| {
                    let runner = self.clone();
                    let param = param.clone();
                    let handler = handler.clone();
                    Box::new(move |error: Value| -> StepResult {
                        env::define(&runner.act.env, &param, error);
                        runner.build(&handler)
                    }) as CatchHandler
                });
                let finally = finally.as_ref().map(|finally| self.deferred(finally));
                Ok(builder.try_catch(self.deferred(body), catch, finally))
            }

            WindNode::Raw(stmt) => Ok(self.raw(stmt)?.unwrap_or_else(|| builder.normal())),
            WindNode::Normal => Ok(builder.normal()),
            WindNode::Return(None) => Ok(builder.return_value(Value::Undefined)),
            WindNode::Return(Some(value)) => Ok(builder.return_value(self.eval(value)?)),
            WindNode::Break => Ok(builder.break_loop()),
            WindNode::Continue => Ok(builder.continue_loop()),
            WindNode::Throw(error) => Ok(builder.throw(self.eval(error)?)),
        }
    }
}
