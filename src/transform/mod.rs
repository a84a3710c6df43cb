//! Statement-list transformer
//!
//! Turns a function body containing bind points into a `WindNode` tree.
//! Statements without bind points are kept whole as `Raw` fragments;
//! constructs that contain one become typed nodes whose bodies are
//! transformed recursively.

pub mod bind_point;
pub mod jumps;
pub mod wind;

pub use bind_point::{recognize, BindPoint};
pub use jumps::{escapes, Escapes};
pub use wind::*;

use crate::error::CompileError;
use crate::syntax::visit::{expr_calls, stmt_calls};
use crate::syntax::{AssignOp, Expr, ForInLeft, Span, Stmt, SwitchCase};
use std::rc::Rc;
use tracing::trace;

#[cfg(test)]
mod tests;

/// Transform a function body into its continuation tree
pub fn transform(body: &[Stmt], binder: &str) -> Result<NodeRef, CompileError> {
    let mut transformer = Transformer::new(binder);
    let root = transformer.block(body)?;
    trace!(binder, root = %root, "transformed function body");
    Ok(root)
}

/// What an unlabeled jump inside a typed construct would target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JumpTarget {
    Loop,
    Switch,
}

struct Transformer<'b> {
    binder: &'b str,
    targets: Vec<JumpTarget>,
    for_in_counter: usize,
}

fn delay(children: Vec<NodeRef>) -> NodeRef {
    Rc::new(WindNode::Delay { children })
}

impl<'b> Transformer<'b> {
    fn new(binder: &'b str) -> Self {
        Self {
            binder,
            targets: Vec::new(),
            for_in_counter: 0,
        }
    }

    fn binds(&self, stmt: &Stmt) -> bool {
        stmt_calls(stmt, self.binder)
    }

    fn binds_expr(&self, expr: &Expr) -> bool {
        expr_calls(expr, self.binder)
    }

    /// Reject a bind point in a position that is evaluated as an expression
    fn forbid(&self, expr: Option<&Expr>, position: &str, span: Span) -> Result<(), CompileError> {
        match expr {
            Some(expr) if self.binds_expr(expr) => Err(CompileError::unsupported(
                format!("bind point inside {}", position),
                span,
            )),
            _ => Ok(()),
        }
    }

    /// Block statements and labels around bind points dissolve into the list
    fn flatten<'s>(&self, stmt: &'s Stmt, out: &mut Vec<&'s Stmt>) {
        match stmt {
            Stmt::BlockStatement { body, .. } if self.binds(stmt) => {
                for inner in body {
                    self.flatten(inner, out);
                }
            }
            Stmt::LabeledStatement { body, .. } if self.binds(stmt) => self.flatten(body, out),
            _ => out.push(stmt),
        }
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<NodeRef, CompileError> {
        let mut flat = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.flatten(stmt, &mut flat);
        }
        self.statements(&flat)
    }

    fn body(&mut self, stmt: &Stmt) -> Result<NodeRef, CompileError> {
        self.block(std::slice::from_ref(stmt))
    }

    /// Transform one statement list into a `Delay`
    fn statements(&mut self, stmts: &[&Stmt]) -> Result<NodeRef, CompileError> {
        let mut children = Vec::new();
        let mut rest = stmts;

        while let Some((&stmt, tail)) = rest.split_first() {
            rest = tail;

            if let Some(point) = bind_point::recognize(stmt, self.binder)? {
                let continuation = match point.kind {
                    BindKind::Return => None,
                    _ => Some(self.statements(tail)?),
                };
                children.push(Rc::new(WindNode::Bind {
                    expr: point.expr,
                    kind: point.kind,
                    continuation,
                }));
                return Ok(delay(children));
            }

            if let Some(terminal) = self.terminal(stmt)? {
                // anything after the jump is unreachable
                children.push(Rc::new(terminal));
                return Ok(delay(children));
            }

            if !self.binds(stmt) {
                self.check_raw(stmt)?;
                children.push(Rc::new(WindNode::Raw(stmt.clone())));
                continue;
            }

            let node = self.compound(stmt, &mut children)?;
            if tail.is_empty() {
                children.push(node);
            } else {
                let second = self.statements(tail)?;
                children.push(Rc::new(WindNode::Combine {
                    first: node,
                    second,
                }));
            }
            return Ok(delay(children));
        }

        children.push(Rc::new(WindNode::Normal));
        Ok(delay(children))
    }

    /// `return`, `break`, `continue` and `throw` outside a bind point
    fn terminal(&self, stmt: &Stmt) -> Result<Option<WindNode>, CompileError> {
        let node = match stmt {
            Stmt::ReturnStatement { argument, span } => {
                self.forbid(argument.as_ref(), "a return value", *span)?;
                WindNode::Return(argument.clone())
            }
            Stmt::ThrowStatement { argument, span } => {
                self.forbid(Some(argument), "a thrown value", *span)?;
                WindNode::Throw(argument.clone())
            }
            Stmt::BreakStatement {
                label: Some(label),
                span,
            }
            | Stmt::ContinueStatement {
                label: Some(label),
                span,
            } => {
                return Err(CompileError::unsupported(
                    format!("jump to label '{}' across a compiled construct", label),
                    *span,
                ))
            }
            Stmt::BreakStatement { label: None, span } => {
                self.check_break(*span)?;
                WindNode::Break
            }
            Stmt::ContinueStatement { label: None, span } => {
                self.check_continue(*span)?;
                WindNode::Continue
            }
            _ => return Ok(None),
        };
        Ok(Some(node))
    }

    fn check_break(&self, span: Span) -> Result<(), CompileError> {
        match self.targets.last() {
            Some(JumpTarget::Loop) => Ok(()),
            Some(JumpTarget::Switch) => Err(CompileError::unsupported(
                "break inside a compiled switch case that does not end the case",
                span,
            )),
            None => Err(CompileError::unsupported("break outside a loop", span)),
        }
    }

    fn check_continue(&self, span: Span) -> Result<(), CompileError> {
        if self.targets.contains(&JumpTarget::Loop) {
            Ok(())
        } else {
            Err(CompileError::unsupported("continue outside a loop", span))
        }
    }

    /// A native fragment may only jump to targets that exist around it
    fn check_raw(&self, stmt: &Stmt) -> Result<(), CompileError> {
        let escapes = jumps::escapes(stmt)?;
        if escapes.breaks {
            self.check_break(stmt.span())?;
        }
        if escapes.continues {
            self.check_continue(stmt.span())?;
        }
        Ok(())
    }

    fn nested(&mut self, target: JumpTarget, stmt: &Stmt) -> Result<NodeRef, CompileError> {
        self.targets.push(target);
        let body = self.body(stmt);
        self.targets.pop();
        body
    }

    /// A construct with a bind point somewhere inside
    fn compound(
        &mut self,
        stmt: &Stmt,
        children: &mut Vec<NodeRef>,
    ) -> Result<NodeRef, CompileError> {
        let node = match stmt {
            Stmt::IfStatement { .. } => {
                let mut branches = Vec::new();
                let mut otherwise = None;
                let mut current = stmt;
                loop {
                    match current {
                        Stmt::IfStatement {
                            test,
                            consequent,
                            alternate,
                            span,
                        } => {
                            self.forbid(Some(test), "a condition", *span)?;
                            branches.push((test.clone(), self.body(consequent)?));
                            match alternate {
                                Some(alternate) => current = alternate,
                                None => break,
                            }
                        }
                        other => {
                            otherwise = Some(self.body(other)?);
                            break;
                        }
                    }
                }
                WindNode::If {
                    branches,
                    otherwise,
                }
            }

            Stmt::ForStatement {
                init,
                test,
                update,
                body,
                span,
            } => {
                if init.as_deref().is_some_and(|init| self.binds(init)) {
                    return Err(CompileError::unsupported(
                        "bind point inside a loop header",
                        *span,
                    ));
                }
                self.forbid(test.as_ref(), "a loop header", *span)?;
                self.forbid(update.as_ref(), "a loop header", *span)?;
                WindNode::For {
                    init: init.as_deref().cloned(),
                    test: test.clone().map(Rc::new),
                    update: update.clone().map(Rc::new),
                    body: self.nested(JumpTarget::Loop, body)?,
                }
            }

            Stmt::ForInStatement {
                left,
                right,
                body,
                span,
            } => {
                self.forbid(Some(right), "a loop header", *span)?;
                let target = match left {
                    ForInLeft::Identifier { name, .. } => name.clone(),
                    ForInLeft::VariableDeclaration {
                        kind, declarations, ..
                    } => match declarations.as_slice() {
                        [declarator] if declarator.init.is_none() => {
                            children.push(Rc::new(WindNode::Raw(Stmt::VariableDeclaration {
                                kind: *kind,
                                declarations: vec![declarator.clone()],
                                span: Span::default(),
                            })));
                            declarator.id.clone()
                        }
                        _ => {
                            return Err(CompileError::unsupported(
                                "for-in over anything but a single name",
                                *span,
                            ))
                        }
                    },
                };

                let key_param = format!("_forIn_key${}", self.for_in_counter);
                self.for_in_counter += 1;

                let assign = Stmt::ExpressionStatement {
                    expression: Expr::AssignmentExpression {
                        operator: AssignOp::Assign,
                        left: Box::new(Expr::ident(target.as_str())),
                        right: Box::new(Expr::ident(key_param.as_str())),
                        span: Span::default(),
                    },
                    span: Span::default(),
                };
                let mut flat = vec![&assign];
                self.flatten(body, &mut flat);
                self.targets.push(JumpTarget::Loop);
                let body = self.statements(&flat);
                self.targets.pop();

                WindNode::ForIn {
                    target,
                    key_param,
                    object: right.clone(),
                    body: body?,
                }
            }

            Stmt::WhileStatement { test, body, span } => {
                self.forbid(Some(test), "a loop condition", *span)?;
                WindNode::While {
                    test: Rc::new(test.clone()),
                    body: self.nested(JumpTarget::Loop, body)?,
                }
            }

            Stmt::DoWhileStatement { body, test, span } => {
                self.forbid(Some(test), "a loop condition", *span)?;
                WindNode::Do {
                    body: self.nested(JumpTarget::Loop, body)?,
                    test: Rc::new(test.clone()),
                }
            }

            Stmt::SwitchStatement {
                discriminant,
                cases,
                span,
            } => {
                self.forbid(Some(discriminant), "a switch discriminant", *span)?;
                for case in cases {
                    self.forbid(case.test.as_ref(), "a case test", case.span)?;
                }

                self.targets.push(JumpTarget::Switch);
                let arms = (0..cases.len())
                    .map(|i| {
                        let flat = fallthrough(&cases[i..]);
                        Ok(SwitchArm {
                            test: cases[i].test.clone(),
                            body: self.statements(&flat)?,
                        })
                    })
                    .collect::<Result<Vec<_>, CompileError>>();
                self.targets.pop();

                WindNode::Switch {
                    discriminant: discriminant.clone(),
                    cases: arms?,
                }
            }

            Stmt::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                let body = self.block(block)?;
                let catch = match handler {
                    Some(handler) => Some((handler.param.clone(), self.block(&handler.body)?)),
                    None => None,
                };
                let finally = match finalizer {
                    Some(finalizer) => Some(self.block(finalizer)?),
                    None => None,
                };
                WindNode::Try {
                    body,
                    catch,
                    finally,
                }
            }

            Stmt::VariableDeclaration { span, .. } => {
                return Err(CompileError::unsupported(
                    "bind point inside a variable initializer",
                    *span,
                ))
            }
            other => {
                return Err(CompileError::unsupported(
                    format!("bind point nested inside {}", other.kind_name()),
                    other.span(),
                ))
            }
        };
        Ok(Rc::new(node))
    }
}

/// The statements a case runs: its own and every following case's, up to
/// the first unlabeled `break` at case level
fn fallthrough(cases: &[SwitchCase]) -> Vec<&Stmt> {
    fn push<'s>(stmt: &'s Stmt, out: &mut Vec<&'s Stmt>) -> bool {
        match stmt {
            Stmt::BreakStatement { label: None, .. } => false,
            Stmt::BlockStatement { body, .. } => body.iter().all(|inner| push(inner, out)),
            _ => {
                out.push(stmt);
                true
            }
        }
    }

    let mut out = Vec::new();
    for case in cases {
        for stmt in &case.consequent {
            if !push(stmt, &mut out) {
                return out;
            }
        }
    }
    out
}
