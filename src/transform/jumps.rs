//! Jumps leaving a native fragment
//!
//! A fragment kept as `Raw` may still `return`, or `break`/`continue` out of
//! itself into the compiled construct around it. Labeled jumps must stay
//! inside the fragment.

use crate::error::CompileError;
use crate::syntax::Stmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escapes {
    pub returns: bool,
    pub breaks: bool,
    pub continues: bool,
}

impl Escapes {
    pub fn any(&self) -> bool {
        self.returns || self.breaks || self.continues
    }
}

#[derive(Default)]
struct Scan {
    loops: usize,
    switches: usize,
    /// (label, labels a loop)
    labels: Vec<(String, bool)>,
    escapes: Escapes,
}

/// Find the jumps leaving `stmt`; a labeled jump to a label outside it is an error
pub fn escapes(stmt: &Stmt) -> Result<Escapes, CompileError> {
    let mut scan = Scan::default();
    scan.stmt(stmt)?;
    Ok(scan.escapes)
}

fn is_loop(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::ForStatement { .. }
            | Stmt::ForInStatement { .. }
            | Stmt::WhileStatement { .. }
            | Stmt::DoWhileStatement { .. }
    )
}

impl Scan {
    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::ReturnStatement { .. } => self.escapes.returns = true,

            Stmt::BreakStatement { label: None, .. } => {
                if self.loops == 0 && self.switches == 0 {
                    self.escapes.breaks = true;
                }
            }
            Stmt::BreakStatement {
                label: Some(label),
                span,
            } => {
                if !self.labels.iter().any(|(l, _)| l == label) {
                    return Err(CompileError::unsupported(
                        format!("break to label '{}' across a compiled construct", label),
                        *span,
                    ));
                }
            }

            Stmt::ContinueStatement { label: None, .. } => {
                if self.loops == 0 {
                    self.escapes.continues = true;
                }
            }
            Stmt::ContinueStatement {
                label: Some(label),
                span,
            } => {
                if !self.labels.iter().any(|(l, is_loop)| l == label && *is_loop) {
                    return Err(CompileError::unsupported(
                        format!("continue to label '{}' across a compiled construct", label),
                        *span,
                    ));
                }
            }

            Stmt::IfStatement {
                consequent,
                alternate,
                ..
            } => {
                self.stmt(consequent)?;
                if let Some(alternate) = alternate {
                    self.stmt(alternate)?;
                }
            }

            Stmt::ForStatement { body, .. }
            | Stmt::ForInStatement { body, .. }
            | Stmt::WhileStatement { body, .. }
            | Stmt::DoWhileStatement { body, .. } => {
                self.loops += 1;
                let result = self.stmt(body);
                self.loops -= 1;
                result?;
            }

            Stmt::SwitchStatement { cases, .. } => {
                self.switches += 1;
                let result = cases
                    .iter()
                    .flat_map(|case| case.consequent.iter())
                    .try_for_each(|stmt| self.stmt(stmt));
                self.switches -= 1;
                result?;
            }

            Stmt::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.stmts(block)?;
                if let Some(handler) = handler {
                    self.stmts(&handler.body)?;
                }
                if let Some(finalizer) = finalizer {
                    self.stmts(finalizer)?;
                }
            }

            Stmt::BlockStatement { body, .. } => self.stmts(body)?,

            Stmt::LabeledStatement { label, body, .. } => {
                self.labels.push((label.clone(), is_loop(body)));
                let result = self.stmt(body);
                self.labels.pop();
                result?;
            }

            // function bodies are their own jump scope
            Stmt::FunctionDeclaration(_)
            | Stmt::ExpressionStatement { .. }
            | Stmt::VariableDeclaration { .. }
            | Stmt::ThrowStatement { .. }
            | Stmt::EmptyStatement { .. } => {}
        }
        Ok(())
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        stmts.iter().try_for_each(|stmt| self.stmt(stmt))
    }
}
