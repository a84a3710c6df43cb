//! Bind-point recognition
//!
//! A bind point is one of four statement shapes around a call to the binder:
//!
//! ```text
//! bind(E);
//! var x = bind(E);
//! x = bind(E);        // or a.b = bind(E);
//! return bind(E);
//! ```
//!
//! A binder call anywhere else is rejected.

use super::wind::BindKind;
use crate::error::CompileError;
use crate::syntax::visit::expr_calls;
use crate::syntax::{AssignOp, Expr, Span, Stmt};
use std::rc::Rc;

#[derive(Debug)]
pub struct BindPoint {
    pub expr: Rc<Expr>,
    pub kind: BindKind,
    pub span: Span,
}

/// The bind point `stmt` forms, if any
pub fn recognize(stmt: &Stmt, binder: &str) -> Result<Option<BindPoint>, CompileError> {
    let (call, kind) = match stmt {
        Stmt::ExpressionStatement { expression, .. } => match expression {
            call if call.is_call_to(binder) => (call, BindKind::Discard),
            Expr::AssignmentExpression {
                operator: AssignOp::Assign,
                left,
                right,
                ..
            } if right.is_call_to(binder) => {
                if !matches!(
                    left.as_ref(),
                    Expr::Identifier { .. } | Expr::MemberExpression { .. }
                ) || expr_calls(left, binder)
                {
                    return Err(CompileError::unsupported(
                        "bind target must be an identifier or member expression",
                        stmt.span(),
                    ));
                }
                (right.as_ref(), BindKind::Assign(Rc::new(left.as_ref().clone())))
            }
            _ => return Ok(None),
        },

        Stmt::VariableDeclaration { declarations, .. } => {
            let binds = declarations
                .iter()
                .filter(|d| d.init.as_ref().is_some_and(|init| init.is_call_to(binder)))
                .count();
            if binds == 0 {
                return Ok(None);
            }
            if declarations.len() != 1 {
                return Err(CompileError::unsupported(
                    "bind point in a declaration with several declarators",
                    stmt.span(),
                ));
            }
            let declarator = &declarations[0];
            match &declarator.init {
                Some(init) => (init, BindKind::Declare(declarator.id.clone())),
                None => return Ok(None),
            }
        }

        Stmt::ReturnStatement {
            argument: Some(argument),
            ..
        } if argument.is_call_to(binder) => (argument, BindKind::Return),

        _ => return Ok(None),
    };

    let Expr::CallExpression { arguments, .. } = call else {
        return Ok(None);
    };
    match arguments.as_slice() {
        [operand] if !expr_calls(operand, binder) => Ok(Some(BindPoint {
            expr: Rc::new(operand.clone()),
            kind,
            span: stmt.span(),
        })),
        [_] => Err(CompileError::unsupported(
            "nested bind point inside a bind operand",
            stmt.span(),
        )),
        _ => Err(CompileError::unsupported(
            format!("bind point takes exactly one operand, got {}", arguments.len()),
            stmt.span(),
        )),
    }
}
