//! Operator precedence table
//!
//! Used by the printer and the source emitter to decide when a fragment must
//! be re-wrapped in parentheses to keep its meaning.

use super::ast::{BinaryOp, Expr, LogicalOp};

/// Binding strength of an expression, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Sequence,
    Assignment,
    Conditional,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Postfix,
    /// member access, calls and `new`
    Member,
    Primary,
}

impl Precedence {
    /// The next tighter level, used for the right operand of left-associative operators
    pub fn tighter(self) -> Precedence {
        match self {
            Precedence::Sequence => Precedence::Assignment,
            Precedence::Assignment => Precedence::Conditional,
            Precedence::Conditional => Precedence::LogicalOr,
            Precedence::LogicalOr => Precedence::LogicalAnd,
            Precedence::LogicalAnd => Precedence::BitwiseOr,
            Precedence::BitwiseOr => Precedence::BitwiseXor,
            Precedence::BitwiseXor => Precedence::BitwiseAnd,
            Precedence::BitwiseAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Relational,
            Precedence::Relational => Precedence::Shift,
            Precedence::Shift => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary => Precedence::Postfix,
            Precedence::Postfix => Precedence::Member,
            Precedence::Member | Precedence::Primary => Precedence::Primary,
        }
    }
}

pub fn binary_precedence(op: BinaryOp) -> Precedence {
    match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => Precedence::Multiplicative,
        BinaryOp::Add | BinaryOp::Sub => Precedence::Additive,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => Precedence::Shift,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::In => {
            Precedence::Relational
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::StrictEq | BinaryOp::StrictNe => {
            Precedence::Equality
        }
        BinaryOp::BitAnd => Precedence::BitwiseAnd,
        BinaryOp::BitXor => Precedence::BitwiseXor,
        BinaryOp::BitOr => Precedence::BitwiseOr,
    }
}

pub fn logical_precedence(op: LogicalOp) -> Precedence {
    match op {
        LogicalOp::And => Precedence::LogicalAnd,
        LogicalOp::Or => Precedence::LogicalOr,
    }
}

/// Precedence of the outermost operator of an expression
pub fn precedence_of(expr: &Expr) -> Precedence {
    match expr {
        Expr::Identifier { .. }
        | Expr::Literal { .. }
        | Expr::ThisExpression { .. }
        | Expr::ArrayExpression { .. }
        | Expr::ObjectExpression { .. }
        | Expr::FunctionExpression(_) => Precedence::Primary,
        Expr::MemberExpression { .. } | Expr::CallExpression { .. } | Expr::NewExpression { .. } => {
            Precedence::Member
        }
        Expr::UpdateExpression { prefix: false, .. } => Precedence::Postfix,
        Expr::UpdateExpression { prefix: true, .. } | Expr::UnaryExpression { .. } => {
            Precedence::Unary
        }
        Expr::BinaryExpression { operator, .. } => binary_precedence(*operator),
        Expr::LogicalExpression { operator, .. } => logical_precedence(*operator),
        Expr::ConditionalExpression { .. } => Precedence::Conditional,
        Expr::AssignmentExpression { .. } => Precedence::Assignment,
        Expr::SequenceExpression { .. } => Precedence::Sequence,
    }
}

/// Wrap `text` in parentheses when `expr` binds looser than `required`
pub fn wrap(text: String, expr: &Expr, required: Precedence) -> String {
    if precedence_of(expr) < required {
        format!("({})", text)
    } else {
        text
    }
}
