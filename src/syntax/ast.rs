//! Abstract Syntax Tree node types
//!
//! ESTree-shaped nodes, as produced by the external parser and deserialized
//! from `{"type": "..."}` JSON. Identifiers that never carry expressions of
//! their own (declarator ids, parameter names, labels, object keys) are plain
//! strings.

use serde::{Deserialize, Serialize};

/// Source location span for re-slicing and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span that covers both self and other
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// True for spans the parser did not fill in
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Slice the original source text covered by this span
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        if self.is_empty() {
            return None;
        }
        source.get(self.start..self.end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Helper function for serde to skip serializing default spans
fn is_default_span(span: &Span) -> bool {
    *span == Span::default()
}

/// A whole compilation unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    #[default]
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// A single `name = init` inside a variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclarator {
    pub id: String,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Function literal shared by declarations and expressions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    /// Builder name set by an earlier pass on functions that must be compiled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// One `case test:` (or `default:`) arm of a switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    /// `None` for `default:`
    #[serde(default)]
    pub test: Option<Expr>,
    #[serde(default)]
    pub consequent: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// `catch (param) { body }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: String,
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Left side of a `for (left in right)` loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ForInLeft {
    VariableDeclaration {
        #[serde(default)]
        kind: VarKind,
        declarations: Vec<VariableDeclarator>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Identifier {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

/// Statement AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    ExpressionStatement {
        expression: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    VariableDeclaration {
        #[serde(default)]
        kind: VarKind,
        declarations: Vec<VariableDeclarator>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    FunctionDeclaration(Function),
    ReturnStatement {
        #[serde(default)]
        argument: Option<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    BreakStatement {
        #[serde(default)]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ContinueStatement {
        #[serde(default)]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ThrowStatement {
        argument: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    IfStatement {
        test: Expr,
        consequent: Box<Stmt>,
        #[serde(default)]
        alternate: Option<Box<Stmt>>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ForStatement {
        /// A `VariableDeclaration` or an `ExpressionStatement`
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        test: Option<Expr>,
        #[serde(default)]
        update: Option<Expr>,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ForInStatement {
        left: ForInLeft,
        right: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    WhileStatement {
        test: Expr,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    DoWhileStatement {
        body: Box<Stmt>,
        test: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    SwitchStatement {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    TryStatement {
        block: Vec<Stmt>,
        #[serde(default)]
        handler: Option<CatchClause>,
        #[serde(default)]
        finalizer: Option<Vec<Stmt>>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    BlockStatement {
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LabeledStatement {
        label: String,
        body: Box<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    EmptyStatement {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Stmt {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::ExpressionStatement { span, .. } => *span,
            Stmt::VariableDeclaration { span, .. } => *span,
            Stmt::FunctionDeclaration(function) => function.span,
            Stmt::ReturnStatement { span, .. } => *span,
            Stmt::BreakStatement { span, .. } => *span,
            Stmt::ContinueStatement { span, .. } => *span,
            Stmt::ThrowStatement { span, .. } => *span,
            Stmt::IfStatement { span, .. } => *span,
            Stmt::ForStatement { span, .. } => *span,
            Stmt::ForInStatement { span, .. } => *span,
            Stmt::WhileStatement { span, .. } => *span,
            Stmt::DoWhileStatement { span, .. } => *span,
            Stmt::SwitchStatement { span, .. } => *span,
            Stmt::TryStatement { span, .. } => *span,
            Stmt::BlockStatement { span, .. } => *span,
            Stmt::LabeledStatement { span, .. } => *span,
            Stmt::EmptyStatement { span } => *span,
        }
    }

    /// Short node name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::ExpressionStatement { .. } => "ExpressionStatement",
            Stmt::VariableDeclaration { .. } => "VariableDeclaration",
            Stmt::FunctionDeclaration(_) => "FunctionDeclaration",
            Stmt::ReturnStatement { .. } => "ReturnStatement",
            Stmt::BreakStatement { .. } => "BreakStatement",
            Stmt::ContinueStatement { .. } => "ContinueStatement",
            Stmt::ThrowStatement { .. } => "ThrowStatement",
            Stmt::IfStatement { .. } => "IfStatement",
            Stmt::ForStatement { .. } => "ForStatement",
            Stmt::ForInStatement { .. } => "ForInStatement",
            Stmt::WhileStatement { .. } => "WhileStatement",
            Stmt::DoWhileStatement { .. } => "DoWhileStatement",
            Stmt::SwitchStatement { .. } => "SwitchStatement",
            Stmt::TryStatement { .. } => "TryStatement",
            Stmt::BlockStatement { .. } => "BlockStatement",
            Stmt::LabeledStatement { .. } => "LabeledStatement",
            Stmt::EmptyStatement { .. } => "EmptyStatement",
        }
    }
}

/// Literal payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lit {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

/// `key: value` inside an object literal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    TypeOf,
    #[serde(rename = "void")]
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = ">>>")]
    UShr,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNe,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "|")]
    BitOr,
}

/// Binary operator for short-circuit evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Div,
    #[serde(rename = "%=")]
    Rem,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::BitNot => "~",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
        }
    }
}

impl UpdateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
        }
    }
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }

    /// The binary operator a compound assignment applies, if any
    pub fn binary(&self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
            AssignOp::Rem => Some(BinaryOp::Rem),
        }
    }
}

/// Expression AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Identifier {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Literal {
        value: Lit,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ThisExpression {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ArrayExpression {
        elements: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ObjectExpression {
        properties: Vec<Property>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    FunctionExpression(Function),
    UnaryExpression {
        operator: UnaryOp,
        argument: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    UpdateExpression {
        operator: UpdateOp,
        prefix: bool,
        argument: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    LogicalExpression {
        operator: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    AssignmentExpression {
        operator: AssignOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ConditionalExpression {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    CallExpression {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    NewExpression {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    MemberExpression {
        object: Box<Expr>,
        property: Box<Expr>,
        #[serde(default)]
        computed: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    SequenceExpression {
        expressions: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Expr {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. } => *span,
            Expr::Literal { span, .. } => *span,
            Expr::ThisExpression { span } => *span,
            Expr::ArrayExpression { span, .. } => *span,
            Expr::ObjectExpression { span, .. } => *span,
            Expr::FunctionExpression(function) => function.span,
            Expr::UnaryExpression { span, .. } => *span,
            Expr::UpdateExpression { span, .. } => *span,
            Expr::BinaryExpression { span, .. } => *span,
            Expr::LogicalExpression { span, .. } => *span,
            Expr::AssignmentExpression { span, .. } => *span,
            Expr::ConditionalExpression { span, .. } => *span,
            Expr::CallExpression { span, .. } => *span,
            Expr::NewExpression { span, .. } => *span,
            Expr::MemberExpression { span, .. } => *span,
            Expr::SequenceExpression { span, .. } => *span,
        }
    }

    /// Build an identifier reference with no span
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Identifier {
            name: name.into(),
            span: Span::default(),
        }
    }

    /// True if this is a call whose callee is the identifier `name`
    pub fn is_call_to(&self, name: &str) -> bool {
        match self {
            Expr::CallExpression { callee, .. } => {
                matches!(callee.as_ref(), Expr::Identifier { name: n, .. } if n == name)
            }
            _ => false,
        }
    }
}
