//! Test helpers for building syntax trees
//!
//! Shorthand constructors so tests can write programs without JSON. The
//! binder used throughout is `$await`.

use crate::syntax::{
    AssignOp, BinaryOp, CatchClause, Expr, ForInLeft, Function, Lit, Property, Span, Stmt,
    SwitchCase, UpdateOp, VarKind, VariableDeclarator,
};

pub const BINDER: &str = "$await";

/* ===================== Expressions ===================== */

pub fn id(name: &str) -> Expr {
    Expr::ident(name)
}

pub fn num(n: f64) -> Expr {
    Expr::Literal {
        value: Lit::Num(n),
        span: Span::default(),
    }
}

pub fn text(s: &str) -> Expr {
    Expr::Literal {
        value: Lit::Str(s.to_string()),
        span: Span::default(),
    }
}

pub fn null() -> Expr {
    Expr::Literal {
        value: Lit::Null,
        span: Span::default(),
    }
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal {
        value: Lit::Bool(b),
        span: Span::default(),
    }
}

pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
    Expr::CallExpression {
        callee: Box::new(callee),
        arguments,
        span: Span::default(),
    }
}

pub fn call_fn(name: &str, arguments: Vec<Expr>) -> Expr {
    call(id(name), arguments)
}

pub fn member(object: Expr, property: &str) -> Expr {
    Expr::MemberExpression {
        object: Box::new(object),
        property: Box::new(id(property)),
        computed: false,
        span: Span::default(),
    }
}

pub fn index(object: Expr, key: Expr) -> Expr {
    Expr::MemberExpression {
        object: Box::new(object),
        property: Box::new(key),
        computed: true,
        span: Span::default(),
    }
}

pub fn bin(operator: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::default(),
    }
}

pub fn assign(left: Expr, right: Expr) -> Expr {
    Expr::AssignmentExpression {
        operator: AssignOp::Assign,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::default(),
    }
}

pub fn add_assign(left: Expr, right: Expr) -> Expr {
    Expr::AssignmentExpression {
        operator: AssignOp::Add,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::default(),
    }
}

/// `name++`
pub fn inc(name: &str) -> Expr {
    Expr::UpdateExpression {
        operator: UpdateOp::Increment,
        prefix: false,
        argument: Box::new(id(name)),
        span: Span::default(),
    }
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::ArrayExpression {
        elements,
        span: Span::default(),
    }
}

pub fn object(properties: Vec<(&str, Expr)>) -> Expr {
    Expr::ObjectExpression {
        properties: properties
            .into_iter()
            .map(|(key, value)| Property {
                key: key.to_string(),
                value,
                span: Span::default(),
            })
            .collect(),
        span: Span::default(),
    }
}

pub fn func_expr(function: Function) -> Expr {
    Expr::FunctionExpression(function)
}

/// `$await(operand)`
pub fn bind(operand: Expr) -> Expr {
    call_fn(BINDER, vec![operand])
}

/// `Task.sleep(ms)`
pub fn sleep(ms: f64) -> Expr {
    call(member(id("Task"), "sleep"), vec![num(ms)])
}

/* ===================== Statements ===================== */

pub fn expr(expression: Expr) -> Stmt {
    Stmt::ExpressionStatement {
        expression,
        span: Span::default(),
    }
}

pub fn var(name: &str, init: Expr) -> Stmt {
    Stmt::VariableDeclaration {
        kind: VarKind::Var,
        declarations: vec![declarator(name, Some(init))],
        span: Span::default(),
    }
}

pub fn declarator(name: &str, init: Option<Expr>) -> VariableDeclarator {
    VariableDeclarator {
        id: name.to_string(),
        init,
        span: Span::default(),
    }
}

pub fn ret(argument: Expr) -> Stmt {
    Stmt::ReturnStatement {
        argument: Some(argument),
        span: Span::default(),
    }
}

pub fn ret_none() -> Stmt {
    Stmt::ReturnStatement {
        argument: None,
        span: Span::default(),
    }
}

pub fn brk() -> Stmt {
    Stmt::BreakStatement {
        label: None,
        span: Span::default(),
    }
}

pub fn brk_to(label: &str) -> Stmt {
    Stmt::BreakStatement {
        label: Some(label.to_string()),
        span: Span::default(),
    }
}

pub fn cont() -> Stmt {
    Stmt::ContinueStatement {
        label: None,
        span: Span::default(),
    }
}

pub fn throw(argument: Expr) -> Stmt {
    Stmt::ThrowStatement {
        argument,
        span: Span::default(),
    }
}

pub fn block(body: Vec<Stmt>) -> Stmt {
    Stmt::BlockStatement {
        body,
        span: Span::default(),
    }
}

pub fn if_(test: Expr, consequent: Vec<Stmt>, alternate: Option<Vec<Stmt>>) -> Stmt {
    Stmt::IfStatement {
        test,
        consequent: Box::new(block(consequent)),
        alternate: alternate.map(|alt| Box::new(block(alt))),
        span: Span::default(),
    }
}

pub fn while_(test: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::WhileStatement {
        test,
        body: Box::new(block(body)),
        span: Span::default(),
    }
}

pub fn do_(body: Vec<Stmt>, test: Expr) -> Stmt {
    Stmt::DoWhileStatement {
        body: Box::new(block(body)),
        test,
        span: Span::default(),
    }
}

pub fn for_(init: Option<Stmt>, test: Option<Expr>, update: Option<Expr>, body: Vec<Stmt>) -> Stmt {
    Stmt::ForStatement {
        init: init.map(Box::new),
        test,
        update,
        body: Box::new(block(body)),
        span: Span::default(),
    }
}

/// `for (var name in object) { body }`
pub fn for_in(name: &str, object: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::ForInStatement {
        left: ForInLeft::VariableDeclaration {
            kind: VarKind::Var,
            declarations: vec![declarator(name, None)],
            span: Span::default(),
        },
        right: object,
        body: Box::new(block(body)),
        span: Span::default(),
    }
}

pub fn switch(discriminant: Expr, cases: Vec<(Option<Expr>, Vec<Stmt>)>) -> Stmt {
    Stmt::SwitchStatement {
        discriminant,
        cases: cases
            .into_iter()
            .map(|(test, consequent)| SwitchCase {
                test,
                consequent,
                span: Span::default(),
            })
            .collect(),
        span: Span::default(),
    }
}

pub fn try_(
    block: Vec<Stmt>,
    handler: Option<(&str, Vec<Stmt>)>,
    finalizer: Option<Vec<Stmt>>,
) -> Stmt {
    Stmt::TryStatement {
        block,
        handler: handler.map(|(param, body)| CatchClause {
            param: param.to_string(),
            body,
            span: Span::default(),
        }),
        finalizer,
        span: Span::default(),
    }
}

pub fn labeled(label: &str, body: Stmt) -> Stmt {
    Stmt::LabeledStatement {
        label: label.to_string(),
        body: Box::new(body),
        span: Span::default(),
    }
}

/// `log(args...)`, recorded by the interpreter test harness
pub fn log(arguments: Vec<Expr>) -> Stmt {
    expr(call_fn("log", arguments))
}

/* ===================== Functions ===================== */

pub fn func(name: &str, params: &[&str], body: Vec<Stmt>) -> Function {
    Function {
        id: Some(name.to_string()),
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
        compile: None,
        span: Span::default(),
    }
}

/// A function carrying a `compile` marker for `builder`
pub fn marked(name: &str, params: &[&str], body: Vec<Stmt>, builder: &str) -> Function {
    Function {
        compile: Some(builder.to_string()),
        ..func(name, params, body)
    }
}

pub fn async_fn(name: &str, params: &[&str], body: Vec<Stmt>) -> Function {
    marked(name, params, body, "async")
}

pub fn declare(function: Function) -> Stmt {
    Stmt::FunctionDeclaration(function)
}
