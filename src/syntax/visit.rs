//! Read-only tree walking
//!
//! Override the `visit_*` methods you care about and call the matching
//! `walk_*` function to keep descending. Nested function literals are
//! reported through `visit_function`; its default does descend.

use super::ast::{Expr, ForInLeft, Function, Stmt};

pub trait Visitor<'ast> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr)
    }

    fn visit_function(&mut self, function: &'ast Function) {
        walk_function(self, function)
    }
}

pub fn walk_function<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, function: &'ast Function) {
    for stmt in &function.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::ExpressionStatement { expression, .. } => visitor.visit_expr(expression),
        Stmt::VariableDeclaration { declarations, .. } => {
            for declarator in declarations {
                if let Some(init) = &declarator.init {
                    visitor.visit_expr(init);
                }
            }
        }
        Stmt::FunctionDeclaration(function) => visitor.visit_function(function),
        Stmt::ReturnStatement { argument, .. } => {
            if let Some(argument) = argument {
                visitor.visit_expr(argument);
            }
        }
        Stmt::ThrowStatement { argument, .. } => visitor.visit_expr(argument),
        Stmt::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(consequent);
            if let Some(alternate) = alternate {
                visitor.visit_stmt(alternate);
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
                visitor.visit_stmt(init);
            }
            if let Some(test) = test {
                visitor.visit_expr(test);
            }
            if let Some(update) = update {
                visitor.visit_expr(update);
            }
            visitor.visit_stmt(body);
        }
        Stmt::ForInStatement {
            left, right, body, ..
        } => {
            if let ForInLeft::VariableDeclaration { declarations, .. } = left {
                for declarator in declarations {
                    if let Some(init) = &declarator.init {
                        visitor.visit_expr(init);
                    }
                }
            }
            visitor.visit_expr(right);
            visitor.visit_stmt(body);
        }
        Stmt::WhileStatement { test, body, .. } | Stmt::DoWhileStatement { body, test, .. } => {
            visitor.visit_expr(test);
            visitor.visit_stmt(body);
        }
        Stmt::SwitchStatement {
            discriminant,
            cases,
            ..
        } => {
            visitor.visit_expr(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    visitor.visit_expr(test);
                }
                for stmt in &case.consequent {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            for stmt in block {
                visitor.visit_stmt(stmt);
            }
            if let Some(handler) = handler {
                for stmt in &handler.body {
                    visitor.visit_stmt(stmt);
                }
            }
            if let Some(finalizer) = finalizer {
                for stmt in finalizer {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::BlockStatement { body, .. } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        Stmt::LabeledStatement { body, .. } => visitor.visit_stmt(body),
        Stmt::BreakStatement { .. } | Stmt::ContinueStatement { .. } | Stmt::EmptyStatement { .. } => {}
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Identifier { .. } | Expr::Literal { .. } | Expr::ThisExpression { .. } => {}
        Expr::ArrayExpression { elements, .. } => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Expr::ObjectExpression { properties, .. } => {
            for property in properties {
                visitor.visit_expr(&property.value);
            }
        }
        Expr::FunctionExpression(function) => visitor.visit_function(function),
        Expr::UnaryExpression { argument, .. } | Expr::UpdateExpression { argument, .. } => {
            visitor.visit_expr(argument)
        }
        Expr::BinaryExpression { left, right, .. }
        | Expr::LogicalExpression { left, right, .. }
        | Expr::AssignmentExpression { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            visitor.visit_expr(test);
            visitor.visit_expr(consequent);
            visitor.visit_expr(alternate);
        }
        Expr::CallExpression {
            callee, arguments, ..
        }
        | Expr::NewExpression {
            callee, arguments, ..
        } => {
            visitor.visit_expr(callee);
            for argument in arguments {
                visitor.visit_expr(argument);
            }
        }
        Expr::MemberExpression {
            object,
            property,
            computed,
            ..
        } => {
            visitor.visit_expr(object);
            if *computed {
                visitor.visit_expr(property);
            }
        }
        Expr::SequenceExpression { expressions, .. } => {
            for expression in expressions {
                visitor.visit_expr(expression);
            }
        }
    }
}

/* ===================== Common queries ===================== */

/// Finds calls to one identifier, without entering nested functions
struct CallFinder<'n> {
    name: &'n str,
    found: bool,
}

impl<'ast, 'n> Visitor<'ast> for CallFinder<'n> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if self.found {
            return;
        }
        if expr.is_call_to(self.name) {
            self.found = true;
            return;
        }
        walk_expr(self, expr)
    }

    fn visit_function(&mut self, _function: &'ast Function) {}
}

pub fn stmt_calls(stmt: &Stmt, name: &str) -> bool {
    let mut finder = CallFinder { name, found: false };
    finder.visit_stmt(stmt);
    finder.found
}

pub fn expr_calls(expr: &Expr, name: &str) -> bool {
    let mut finder = CallFinder { name, found: false };
    finder.visit_expr(expr);
    finder.found
}

/// Finds function literals carrying a `compile` marker
struct Marked(bool);

impl<'ast> Visitor<'ast> for Marked {
    fn visit_function(&mut self, function: &'ast Function) {
        if function.compile.is_some() {
            self.0 = true;
        } else {
            walk_function(self, function);
        }
    }
}

/// True if any function literal inside carries a `compile` marker
pub fn has_marked_function(stmt: &Stmt) -> bool {
    let mut marked = Marked(false);
    marked.visit_stmt(stmt);
    marked.0
}

pub fn expr_has_marked_function(expr: &Expr) -> bool {
    let mut marked = Marked(false);
    marked.visit_expr(expr);
    marked.0
}
