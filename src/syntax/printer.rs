//! Syntax tree printer
//!
//! Turns statements and expressions back into source text, adding
//! parentheses only where the precedence table requires them. The source
//! emitter uses it for `Raw` fragments. When jump rewriting is enabled,
//! `return`/`break`/`continue` statements that leave the fragment become
//! builder terminal calls.

use super::ast::{Expr, ForInLeft, Function, Lit, Stmt, UnaryOp, VariableDeclarator};
use super::precedence::{binary_precedence, logical_precedence, wrap, Precedence};

const INDENT: &str = "    ";

/// Replacement text for functions carrying a `compile` marker
pub type FunctionHook<'a> = &'a dyn Fn(&Function, usize) -> Option<String>;

/// Rewrites jumps that escape the printed fragment into builder terminals
#[derive(Debug, Clone)]
struct JumpRewrite {
    builder: String,
    loops: usize,
    switches: usize,
}

pub struct Printer<'a> {
    out: String,
    indent: usize,
    jumps: Option<JumpRewrite>,
    functions: Option<FunctionHook<'a>>,
}

impl<'a> Default for Printer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Printer<'a> {
    pub fn new() -> Self {
        Printer {
            out: String::new(),
            indent: 0,
            jumps: None,
            functions: None,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Rewrite escaping jumps into `return <builder>.Return(..)` style calls
    pub fn rewrite_jumps(mut self, builder: impl Into<String>) -> Self {
        self.jumps = Some(JumpRewrite {
            builder: builder.into(),
            loops: 0,
            switches: 0,
        });
        self
    }

    pub fn with_functions(mut self, hook: FunctionHook<'a>) -> Self {
        self.functions = Some(hook);
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    /* ===================== Statements ===================== */

    pub fn statements(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.statement(stmt);
        }
    }

    pub fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::ExpressionStatement { expression, .. } => {
                let text = self.expression(expression, Precedence::Sequence);
                let text = match expression {
                    Expr::ObjectExpression { .. } | Expr::FunctionExpression(_) => {
                        format!("({})", text)
                    }
                    _ => text,
                };
                self.line(&format!("{};", text));
            }

            Stmt::VariableDeclaration {
                kind,
                declarations,
                ..
            } => {
                let text = self.declaration(kind.keyword(), declarations);
                self.line(&format!("{};", text));
            }

            Stmt::FunctionDeclaration(function) => {
                let text = self.function(function);
                self.line(&text);
            }

            Stmt::ReturnStatement { argument, .. } => {
                let value = argument
                    .as_ref()
                    .map(|arg| self.expression(arg, Precedence::Sequence));
                match (&self.jumps, value) {
                    (Some(jumps), Some(value)) => {
                        let line = format!(
                            "return {}.Return({});",
                            jumps.builder,
                            strip_sequence(value, argument.as_ref())
                        );
                        self.line(&line)
                    }
                    (Some(jumps), None) => {
                        let line = format!("return {}.Return();", jumps.builder);
                        self.line(&line)
                    }
                    (None, Some(value)) => self.line(&format!("return {};", value)),
                    (None, None) => self.line("return;"),
                }
            }

            Stmt::BreakStatement { label, .. } => match (label, &self.jumps) {
                (None, Some(jumps)) if jumps.loops == 0 && jumps.switches == 0 => {
                    let line = format!("return {}.Break();", jumps.builder);
                    self.line(&line)
                }
                (Some(label), _) => self.line(&format!("break {};", label)),
                (None, _) => self.line("break;"),
            },

            Stmt::ContinueStatement { label, .. } => match (label, &self.jumps) {
                (None, Some(jumps)) if jumps.loops == 0 => {
                    let line = format!("return {}.Continue();", jumps.builder);
                    self.line(&line)
                }
                (Some(label), _) => self.line(&format!("continue {};", label)),
                (None, _) => self.line("continue;"),
            },

            Stmt::ThrowStatement { argument, .. } => {
                let text = self.expression(argument, Precedence::Sequence);
                self.line(&format!("throw {};", text));
            }

            Stmt::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                let test = self.expression(test, Precedence::Sequence);
                self.line(&format!("if ({}) {{", test));
                self.nested(consequent);
                let mut next = alternate.as_deref();
                while let Some(alt) = next {
                    match alt {
                        Stmt::IfStatement {
                            test,
                            consequent,
                            alternate,
                            ..
                        } => {
                            let test = self.expression(test, Precedence::Sequence);
                            self.line(&format!("}} else if ({}) {{", test));
                            self.nested(consequent);
                            next = alternate.as_deref();
                        }
                        other => {
                            self.line("} else {");
                            self.nested(other);
                            next = None;
                        }
                    }
                }
                self.line("}");
            }

            Stmt::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => {
                let init = match init.as_deref() {
                    Some(Stmt::VariableDeclaration {
                        kind, declarations, ..
                    }) => self.declaration(kind.keyword(), declarations),
                    Some(Stmt::ExpressionStatement { expression, .. }) => {
                        self.expression(expression, Precedence::Sequence)
                    }
                    _ => String::new(),
                };
                let test = test
                    .as_ref()
                    .map(|t| self.expression(t, Precedence::Sequence))
                    .unwrap_or_default();
                let update = update
                    .as_ref()
                    .map(|u| self.expression(u, Precedence::Sequence))
                    .unwrap_or_default();
                self.line(&format!("for ({}; {}; {}) {{", init, test, update));
                self.in_loop(body);
                self.line("}");
            }

            Stmt::ForInStatement {
                left, right, body, ..
            } => {
                let left = match left {
                    ForInLeft::VariableDeclaration {
                        kind, declarations, ..
                    } => self.declaration(kind.keyword(), declarations),
                    ForInLeft::Identifier { name, .. } => name.clone(),
                };
                let right = self.expression(right, Precedence::Sequence);
                self.line(&format!("for ({} in {}) {{", left, right));
                self.in_loop(body);
                self.line("}");
            }

            Stmt::WhileStatement { test, body, .. } => {
                let test = self.expression(test, Precedence::Sequence);
                self.line(&format!("while ({}) {{", test));
                self.in_loop(body);
                self.line("}");
            }

            Stmt::DoWhileStatement { body, test, .. } => {
                self.line("do {");
                self.in_loop(body);
                let test = self.expression(test, Precedence::Sequence);
                self.line(&format!("}} while ({});", test));
            }

            Stmt::SwitchStatement {
                discriminant,
                cases,
                ..
            } => {
                let discriminant = self.expression(discriminant, Precedence::Sequence);
                self.line(&format!("switch ({}) {{", discriminant));
                if let Some(jumps) = self.jumps.as_mut() {
                    jumps.switches += 1;
                }
                self.indent += 1;
                for case in cases {
                    match &case.test {
                        Some(test) => {
                            let test = self.expression(test, Precedence::Sequence);
                            self.line(&format!("case {}:", test));
                        }
                        None => self.line("default:"),
                    }
                    self.indent += 1;
                    self.statements(&case.consequent);
                    self.indent -= 1;
                }
                self.indent -= 1;
                if let Some(jumps) = self.jumps.as_mut() {
                    jumps.switches -= 1;
                }
                self.line("}");
            }

            Stmt::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.line("try {");
                self.indented(block);
                if let Some(handler) = handler {
                    self.line(&format!("}} catch ({}) {{", handler.param));
                    self.indented(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.line("} finally {");
                    self.indented(finalizer);
                }
                self.line("}");
            }

            Stmt::BlockStatement { body, .. } => {
                self.line("{");
                self.indented(body);
                self.line("}");
            }

            Stmt::LabeledStatement { label, body, .. } => {
                self.line(&format!("{}:", label));
                self.statement(body);
            }

            Stmt::EmptyStatement { .. } => self.line(";"),
        }
    }

    fn declaration(&self, keyword: &str, declarations: &[VariableDeclarator]) -> String {
        let parts: Vec<String> = declarations
            .iter()
            .map(|d| match &d.init {
                Some(init) => format!("{} = {}", d.id, self.expression(init, Precedence::Assignment)),
                None => d.id.clone(),
            })
            .collect();
        format!("{} {}", keyword, parts.join(", "))
    }

    /// Print a statement as the body of a braced construct
    fn nested(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::BlockStatement { body, .. } => self.indented(body),
            other => {
                self.indent += 1;
                self.statement(other);
                self.indent -= 1;
            }
        }
    }

    fn in_loop(&mut self, body: &Stmt) {
        if let Some(jumps) = self.jumps.as_mut() {
            jumps.loops += 1;
        }
        self.nested(body);
        if let Some(jumps) = self.jumps.as_mut() {
            jumps.loops -= 1;
        }
    }

    fn indented(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        self.statements(stmts);
        self.indent -= 1;
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /* ===================== Expressions ===================== */

    /// Print an expression, parenthesized if it binds looser than `required`
    pub fn expression(&self, expr: &Expr, required: Precedence) -> String {
        let text = match expr {
            Expr::Identifier { name, .. } => name.clone(),
            Expr::Literal { value, .. } => literal(value),
            Expr::ThisExpression { .. } => "this".to_string(),

            Expr::ArrayExpression { elements, .. } => {
                let items: Vec<String> = elements
                    .iter()
                    .map(|e| self.expression(e, Precedence::Assignment))
                    .collect();
                format!("[{}]", items.join(", "))
            }

            Expr::ObjectExpression { properties, .. } => {
                if properties.is_empty() {
                    "{}".to_string()
                } else {
                    let items: Vec<String> = properties
                        .iter()
                        .map(|p| {
                            format!(
                                "{}: {}",
                                property_key(&p.key),
                                self.expression(&p.value, Precedence::Assignment)
                            )
                        })
                        .collect();
                    format!("{{ {} }}", items.join(", "))
                }
            }

            Expr::FunctionExpression(function) => self.function(function),

            Expr::UnaryExpression {
                operator, argument, ..
            } => {
                let arg = self.expression(argument, Precedence::Unary);
                match operator {
                    UnaryOp::TypeOf | UnaryOp::Void => format!("{} {}", operator.as_str(), arg),
                    UnaryOp::Minus | UnaryOp::Plus
                        if arg.starts_with('-') || arg.starts_with('+') =>
                    {
                        format!("{} {}", operator.as_str(), arg)
                    }
                    _ => format!("{}{}", operator.as_str(), arg),
                }
            }

            Expr::UpdateExpression {
                operator,
                prefix,
                argument,
                ..
            } => {
                let arg = self.expression(argument, Precedence::Member);
                if *prefix {
                    format!("{}{}", operator.as_str(), arg)
                } else {
                    format!("{}{}", arg, operator.as_str())
                }
            }

            Expr::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                let prec = binary_precedence(*operator);
                format!(
                    "{} {} {}",
                    self.expression(left, prec),
                    operator.as_str(),
                    self.expression(right, prec.tighter())
                )
            }

            Expr::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                let prec = logical_precedence(*operator);
                format!(
                    "{} {} {}",
                    self.expression(left, prec),
                    operator.as_str(),
                    self.expression(right, prec.tighter())
                )
            }

            Expr::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => format!(
                "{} {} {}",
                self.expression(left, Precedence::Member),
                operator.as_str(),
                self.expression(right, Precedence::Assignment)
            ),

            Expr::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => format!(
                "{} ? {} : {}",
                self.expression(test, Precedence::LogicalOr),
                self.expression(consequent, Precedence::Assignment),
                self.expression(alternate, Precedence::Assignment)
            ),

            Expr::CallExpression {
                callee, arguments, ..
            } => {
                let callee_text = match callee.as_ref() {
                    Expr::FunctionExpression(_) => format!("({})", self.expression(callee, Precedence::Primary)),
                    other => self.expression(other, Precedence::Member),
                };
                format!("{}({})", callee_text, self.arguments(arguments))
            }

            Expr::NewExpression {
                callee, arguments, ..
            } => {
                let callee_text = match callee.as_ref() {
                    Expr::CallExpression { .. } | Expr::FunctionExpression(_) => {
                        format!("({})", self.expression(callee, Precedence::Primary))
                    }
                    other => self.expression(other, Precedence::Member),
                };
                format!("new {}({})", callee_text, self.arguments(arguments))
            }

            Expr::MemberExpression {
                object,
                property,
                computed,
                ..
            } => {
                let object = self.expression(object, Precedence::Member);
                match (computed, property.as_ref()) {
                    (false, Expr::Identifier { name, .. }) => format!("{}.{}", object, name),
                    _ => format!(
                        "{}[{}]",
                        object,
                        self.expression(property, Precedence::Sequence)
                    ),
                }
            }

            Expr::SequenceExpression { expressions, .. } => {
                let items: Vec<String> = expressions
                    .iter()
                    .map(|e| self.expression(e, Precedence::Assignment))
                    .collect();
                items.join(", ")
            }
        };
        wrap(text, expr, required)
    }

    fn arguments(&self, args: &[Expr]) -> String {
        args.iter()
            .map(|a| self.expression(a, Precedence::Assignment))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Print a function literal, consulting the compile hook first
    pub fn function(&self, function: &Function) -> String {
        if function.compile.is_some() {
            if let Some(hook) = self.functions {
                if let Some(text) = hook(function, self.indent) {
                    return text;
                }
            }
        }

        let mut inner = Printer {
            out: String::new(),
            indent: self.indent + 1,
            jumps: None,
            functions: self.functions,
        };
        inner.statements(&function.body);

        let mut text = format!(
            "function {}({}) {{\n",
            function.id.as_deref().unwrap_or(""),
            function.params.join(", ")
        );
        text.push_str(&inner.out);
        for _ in 0..self.indent {
            text.push_str(INDENT);
        }
        text.push('}');
        text
    }
}

/// `return (a, b)` needs no parentheses inside a call argument list only
/// when the value is not a sequence
fn strip_sequence(value: String, expr: Option<&Expr>) -> String {
    match expr {
        Some(Expr::SequenceExpression { .. }) => format!("({})", value),
        _ => value,
    }
}

fn literal(value: &Lit) -> String {
    match value {
        Lit::Null => "null".to_string(),
        Lit::Bool(b) => b.to_string(),
        Lit::Num(n) => format_number(*n),
        Lit::Str(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s)),
    }
}

/// Number formatting shared with value display
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn property_key(key: &str) -> String {
    let is_ident = !key.is_empty()
        && key
            .chars()
            .next()
            .map(|c| c.is_alphabetic() || c == '_' || c == '$')
            .unwrap_or(false)
        && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        key.to_string()
    } else {
        serde_json::to_string(key).unwrap_or_else(|_| format!("\"{}\"", key))
    }
}

/* ===================== Convenience ===================== */

pub fn print_statements(stmts: &[Stmt]) -> String {
    let mut printer = Printer::new();
    printer.statements(stmts);
    printer.finish()
}

pub fn print_expr(expr: &Expr) -> String {
    Printer::new().expression(expr, Precedence::Sequence)
}
