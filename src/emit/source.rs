//! Source emitter
//!
//! Re-emits a compiled function as source text that drives a builder
//! object resolved once per function:
//!
//! ```text
//! function name(a) {
//!     var _builder_$0 = Wind.builders["async"];
//!     return _builder_$0.Start(this,
//!         _builder_$0.Delay(function () {
//!             ...
//!         }));
//! }
//! ```

use crate::syntax::precedence::wrap;
use crate::syntax::printer::FunctionHook;
use crate::syntax::visit::{expr_has_marked_function, has_marked_function};
use crate::syntax::{Expr, Function, Precedence, Printer, Span, Stmt};
use crate::transform::{jumps, BindKind, WindNode};

const INDENT: &str = "    ";

fn pad(indent: usize) -> String {
    INDENT.repeat(indent)
}

pub struct SourceEmitter<'a> {
    builder_root: &'a str,
    builder_name: &'a str,
    /// `_builder_$N`
    var: String,
    source: Option<&'a str>,
    functions: Option<FunctionHook<'a>>,
    indent: usize,
    results: usize,
}

impl<'a> SourceEmitter<'a> {
    pub fn new(builder_root: &'a str, builder_name: &'a str, id: usize) -> Self {
        Self {
            builder_root,
            builder_name,
            var: format!("_builder_${}", id),
            source: None,
            functions: None,
            indent: 0,
            results: 0,
        }
    }

    /// Re-slice fragments from the text the spans point into
    pub fn with_source(mut self, source: Option<&'a str>) -> Self {
        self.source = source;
        self
    }

    /// Replacement text for marked functions nested in fragments
    pub fn with_functions(mut self, hook: FunctionHook<'a>) -> Self {
        self.functions = Some(hook);
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Emit `function` with `root` as its compiled body
    pub fn emit(mut self, function: &Function, root: &WindNode) -> String {
        let inner = pad(self.indent + 1);
        let builder_name = serde_json::to_string(self.builder_name)
            .unwrap_or_else(|_| format!("\"{}\"", self.builder_name));

        let start = self.deferred(root, self.indent + 2);
        let mut out = format!(
            "function {}({}) {{\n",
            function.id.as_deref().unwrap_or(""),
            function.params.join(", ")
        );
        out.push_str(&format!(
            "{}var {} = {}[{}];\n",
            inner, self.var, self.builder_root, builder_name
        ));
        out.push_str(&format!(
            "{}return {}.Start(this,\n{}{});\n",
            inner,
            self.var,
            pad(self.indent + 2),
            start
        ));
        out.push_str(&pad(self.indent));
        out.push('}');
        out
    }

    /* ===================== Fragments ===================== */

    fn slice(&self, span: Span) -> Option<&'a str> {
        self.source.and_then(|source| span.slice(source))
    }

    fn printer(&self, indent: usize) -> Printer<'a> {
        let printer = Printer::new().with_indent(indent);
        match self.functions {
            Some(hook) => printer.with_functions(hook),
            None => printer,
        }
    }

    fn expression(&self, expr: &Expr, required: Precedence, indent: usize) -> String {
        if !expr_has_marked_function(expr) {
            if let Some(text) = self.slice(expr.span()) {
                return wrap(text.to_string(), expr, required);
            }
        }
        self.printer(indent).expression(expr, required)
    }

    /// Lines for a raw statement; escaping jumps become builder terminals
    fn raw(&self, stmt: &Stmt, indent: usize) -> String {
        let verbatim = jumps::escapes(stmt).is_ok_and(|escapes| !escapes.any())
            && !has_marked_function(stmt);
        if verbatim {
            if let Some(text) = self.slice(stmt.span()) {
                return format!("{}{}\n", pad(indent), text);
            }
        }
        let mut printer = self.printer(indent).rewrite_jumps(self.var.clone());
        printer.statement(stmt);
        printer.finish()
    }

    /* ===================== Nodes ===================== */

    /// A node in deferred position
    fn deferred(&mut self, node: &WindNode, indent: usize) -> String {
        match node.collapsed() {
            Some(lazy) => self.step(lazy, indent),
            None => self.delayed(node, indent),
        }
    }

    fn delayed(&mut self, node: &WindNode, indent: usize) -> String {
        let body = self.body(node, indent + 1);
        format!("{}.Delay(function () {{\n{}{}}})", self.var, body, pad(indent))
    }

    fn thunk(&self, expr: &Expr, indent: usize) -> String {
        format!(
            "function () {{ return {}; }}",
            self.expression(expr, Precedence::Sequence, indent)
        )
    }

    /// The step expression for `node`
    fn step(&mut self, node: &WindNode, indent: usize) -> String {
        let var = self.var.clone();
        match node {
            WindNode::Delay { .. }
            | WindNode::If { .. }
            | WindNode::Switch { .. }
            | WindNode::Raw(_)
            | WindNode::For { init: Some(_), .. } => self.delayed(node, indent),

            WindNode::Combine { first, second } => {
                let first = self.step(first, indent);
                let second = self.deferred(second, indent);
                format!("{}.Combine({}, {})", var, first, second)
            }

            WindNode::Bind {
                expr,
                kind,
                continuation,
            } => {
                let operand = self.expression(expr, Precedence::Assignment, indent);
                let inner = pad(indent + 1);
                let (param, mut body) = match kind {
                    BindKind::Discard => (String::new(), String::new()),
                    BindKind::Declare(name) => (name.clone(), String::new()),
                    BindKind::Assign(target) => {
                        let param = self.result_param();
                        let target = self.expression(target, Precedence::Assignment, indent + 1);
                        let line = format!("{}{} = {};\n", inner, target, param);
                        (param, line)
                    }
                    BindKind::Return => {
                        let param = self.result_param();
                        let line = format!("{}return {}.Return({});\n", inner, var, param);
                        (param, line)
                    }
                };
                if let Some(next) = continuation {
                    body.push_str(&self.body(next, indent + 1));
                }
                format!(
                    "{}.Bind({}, function ({}) {{\n{}{}}})",
                    var,
                    operand,
                    param,
                    body,
                    pad(indent)
                )
            }

            WindNode::For {
                test,
                update,
                body,
                ..
            } => {
                let test = match test {
                    Some(test) => self.thunk(test, indent),
                    None => "null".to_string(),
                };
                let update = match update {
                    Some(update) => format!(
                        "function () {{ {}; }}",
                        self.expression(update, Precedence::Sequence, indent)
                    ),
                    None => "null".to_string(),
                };
                let body = self.loop_body(body, indent);
                format!("{}.For({}, {}, {})", var, test, update, body)
            }

            WindNode::ForIn {
                key_param,
                object,
                body,
                ..
            } => {
                let object = self.expression(object, Precedence::Assignment, indent);
                let body = self.deferred(body, indent + 1);
                format!(
                    "{}.ForIn({}, function ({}) {{\n{}return {};\n{}}})",
                    var,
                    object,
                    key_param,
                    pad(indent + 1),
                    body,
                    pad(indent)
                )
            }

            WindNode::While { test, body } => {
                let test = self.thunk(test, indent);
                let body = self.loop_body(body, indent);
                format!("{}.While({}, {})", var, test, body)
            }

            WindNode::Do { body, test } => {
                let body = self.loop_body(body, indent);
                let test = self.thunk(test, indent);
                format!("{}.Do({}, {})", var, body, test)
            }

            WindNode::Try {
                body,
                catch,
                finally,
            } => {
                let body = self.deferred(body, indent);
                let catch = match catch {
                    Some((param, handler)) => format!(
                        "function ({}) {{\n{}{}}}",
                        param,
                        self.body(handler, indent + 1),
                        pad(indent)
                    ),
                    None => "null".to_string(),
                };
                let finally = match finally {
                    Some(finally) => self.deferred(finally, indent),
                    None => "null".to_string(),
                };
                format!("{}.Try({}, {}, {})", var, body, catch, finally)
            }

            WindNode::Normal => format!("{}.Normal()", var),
            WindNode::Return(None) => format!("{}.Return()", var),
            WindNode::Return(Some(value)) => format!(
                "{}.Return({})",
                var,
                self.expression(value, Precedence::Assignment, indent)
            ),
            WindNode::Break => format!("{}.Break()", var),
            WindNode::Continue => format!("{}.Continue()", var),
            WindNode::Throw(error) => format!(
                "{}.Throw({})",
                var,
                self.expression(error, Precedence::Assignment, indent)
            ),
        }
    }

    fn loop_body(&mut self, body: &WindNode, indent: usize) -> String {
        let body = self.deferred(body, indent + 1);
        format!(
            "function () {{\n{}return {};\n{}}}",
            pad(indent + 1),
            body,
            pad(indent)
        )
    }

    fn result_param(&mut self) -> String {
        let param = format!("_result_${}", self.results);
        self.results += 1;
        param
    }

    /// Statements of a function body that evaluates to `node`
    fn body(&mut self, node: &WindNode, indent: usize) -> String {
        match node.split_delay() {
            Some((raws, tail)) => {
                let mut out = String::new();
                for raw in raws {
                    if let WindNode::Raw(stmt) = raw.as_ref() {
                        out.push_str(&self.raw(stmt, indent));
                    }
                }
                out.push_str(&self.tail(tail, indent));
                out
            }
            None => self.tail(node, indent),
        }
    }

    /// Statements ending in a `return` of the step for `node`
    fn tail(&mut self, node: &WindNode, indent: usize) -> String {
        let line = pad(indent);
        match node {
            WindNode::Delay { .. } => self.body(node, indent),

            WindNode::Raw(stmt) => format!(
                "{}{}return {}.Normal();\n",
                self.raw(stmt, indent),
                line,
                self.var
            ),

            WindNode::For {
                init: Some(init),
                test,
                update,
                body,
            } => {
                let init = self.raw(init, indent);
                let lazy = WindNode::For {
                    init: None,
                    test: test.clone(),
                    update: update.clone(),
                    body: body.clone(),
                };
                format!("{}{}return {};\n", init, line, self.step(&lazy, indent))
            }

            WindNode::If {
                branches,
                otherwise,
            } => {
                let mut out = String::new();
                for (i, (test, branch)) in branches.iter().enumerate() {
                    let test = self.expression(test, Precedence::Sequence, indent);
                    if i == 0 {
                        out.push_str(&format!("{}if ({}) {{\n", line, test));
                    } else {
                        out.push_str(&format!("{}}} else if ({}) {{\n", line, test));
                    }
                    out.push_str(&self.body(branch, indent + 1));
                }
                match otherwise {
                    Some(otherwise) => {
                        out.push_str(&format!("{}}} else {{\n", line));
                        out.push_str(&self.body(otherwise, indent + 1));
                        out.push_str(&format!("{}}}\n", line));
                    }
                    None => {
                        out.push_str(&format!("{}}}\n", line));
                        out.push_str(&format!("{}return {}.Normal();\n", line, self.var));
                    }
                }
                out
            }

            WindNode::Switch {
                discriminant,
                cases,
            } => {
                let mut out = format!(
                    "{}switch ({}) {{\n",
                    line,
                    self.expression(discriminant, Precedence::Sequence, indent)
                );
                for arm in cases {
                    match &arm.test {
                        Some(test) => out.push_str(&format!(
                            "{}case {}:\n",
                            pad(indent + 1),
                            self.expression(test, Precedence::Sequence, indent + 1)
                        )),
                        None => out.push_str(&format!("{}default:\n", pad(indent + 1))),
                    }
                    out.push_str(&self.body(&arm.body, indent + 2));
                }
                out.push_str(&format!("{}}}\n", line));
                out.push_str(&format!("{}return {}.Normal();\n", line, self.var));
                out
            }

            other => format!("{}return {};\n", line, self.step(other, indent)),
        }
    }
}
