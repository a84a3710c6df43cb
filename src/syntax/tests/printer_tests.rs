//! Tests for the printer and the precedence table

use super::helpers::*;
use crate::syntax::precedence::{precedence_of, wrap};
use crate::syntax::printer::format_number;
use crate::syntax::{print_expr, print_statements, BinaryOp, Function, Precedence, Printer};

/* ===================== Precedence ===================== */

#[test]
fn test_parenthesizes_looser_operand() {
    // (a + b) * c
    let expr = bin(BinaryOp::Mul, bin(BinaryOp::Add, id("a"), id("b")), id("c"));
    assert_eq!(print_expr(&expr), "(a + b) * c");
}

#[test]
fn test_no_parens_for_tighter_operand() {
    // a + b * c
    let expr = bin(BinaryOp::Add, id("a"), bin(BinaryOp::Mul, id("b"), id("c")));
    assert_eq!(print_expr(&expr), "a + b * c");
}

#[test]
fn test_left_associativity() {
    let left = bin(BinaryOp::Sub, bin(BinaryOp::Sub, id("a"), id("b")), id("c"));
    let right = bin(BinaryOp::Sub, id("a"), bin(BinaryOp::Sub, id("b"), id("c")));
    assert_eq!(print_expr(&left), "a - b - c");
    assert_eq!(print_expr(&right), "a - (b - c)");
}

#[test]
fn test_member_of_call_and_assignment_in_argument() {
    // f(x = 1).y
    let expr = member(call_fn("f", vec![assign(id("x"), num(1.0))]), "y");
    assert_eq!(print_expr(&expr), "f(x = 1).y");

    // (a || b).c
    let logical = crate::syntax::Expr::LogicalExpression {
        operator: crate::syntax::LogicalOp::Or,
        left: Box::new(id("a")),
        right: Box::new(id("b")),
        span: Default::default(),
    };
    assert_eq!(print_expr(&member(logical, "c")), "(a || b).c");
}

#[test]
fn test_wrap_uses_table() {
    let sum = bin(BinaryOp::Add, id("a"), id("b"));
    assert_eq!(precedence_of(&sum), Precedence::Additive);
    assert_eq!(
        wrap("a + b".to_string(), &sum, Precedence::Multiplicative),
        "(a + b)"
    );
    assert_eq!(wrap("a + b".to_string(), &sum, Precedence::Assignment), "a + b");
    assert!(Precedence::Member > Precedence::Unary);
    assert!(Precedence::Assignment > Precedence::Sequence);
}

/* ===================== Statements ===================== */

#[test]
fn test_print_if_else() {
    let stmt = if_(id("x"), vec![expr(call_fn("a", vec![]))], Some(vec![expr(call_fn("b", vec![]))]));
    assert_eq!(
        print_statements(&[stmt]),
        "if (x) {\n    a();\n} else {\n    b();\n}\n"
    );
}

#[test]
fn test_print_literals() {
    assert_eq!(print_expr(&text("a\"b")), r#""a\"b""#);
    assert_eq!(print_expr(&num(3.0)), "3");
    assert_eq!(format_number(1.5), "1.5");
    assert_eq!(format_number(f64::NAN), "NaN");
    assert_eq!(print_expr(&object(vec![("a", num(1.0)), ("b-c", num(2.0))])), r#"{ a: 1, "b-c": 2 }"#);
}

#[test]
fn test_rewrite_escaping_jumps() {
    let stmts = vec![
        if_(id("x"), vec![brk()], None),
        if_(id("y"), vec![cont()], None),
        ret(num(1.0)),
    ];
    let mut printer = Printer::new().rewrite_jumps("B");
    printer.statements(&stmts);
    assert_eq!(
        printer.finish(),
        "if (x) {\n    return B.Break();\n}\nif (y) {\n    return B.Continue();\n}\nreturn B.Return(1);\n"
    );
}

#[test]
fn test_jumps_inside_native_loops_stay() {
    let stmts = vec![while_(id("x"), vec![brk(), cont()])];
    let mut printer = Printer::new().rewrite_jumps("B");
    printer.statements(&stmts);
    assert_eq!(printer.finish(), "while (x) {\n    break;\n    continue;\n}\n");
}

#[test]
fn test_break_inside_switch_stays_but_continue_escapes() {
    let stmts = vec![switch(id("x"), vec![(Some(num(1.0)), vec![brk()]), (None, vec![cont()])])];
    let mut printer = Printer::new().rewrite_jumps("B");
    printer.statements(&stmts);
    assert_eq!(
        printer.finish(),
        "switch (x) {\n    case 1:\n        break;\n    default:\n        return B.Continue();\n}\n"
    );
}

#[test]
fn test_function_hook_replaces_marked_functions() {
    let hook = |function: &Function, _indent: usize| {
        Some(format!("/* compiled {} */", function.id.as_deref().unwrap_or("")))
    };
    let stmts = vec![
        declare(async_fn("f", &[], vec![])),
        declare(func("g", &["a"], vec![ret(id("a"))])),
    ];
    let mut printer = Printer::new().with_functions(&hook);
    printer.statements(&stmts);
    assert_eq!(
        printer.finish(),
        "/* compiled f */\nfunction g(a) {\n    return a;\n}\n"
    );
}
