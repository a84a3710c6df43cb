use super::helpers::{lines, Harness};
use crate::syntax::tests::helpers::*;
use crate::syntax::{BinaryOp, Expr, LogicalOp, Span, UnaryOp, UpdateOp};
use crate::value::Value;

fn eval(expr: Expr) -> Result<Value, Value> {
    Harness::new().interpreter.eval(&expr)
}

fn unary(operator: UnaryOp, argument: Expr) -> Expr {
    Expr::UnaryExpression {
        operator,
        argument: Box::new(argument),
        span: Span::default(),
    }
}

fn logical(operator: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::LogicalExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::default(),
    }
}

#[test]
fn test_arithmetic() {
    assert_eq!(
        eval(bin(BinaryOp::Add, num(1.0), bin(BinaryOp::Mul, num(2.0), num(3.0)))),
        Ok(Value::Num(7.0))
    );
    assert_eq!(eval(bin(BinaryOp::Rem, num(7.0), num(4.0))), Ok(Value::Num(3.0)));
    assert_eq!(eval(bin(BinaryOp::Shl, num(1.0), num(4.0))), Ok(Value::Num(16.0)));
}

/// `function name() { log(name); return value; }`
fn noisy(name: &str, value: Expr) -> crate::syntax::Stmt {
    declare(func(name, &[], vec![log(vec![text(name)]), ret(value)]))
}

#[test]
fn test_assignment_target_is_evaluated_before_the_value() {
    let harness = Harness::new();
    harness
        .run(vec![
            noisy("key", num(0.0)),
            noisy("value", num(7.0)),
            var("a", array(vec![num(0.0)])),
            expr(assign(index(id("a"), call_fn("key", vec![])), call_fn("value", vec![]))),
            log(vec![index(id("a"), num(0.0))]),
        ])
        .unwrap();
    assert_eq!(harness.logged(), lines(&["key", "value", "7"]));
}

#[test]
fn test_compound_assignment_evaluates_its_target_once() {
    let harness = Harness::new();
    harness
        .run(vec![
            var("a", array(vec![num(0.0), num(0.0), num(0.0)])),
            var("i", num(0.0)),
            expr(add_assign(index(id("a"), inc("i")), num(5.0))),
            log(vec![
                id("i"),
                index(id("a"), num(0.0)),
                index(id("a"), num(1.0)),
            ]),
        ])
        .unwrap();
    assert_eq!(harness.logged(), lines(&["1 5 0"]));
}

#[test]
fn test_update_of_a_member_evaluates_its_object_once() {
    let harness = Harness::new();
    let bump = Expr::UpdateExpression {
        operator: UpdateOp::Increment,
        prefix: true,
        argument: Box::new(member(call_fn("target", vec![]), "n")),
        span: Span::default(),
    };
    let result = harness.run(vec![
        var("o", object(vec![("n", num(1.0))])),
        noisy("target", id("o")),
        var("seen", bump),
        log(vec![id("seen"), member(id("o"), "n")]),
    ]);
    assert_eq!(result, Ok(Value::Undefined));
    assert_eq!(harness.logged(), lines(&["target", "2 2"]));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval(bin(BinaryOp::Add, text("n="), num(2.0))), Ok(Value::str("n=2")));
    assert_eq!(eval(bin(BinaryOp::Add, num(0.5), text("x"))), Ok(Value::str("0.5x")));
}

#[test]
fn test_equality() {
    assert_eq!(eval(bin(BinaryOp::Eq, text("1"), num(1.0))), Ok(Value::Bool(true)));
    assert_eq!(eval(bin(BinaryOp::StrictEq, text("1"), num(1.0))), Ok(Value::Bool(false)));
    assert_eq!(eval(bin(BinaryOp::Eq, null(), id("undefined"))), Ok(Value::Bool(true)));
}

#[test]
fn test_comparison_of_strings_is_lexicographic() {
    assert_eq!(eval(bin(BinaryOp::Lt, text("a"), text("b"))), Ok(Value::Bool(true)));
    assert_eq!(eval(bin(BinaryOp::Gt, text("10"), text("9"))), Ok(Value::Bool(false)));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(
        eval(logical(LogicalOp::Or, text("left"), call_fn("missing", vec![]))),
        Ok(Value::str("left"))
    );
    assert_eq!(
        eval(logical(LogicalOp::And, num(0.0), call_fn("missing", vec![]))),
        Ok(Value::Num(0.0))
    );
}

#[test]
fn test_typeof_tolerates_undeclared_names() {
    assert_eq!(eval(unary(UnaryOp::TypeOf, id("nothing"))), Ok(Value::str("undefined")));
    assert_eq!(eval(unary(UnaryOp::TypeOf, id("Task"))), Ok(Value::str("object")));
    assert_eq!(eval(unary(UnaryOp::Not, num(0.0))), Ok(Value::Bool(true)));
}

#[test]
fn test_undeclared_name_is_a_reference_error() {
    let err = eval(id("nothing")).unwrap_err();
    assert_eq!(err, Value::reference_error("nothing is not defined"));
}

#[test]
fn test_members_of_lists_and_objects() {
    assert_eq!(
        eval(member(array(vec![num(1.0), num(2.0)]), "length")),
        Ok(Value::Num(2.0))
    );
    assert_eq!(
        eval(index(array(vec![num(1.0), num(2.0)]), num(1.0))),
        Ok(Value::Num(2.0))
    );
    assert_eq!(
        eval(member(object(vec![("a", text("x"))]), "a")),
        Ok(Value::str("x"))
    );
    assert_eq!(eval(member(text("abc"), "length")), Ok(Value::Num(3.0)));
}

#[test]
fn test_reading_a_member_of_null_is_a_type_error() {
    let err = eval(member(null(), "x")).unwrap_err();
    assert_eq!(err.as_error().map(|e| e.name.as_str()), Some("TypeError"));
}

#[test]
fn test_in_operator() {
    assert_eq!(
        eval(bin(BinaryOp::In, text("a"), object(vec![("a", num(1.0))]))),
        Ok(Value::Bool(true))
    );
    assert!(eval(bin(BinaryOp::In, text("a"), num(1.0))).is_err());
}

#[test]
fn test_calling_a_non_function_is_a_type_error() {
    let err = eval(call(num(1.0), vec![])).unwrap_err();
    assert_eq!(err.as_error().map(|e| e.name.as_str()), Some("TypeError"));
}

#[test]
fn test_error_values_expose_name_and_message() {
    assert_eq!(
        eval(member(call_fn("Error", vec![text("boom")]), "message")),
        Ok(Value::str("boom"))
    );
    assert_eq!(
        eval(member(call_fn("CancellationError", vec![]), "name")),
        Ok(Value::str("CancellationError"))
    );
}
