//! Tests for the jump analysis of native fragments

use crate::syntax::tests::helpers::*;
use crate::transform::{escapes, Escapes};

#[test]
fn test_jumps_inside_native_loop_do_not_escape() {
    let stmt = while_(id("x"), vec![brk(), cont()]);
    assert_eq!(escapes(&stmt).unwrap(), Escapes::default());
}

#[test]
fn test_escaping_jumps() {
    let stmt = if_(id("x"), vec![brk()], Some(vec![cont()]));
    let found = escapes(&stmt).unwrap();
    assert!(found.breaks && found.continues && !found.returns);

    let found = escapes(&block(vec![expr(id("a")), ret_none()])).unwrap();
    assert!(found.returns);
    assert!(found.any());
}

#[test]
fn test_continue_escapes_switch() {
    let stmt = switch(id("x"), vec![(None, vec![brk(), cont()])]);
    let found = escapes(&stmt).unwrap();
    assert!(!found.breaks);
    assert!(found.continues);
}

#[test]
fn test_labels_inside_fragment_are_fine() {
    // inner: while (x) { break inner; }
    let stmt = labeled("inner", while_(id("x"), vec![brk_to("inner")]));
    assert!(!escapes(&stmt).unwrap().any());
}

#[test]
fn test_label_outside_fragment_is_rejected() {
    assert!(escapes(&brk_to("outer")).is_err());
    // continue to a label on a block is never valid
    let stmt = labeled("b", block(vec![while_(id("x"), vec![crate::syntax::Stmt::ContinueStatement {
        label: Some("b".to_string()),
        span: Default::default(),
    }])]));
    assert!(escapes(&stmt).is_err());
}

#[test]
fn test_nested_function_is_its_own_scope() {
    let stmt = expr(func_expr(func("", &[], vec![ret_none()])));
    assert!(!escapes(&stmt).unwrap().any());
}
