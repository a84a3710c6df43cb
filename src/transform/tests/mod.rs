//! Tests for the transformer

mod jump_tests;

use crate::error::CompileError;
use crate::syntax::tests::helpers::BINDER;
use crate::syntax::Stmt;
use crate::transform::transform;

/// Outline of the tree a body transforms into
fn outline(body: Vec<Stmt>) -> String {
    transform(&body, BINDER)
        .expect("transform failed")
        .to_string()
}

/// The reason a body is rejected
fn rejection(body: Vec<Stmt>) -> String {
    match transform(&body, BINDER) {
        Err(CompileError::Unsupported { construct, .. }) => construct,
        Err(other) => panic!("Expected Unsupported, got {:?}", other),
        Ok(root) => panic!("Expected rejection, got {}", root),
    }
}
