//! Tests for the syntax layer

pub(crate) mod helpers;

mod printer_tests;
