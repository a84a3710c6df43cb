pub(crate) mod helpers;

mod expression_tests;
