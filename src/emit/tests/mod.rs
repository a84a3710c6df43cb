//! Tests for the emitters
