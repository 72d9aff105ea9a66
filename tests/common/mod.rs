//! Shared helpers for log-export integration tests.
//!
//! Import with `mod common; use common::*;` at the top of a test file.

#![allow(dead_code, unused_imports)]

pub mod fake_search_api;
pub mod fixtures;

pub use fake_search_api::*;
pub use fixtures::*;
