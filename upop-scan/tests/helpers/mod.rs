//! Test Helper Utilities
//!
//! Shared utilities for testing upop-scan

#![allow(dead_code)]

pub mod fixtures;
pub mod stub_inspector;

pub use fixtures::{options, TableFixture, CATALOG_HEADER};
pub use stub_inspector::{titled, StubInspector};
