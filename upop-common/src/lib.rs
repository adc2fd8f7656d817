//! # UPOP Common Library
//!
//! Shared code for the UPOP catalog tools:
//! - Error type and result alias
//! - TOML configuration loading and compiled defaults
//! - Atomic file replacement

pub mod config;
pub mod error;
pub mod fs;

pub use error::{Error, Result};
