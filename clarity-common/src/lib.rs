//! # Clarity Common Library
//!
//! Shared code for the clarity grader crates:
//! - Error and result types
//! - Configuration loading (TOML + environment)
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
