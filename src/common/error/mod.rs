//! Unified error types for the hwpdoc library.
//!
//! This module provides a single error type that encompasses errors from both
//! the legacy binary decoder and the XML package decoder.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
