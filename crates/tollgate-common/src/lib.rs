//! # Tollgate Common
//!
//! Shared types, errors, and constants used across Tollgate components.
//!
//! ## Modules
//! - `types` - Wire types (VerificationResult, submission bodies, provider reply)
//! - `error` - Common error types
//! - `constants` - Trust cookie, paths, and provider defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::GateError;
pub use types::*;
