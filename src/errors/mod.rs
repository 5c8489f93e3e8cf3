//! Centralized error handling for the favicon resolver
//!
//! # Error Categories
//!
//! - **Storage Errors**: document store I/O, quota and key failures
//! - **Serialization Errors**: corrupt cache or link documents
//! - **HTTP Errors**: candidate probe transport failures
//! - **Validation/Configuration Errors**: bad input or settings
//!
//! # Usage
//!
//! ```rust
//! use favicon_resolver::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("empty key"))
//! }
//! assert!(example_function().is_err());
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for document store Results
pub type StorageResult<T> = Result<T, StorageError>;
