//! Error type definitions for the favicon resolver
//!
//! Internal operations return these errors. The public resolution surface
//! never does: failures are logged, reported and folded into a
//! well-defined fallback value by the caller.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Document persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Document (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Document store specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failures
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store refused the document because it is too large
    #[error("Quota exceeded writing '{key}': {size} bytes (quota: {quota})")]
    QuotaExceeded { key: String, size: usize, quota: usize },

    /// Keys must be usable as file stems
    #[error("Invalid document key: '{key}'")]
    InvalidKey { key: String },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl StorageError {
    /// Create a quota exceeded error
    pub fn quota_exceeded<K: Into<String>>(key: K, size: usize, quota: usize) -> Self {
        Self::QuotaExceeded {
            key: key.into(),
            size,
            quota,
        }
    }

    /// Create an invalid key error
    pub fn invalid_key<K: Into<String>>(key: K) -> Self {
        Self::InvalidKey { key: key.into() }
    }
}
