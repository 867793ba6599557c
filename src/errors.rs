//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`CacheError`] covers the hard failure modes:
//! - Invalid resource names passed to a cache operation
//! - Texture disposal failures
//! - Acquisitions that exceed the configured load timeout
//! - File loading and image decoding errors
//!
//! Ordinary cache misses are *not* errors. A texture that cannot be found, a
//! loader that produces nothing, or a release of an unknown texture are
//! reported through `Option`, `bool` and count return values.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, CacheError>`.
//!
//! ```rust,ignore
//! use gpu_texture_cache::errors::Result;
//!
//! fn return_texture(cache: &TextureCache<Texture>, texture: &Arc<Texture>) -> Result<()> {
//!     cache.release(texture)?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// The main error type for the texture cache.
#[derive(Error, Debug)]
pub enum CacheError {
    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// A required argument was missing or empty.
    #[error("Invalid argument: {0} must not be empty")]
    InvalidArgument(String),

    /// A string argument contained only whitespace.
    #[error("Empty value: {0} must contain at least one non-whitespace character")]
    EmptyValue(String),

    // ========================================================================
    // Resource Lifetime Errors
    // ========================================================================
    /// A texture failed to release its resources.
    #[error("Failed to dispose texture '{name}': {reason}")]
    DisposeFailed {
        /// Name of the texture being disposed
        name: String,
        /// Description of the failure
        reason: String,
    },

    /// Waiting for or loading a texture took longer than the configured limit.
    #[error("Timed out after {timeout:?} acquiring texture '{name}'")]
    Timeout {
        /// Name of the texture being acquired
        name: String,
        /// The limit that was exceeded
        timeout: Duration,
    },

    // ========================================================================
    // I/O & Decoding Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Task join error (when a blocking decode task fails to complete).
    #[error("Task join error: {0}")]
    TaskJoinError(String),
}

impl CacheError {
    /// Builds a [`CacheError::DisposeFailed`] for the named texture.
    pub fn dispose_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CacheError::DisposeFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for CacheError {
    fn from(err: image::ImageError) -> Self {
        CacheError::ImageDecodeError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, CacheError>`.
pub type Result<T> = std::result::Result<T, CacheError>;
