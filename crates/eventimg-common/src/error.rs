//! Unified error type for eventimg.
//!
//! Every layer funnels its failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in eventimg.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "image", "blob").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation (bad id, bad MIME type, bad reference).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The payload's format is not in the allow-list.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The payload exceeds the configured upload limit.
    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The payload could not be decoded or re-encoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// A metadata store operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The blob store failed, or a two-phase create could not be completed.
    #[error("Storage error at {path}: {message}")]
    Storage {
        /// Relative blob path involved in the failure.
        path: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::UnsupportedFormat(_) => 415,
            Error::PayloadTooLarge { .. } => 413,
            Error::Codec(_) => 422,
            Error::Database { .. } => 500,
            Error::Storage { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Whether the failure was caused by the caller's input.
    ///
    /// Client errors are raised before any store is touched, so they never
    /// leave state behind.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Whether this is a validation-class rejection of the upload itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::UnsupportedFormat(_) | Error::PayloadTooLarge { .. }
        )
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Storage`].
    pub fn storage(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Error::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
