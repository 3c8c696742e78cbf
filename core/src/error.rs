//! Error types for the push client.
//!
//! # Design
//! Callers need to tell three situations apart: the request never completed
//! (`Transport`), the service understood and rejected it (`Remote`), or the
//! service answered with something the client cannot interpret
//! (`MalformedResponse`). The remaining variants cover failures that happen
//! before any request is sent.

use thiserror::Error;

/// Errors returned by `JPushClient` operations and the response decoder.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP round-trip failed: DNS, connect, TLS, timeout or body read.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service returned a non-2xx status with a `{code, message}` body.
    #[error("remote error {code} (HTTP {status}): {message}")]
    Remote {
        status: u16,
        code: i64,
        message: String,
    },

    /// The response body did not match the expected success or error shape.
    #[error("malformed response (HTTP {status}): {reason}")]
    MalformedResponse {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Client configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ApiError::Remote { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::MalformedResponse { .. })
    }

    /// The service-assigned error code, if this is a remote rejection.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            ApiError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The HTTP status of the response that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } | ApiError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
