//! Error types for the TWiT catalog engine
//!
//! This module defines all error types used throughout the library.
//! TwitError implements Serialize so hosts can forward it over IPC.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for TWiT catalog operations
#[derive(Error, Debug)]
pub enum TwitError {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Transport fault reported by a non-reqwest transport
    #[error("Transport fault: {0}")]
    Transport(String),

    /// Failed to decode an API response
    #[error("Failed to decode API response: {0}")]
    DecodeError(#[from] serde_json::Error),

    /// Folder identifier does not encode a show identity
    #[error("Invalid folder id: {0}")]
    InvalidFolderId(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Serialize TwitError as a string
impl Serialize for TwitError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for TWiT catalog operations
pub type Result<T> = std::result::Result<T, TwitError>;
