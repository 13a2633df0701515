// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for spoke-shift

use thiserror::Error;

/// Result type alias for spoke-shift operations
pub type Result<T> = std::result::Result<T, ShiftError>;

/// Errors that can occur while talking to the controller or running a migration
#[derive(Error, Debug)]
pub enum ShiftError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsed but failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Connection failure, timeout or other HTTP-level error
    #[error("Request '{action}' failed: {source}")]
    Transport {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    /// The controller answered with something that is not JSON
    #[error("Malformed response to '{action}': {message}")]
    MalformedResponse { action: String, message: String },

    /// A field the caller relies on is absent from the response
    #[error("Response to '{action}' has no '{field}' field")]
    MissingField { action: String, field: String },

    /// The controller reported `return: false` and the policy is to abort
    #[error("Controller rejected '{action}' for {gateway}: {reason}")]
    ControllerRejected {
        action: String,
        gateway: String,
        reason: String,
    },

    /// The same spoke gateway appears twice in the plan
    #[error("Gateway listed more than once: {name}")]
    DuplicateGateway { name: String },
}
