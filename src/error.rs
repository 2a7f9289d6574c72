//! Error types for the outfit planner.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures reported by an AI or weather responder.
///
/// The controllers never propagate these; they are turned into an apology
/// message or an error-shaped weather report.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("Responder {responder} request failed: {reason}")]
    RequestFailed { responder: String, reason: String },

    #[error("Invalid response from {responder}: {reason}")]
    InvalidResponse { responder: String, reason: String },
}

/// Errors surfaced at the session boundary (REST handlers).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Outfit index {index} out of range (have {len})")]
    InvalidOutfit { index: usize, len: usize },

    #[error("Style journey is not open")]
    JourneyNotOpen,

    #[error("Unknown profile field: {0}")]
    InvalidField(String),
}

/// Result type alias for the planner.
pub type Result<T> = std::result::Result<T, Error>;
