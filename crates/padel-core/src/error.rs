//! Error types for padel-sync.
//!
//! One unified error type with explicit variants for transport, protocol,
//! response shape, push decoding and input validation failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for padel-sync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, socket).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend answered with a non-success status.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The backend answered successfully but the body had an unexpected shape.
    #[error("malformed response: {0}")]
    Malformed(#[from] MalformedResponse),

    /// A push event could not be decoded.
    #[error("push decode error: {0}")]
    PushDecode(#[from] PushDecodeError),

    /// Input validation errors (entity name, record id, cursor, URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Short, user-facing summary used for transient notices.
    pub fn summary(&self) -> String {
        match self {
            Error::Transport(_) => "Could not reach the server".to_string(),
            Error::Protocol(e) => match &e.message {
                Some(message) => format!("Server error: {}", message),
                None => format!("Server error (HTTP {})", e.status),
            },
            Error::Malformed(_) => "Unexpected response from the server".to_string(),
            Error::PushDecode(_) => "Unreadable live update".to_string(),
            Error::InvalidInput(e) => e.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local I/O failure (file backend).
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// A non-success response from the backend.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error code from the response body (if present).
    pub error: Option<String>,
    /// Error message from the response body (if present).
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Shorthand for a 404 on a missing record.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(
            404,
            Some("NotFound".to_string()),
            Some(format!("{} not found", what)),
        )
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// A response body that could not be interpreted.
#[derive(Debug, Error)]
#[error("{context}: {message}")]
pub struct MalformedResponse {
    /// What was being decoded (e.g. "sale page").
    pub context: String,
    /// The underlying decoder message.
    pub message: String,
}

impl MalformedResponse {
    pub fn new(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Push payload decoding errors.
#[derive(Debug, Error)]
pub enum PushDecodeError {
    /// The transport frame itself was not understood.
    #[error("invalid frame '{frame}': {reason}")]
    Frame { frame: String, reason: String },

    /// The event payload did not carry a usable record.
    #[error("invalid payload for '{entity}': {reason}")]
    Payload { entity: String, reason: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid entity name.
    #[error("invalid entity name '{value}': {reason}")]
    EntityName { value: String, reason: String },

    /// Invalid record id.
    #[error("invalid record id '{value}': {reason}")]
    RecordId { value: String, reason: String },

    /// Invalid pagination cursor.
    #[error("invalid cursor: {reason}")]
    Cursor { reason: String },

    /// Invalid backend URL.
    #[error("invalid backend URL '{value}': {reason}")]
    BackendUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
