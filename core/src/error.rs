//! Error types for the Softaculous API client.
//!
//! # Design
//! Every failure of a query collapses into a single `QueryError` returned to
//! the caller. The variants keep enough detail for the log line emitted by
//! the executor; `QueryError::kind` reduces them to the four categories a
//! caller may want to branch on. `ConfigError` is separate because it can only
//! happen before any request exists.

use std::fmt;

use thiserror::Error;

/// Coarse classification of a failed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// Connection refused, DNS failure, timeout, TLS failure, socket errors.
    Transport,
    /// Malformed HTTP exchange, including non-success status codes.
    Protocol,
    /// The body could not be decoded in the configured wire format.
    Deserialize,
    /// Anything a custom transport cannot place in the categories above.
    Unexpected,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryErrorKind::Transport => "transport",
            QueryErrorKind::Protocol => "protocol",
            QueryErrorKind::Deserialize => "deserialize",
            QueryErrorKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// Errors returned by `SoftaculousClient::parse_response` and every
/// `Softaculous` operation.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The HTTP exchange itself was malformed.
    #[error("protocol failure: {0}")]
    Protocol(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a valid document in the configured format.
    #[error("deserialization failed: {0}")]
    Deserialize(String),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl QueryError {
    pub fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::Transport(_) => QueryErrorKind::Transport,
            QueryError::Protocol(_) | QueryError::Status { .. } => QueryErrorKind::Protocol,
            QueryError::Deserialize(_) => QueryErrorKind::Deserialize,
            QueryError::Unexpected(_) => QueryErrorKind::Unexpected,
        }
    }
}

/// Errors raised while assembling a `ClientConfig` from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}
