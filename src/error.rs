//! Error types for the prober.
//!
//! Per-endpoint failures are plain data ([`ProbeFailure`]) carried inside a
//! result record. Only setup problems and malformed caller input surface as
//! real errors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flat classification of everything that can go wrong during one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeErrorKind {
    InvalidAddressError,
    HttpStatusError,
    EmptyResponseError,
    HandshakeError,
    TimeoutError,
    TransportError,
}

impl ProbeErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeErrorKind::InvalidAddressError => "InvalidAddressError",
            ProbeErrorKind::HttpStatusError => "HttpStatusError",
            ProbeErrorKind::EmptyResponseError => "EmptyResponseError",
            ProbeErrorKind::HandshakeError => "HandshakeError",
            ProbeErrorKind::TimeoutError => "TimeoutError",
            ProbeErrorKind::TransportError => "TransportError",
        }
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProbeFailure {
    pub kind: ProbeErrorKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn new(kind: ProbeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_address() -> Self {
        Self::new(
            ProbeErrorKind::InvalidAddressError,
            "Invalid URL protocol. Must start with http://, https://, ws://, or wss://",
        )
    }

    pub fn timeout(what: &str, budget: Duration) -> Self {
        Self::new(
            ProbeErrorKind::TimeoutError,
            format!("{what} timed out after {} ms", budget.as_millis()),
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProbeErrorKind::TransportError, message)
    }
}

/// Rejection of a malformed batch request, before any probe is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("Invalid request payload. \"endpoints\" must be an array of URLs.")]
    NotAList,

    #[error("Invalid request payload. Endpoint at index {index} is not a string.")]
    NonStringEntry { index: usize },
}

/// Failure to build the transport clients a prober needs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to build TLS connector: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Failed to encode probe payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_includes_kind() {
        let failure = ProbeFailure::timeout("Request", Duration::from_secs(10));
        assert_eq!(failure.kind, ProbeErrorKind::TimeoutError);
        assert_eq!(failure.to_string(), "TimeoutError: Request timed out after 10000 ms");
    }

    #[test]
    fn test_kind_serializes_by_name() {
        let json = serde_json::to_string(&ProbeErrorKind::EmptyResponseError).expect("serialize");
        assert_eq!(json, "\"EmptyResponseError\"");
    }

    #[test]
    fn test_entry_error_messages() {
        assert_eq!(
            EntryError::NonStringEntry { index: 3 }.to_string(),
            "Invalid request payload. Endpoint at index 3 is not a string."
        );
        assert!(EntryError::NotAList.to_string().contains("must be an array"));
    }
}
