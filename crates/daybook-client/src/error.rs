use daybook_core::{BackendError, ParseError};
use thiserror::Error;

use crate::plan::Method;

/// Failure below HTTP: the request never produced a status line.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request error: {0}")]
    Request(String),
    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{method} {url} -> HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: u16,
    },
    #[error("{method} {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{operation} failed after {attempts} attempts: {summary}")]
    Exhausted {
        operation: &'static str,
        attempts: usize,
        summary: String,
        last: Box<ClientError>,
    },
    #[error("No request shapes configured for {0}")]
    NoAttempts(&'static str),
    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

impl ClientError {
    /// The error that decides how an exhausted run is classified.
    #[must_use]
    pub fn last(&self) -> &ClientError {
        match self {
            Self::Exhausted { last, .. } => last.last(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.last(), Self::Status { status: 404, .. })
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err.last() {
            ClientError::Status { status: 404, .. } => BackendError::not_found(message),
            ClientError::Parse(_) => BackendError::decode(message),
            _ => BackendError::network(message),
        }
    }
}
