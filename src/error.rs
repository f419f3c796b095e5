//! Error types for the couchdriver client.

use thiserror::Error;

/// Coarse classification of an [`Error`], for callers that want to react
/// differently to bad configuration, network trouble, bad payloads and
/// misuse of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Configuration,
  Transport,
  Decode,
  Precondition,
}

#[derive(Error, Debug)]
pub enum Error {
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("Invalid database name: {0}")]
  InvalidDatabaseName(String),

  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Server error: {status} - {message}")]
  Status { status: u16, message: String },

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Unexpected response: {0}")]
  UnexpectedResponse(String),

  #[error("No database selected: cannot {0}")]
  NotConnected(&'static str),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Config(_) | Error::InvalidUrl(_) | Error::InvalidDatabaseName(_) => {
        ErrorKind::Configuration
      }
      Error::Http(e) if e.is_decode() => ErrorKind::Decode,
      Error::Http(_) | Error::Status { .. } => ErrorKind::Transport,
      Error::Serialization(_) | Error::UnexpectedResponse(_) => ErrorKind::Decode,
      Error::NotConnected(_) => ErrorKind::Precondition,
    }
  }

  /// HTTP status of a non-success response, if that is what failed.
  pub fn status(&self) -> Option<u16> {
    match self {
      Error::Status { status, .. } => Some(*status),
      Error::Http(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, Error>;
