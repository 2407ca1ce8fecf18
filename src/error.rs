//! Error handling for the rangefetch library.
//!
//! Transfer failures are normally reported as [`Status::Failed`] events rather
//! than as errors. The variants below cover the cases that do cross an API
//! boundary: invalid input, I/O and transport failures inside a single
//! attempt, and faults of the concurrent chunk tasks themselves.
//!
//! [`Status::Failed`]: crate::Status::Failed

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Errors that can happen when using rangefetch.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The submitted URL cannot be parsed or is not usable for HTTP downloads.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O Error.
    ///
    /// Raised while creating, pre-allocating or writing the destination file.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the middleware stack wrapping the Reqwest client.
    #[error("HTTP middleware error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// The server answered with a status the transfer cannot use.
    ///
    /// For ranged requests anything other than `206 Partial Content` ends up here.
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(StatusCode),

    /// A response body ended before the requested byte range was complete.
    #[error("Body ended after {received} of {expected} bytes")]
    Truncated {
        /// Bytes requested.
        expected: u64,
        /// Bytes actually received.
        received: u64,
    },

    /// A concurrent chunk task panicked or was cancelled before reporting.
    #[error("Transfer task fault: {0}")]
    TaskFault(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskFault(err.to_string())
    }
}

/// Result type alias for operations that can fail with a rangefetch error.
pub type Result<T> = std::result::Result<T, Error>;
