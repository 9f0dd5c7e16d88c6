//! Transport error type

use std::time::Duration;

use thiserror::Error;

/// Failures raised by the transport layer.
///
/// Non-2xx HTTP statuses are never reported here: they come back as a
/// [`Response`](crate::Response) for the caller to classify. Variants below are
/// structural failures where no meaningful response exists.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection refused, reset, DNS failure or a broken body read.
    #[error("Connection to {host} failed: {detail}")]
    Connection {
        /// Host the connection targeted.
        host: String,
        /// Underlying error text.
        detail: String,
    },

    /// Connect or request timeout elapsed.
    #[error("Request to {host} timed out: {detail}")]
    Timeout {
        /// Host the connection targeted.
        host: String,
        /// Underlying error text.
        detail: String,
    },

    /// The peer certificate failed chain validation or did not match the host.
    #[error("TLS verification failed for {host}: {detail}")]
    TlsVerification {
        /// Host the connection targeted.
        host: String,
        /// Verifier output.
        detail: String,
    },

    /// The auth bootstrap rejected the credentials or returned an incomplete answer.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A body did not decode per its declared content type, or lacked a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An async job reached the `ERROR` state.
    #[error("Async job {job_id} failed: {message}")]
    AsyncJobFailed {
        /// Job identifier from the initial response.
        job_id: String,
        /// Provider error message, verbatim.
        message: String,
    },

    /// Polling exhausted its attempt or time budget.
    #[error("Async job {job_id} still pending after {attempts} polls ({elapsed:?})")]
    PollTimeout {
        /// Job identifier from the initial response.
        job_id: String,
        /// Poll requests issued.
        attempts: u32,
        /// Time spent since the initial request returned.
        elapsed: Duration,
    },

    /// Polling was cancelled by the caller.
    #[error("Async job {job_id} polling cancelled")]
    Cancelled {
        /// Job identifier from the initial response.
        job_id: String,
    },

    /// Invalid setup: bad URL, unreadable CA bundle, scheme mismatch.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local file system failure while streaming to disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A download wrote a different number of bytes than the object declared.
    #[error("Incomplete transfer: expected {expected} bytes, wrote {written}")]
    IncompleteTransfer {
        /// Declared object size.
        expected: u64,
        /// Bytes actually written.
        written: u64,
    },
}

impl Error {
    /// Failures worth retrying from a calling layer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }

    /// Failures caused by rejected credentials.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials(_))
    }
}

/// Convenience alias for transport results.
pub type Result<T> = std::result::Result<T, Error>;
