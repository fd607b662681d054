//! Remote API Error Types
//!
//! Every variant carries the URL that was requested, so a failure can always
//! be traced back to the endpoint it came from.

use derive_more::{Display, Error};

/// A remote API error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server answered with a non-2xx status.
    #[display("HTTP {status} from {url}")]
    Http {
        status: u16,
        url: String,
    },
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[display("request to {_0} failed")]
    Transport(#[error(not(source))] String),
    /// The server answered with an empty body.
    #[display("empty response from {_0}")]
    EmptyBody(#[error(not(source))] String),
    /// The body was not the JSON shape we expected.
    #[display("unexpected response from {_0}")]
    Decode(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("could not build HTTP client")]
    Client,
}

impl ErrorKind {
    /// The URL the failed request was sent to, if there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Http { url, .. } | Self::Transport(url) | Self::EmptyBody(url) | Self::Decode(url) => Some(url),
            Self::Client => None,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::Transport(_) | Self::EmptyBody(_) => true,
            Self::Decode(_) | Self::Client => false,
        }
    }
}
