//! Error types for keel.

use derive_more::{Display, Error, From};

use crate::duration::DurationError;
use crate::temporal::TemporalError;

/// Boxed error produced by a serialization writer or another collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for keel operations.
///
/// Variants fall in three families:
/// - configuration errors (missing base URL, empty content type, empty keys)
/// - validation errors ([`DurationError`], [`TemporalError`])
/// - serialization errors, forwarded from the writer with their source intact
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Invalid request or client configuration.
    #[display("invalid configuration: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),

    /// The URI template needs a `baseurl` path parameter and none was supplied.
    #[display("the base URL is missing: set the `baseurl` path parameter")]
    #[from(skip)]
    MissingBaseUrl,

    /// The URI template is malformed.
    #[display("invalid URI template: {_0}")]
    #[from(skip)]
    InvalidUriTemplate(#[error(not(source))] String),

    /// The expanded URI is not an absolute URL.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// A header name or value cannot be sent over HTTP.
    #[display("invalid header: {_0}")]
    #[from(skip)]
    InvalidHeader(#[error(not(source))] String),

    /// ISO-8601 duration validation error.
    #[display("duration error: {_0}")]
    #[from]
    Duration(DurationError),

    /// Date-only or time-only validation error.
    #[display("date/time error: {_0}")]
    #[from]
    Temporal(TemporalError),

    /// Error raised by a serialization writer.
    #[display("serialization error: {_0}")]
    #[from(skip)]
    Serialization(BoxError),

    /// Error raised while authenticating a request.
    #[display("authentication error: {_0}")]
    #[from(skip)]
    Authentication(#[error(not(source))] String),

    /// Error reported by the transport collaborator.
    #[display("transport error: {_0}")]
    #[from(skip)]
    Transport(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid URI template error.
    #[must_use]
    pub fn invalid_uri_template(message: impl Into<String>) -> Self {
        Self::InvalidUriTemplate(message.into())
    }

    /// Wrap an error raised by a serialization writer.
    #[must_use]
    pub fn serialization(source: impl Into<BoxError>) -> Self {
        Self::Serialization(source.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns `true` for errors caused by how the request or client was set up.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingBaseUrl
                | Self::InvalidUriTemplate(_)
                | Self::InvalidUrl(_)
                | Self::InvalidHeader(_)
        )
    }

    /// Returns `true` for duration and date/time validation errors.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Duration(_) | Self::Temporal(_))
    }

    /// Returns `true` if the error came from a serialization writer.
    #[must_use]
    pub const fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}
