//! Structured error handling for delivery operations.

use hipstr::HipStr;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Boxed error stored as the source of an [`Error`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a delivery operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while delivering messages and files.
///
/// Only [`Configuration`], [`TransportExhausted`], [`ApplicationRejected`],
/// [`InvalidInput`] and [`Serialization`] are ever returned to callers. The
/// remaining kinds classify a single failed attempt and surface only as the
/// source of a [`TransportExhausted`] error.
///
/// [`Configuration`]: ErrorKind::Configuration
/// [`TransportExhausted`]: ErrorKind::TransportExhausted
/// [`ApplicationRejected`]: ErrorKind::ApplicationRejected
/// [`InvalidInput`]: ErrorKind::InvalidInput
/// [`Serialization`]: ErrorKind::Serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No usable transport, or an operation needs credentials that are missing.
    Configuration,
    /// Every attempt failed at the transport level.
    TransportExhausted,
    /// The remote API accepted the request but reported a logical failure.
    ApplicationRejected,
    /// The remote endpoint answered with HTTP 429.
    RateLimited,
    /// Connection failure or non-success HTTP status.
    NetworkError,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The remote endpoint answered with a body that could not be parsed.
    MalformedResponse,
    /// Caller-supplied input could not be used.
    InvalidInput,
    /// Outgoing payload could not be encoded.
    Serialization,
    /// Unclassified failure.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if a single attempt failing with this kind may be repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::NetworkError | Self::Timeout | Self::MalformedResponse
        )
    }
}

/// Delivery error: a kind, an optional remote code and diagnostic context.
#[must_use]
#[derive(Debug, Error)]
#[error(
    "[{kind}]{}{}",
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default(),
    code.as_ref().map(|c| format!(" (code: {c})")).unwrap_or_default()
)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<HipStr<'static>>,
    /// Error code reported by the remote API, if any.
    pub code: Option<HipStr<'static>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information, such as the payload that was rejected.
    pub context: Option<HipStr<'static>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            code: None,
            source: None,
            context: None,
        }
    }

    /// Creates an error of `kind` wrapping `source`.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self::new(kind).with_source(source)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new transport exhausted error.
    pub fn transport_exhausted() -> Self {
        Self::new(ErrorKind::TransportExhausted)
    }

    /// Creates a new application rejected error carrying the remote error code.
    pub fn application_rejected(code: impl Into<HipStr<'static>>) -> Self {
        Self::new(ErrorKind::ApplicationRejected).with_code(code)
    }

    /// Creates a new rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    /// Creates a new network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new malformed response error.
    pub fn malformed_response() -> Self {
        Self::new(ErrorKind::MalformedResponse)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<HipStr<'static>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the remote error code.
    pub fn with_code(mut self, code: impl Into<HipStr<'static>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches diagnostic context, such as the rejected payload.
    pub fn with_context(mut self, context: impl Into<HipStr<'static>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns the error kind.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the remote error code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns `true` if the failed attempt may be repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(ErrorKind::InvalidInput, error).with_message("I/O operation failed")
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization()
            .with_message("JSON encoding failed")
            .with_source(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::from_source(ErrorKind::Configuration, error).with_message("Invalid URL")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_rejection_carries_code_and_payload() {
        let error = Error::application_rejected("channel_not_found")
            .with_message("chat.postMessage rejected the request")
            .with_context(r##"payload={"channel":"#gone"}"##);

        assert_eq!(error.kind(), ErrorKind::ApplicationRejected);
        assert_eq!(error.code(), Some("channel_not_found"));
        assert!(error.context.as_deref().unwrap().contains("#gone"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_display_names_kind_and_code() {
        let error = Error::application_rejected("invalid_auth").with_message("chat.postMessage");
        assert_eq!(
            error.to_string(),
            "[application_rejected]: chat.postMessage (code: invalid_auth)"
        );

        assert_eq!(Error::rate_limited().to_string(), "[rate_limited]");
    }

    #[test]
    fn test_exhaustion_keeps_last_attempt() {
        let error = Error::transport_exhausted().with_source(Error::timeout());

        let source = error.source.as_ref().unwrap();
        let last = source.downcast_ref::<Error>().unwrap();
        assert_eq!(last.kind(), ErrorKind::Timeout);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_unreadable_file_is_invalid_input() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "build.log");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_json_failure_is_serialization() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(json_error);

        assert_eq!(error.kind(), ErrorKind::Serialization);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_only_attempt_kinds_are_retried() {
        let retryable = [
            ErrorKind::RateLimited,
            ErrorKind::NetworkError,
            ErrorKind::Timeout,
            ErrorKind::MalformedResponse,
        ];
        for kind in retryable {
            assert!(kind.is_retryable(), "{kind} should be retried");
        }

        let terminal = [
            ErrorKind::Configuration,
            ErrorKind::TransportExhausted,
            ErrorKind::ApplicationRejected,
            ErrorKind::InvalidInput,
            ErrorKind::Serialization,
            ErrorKind::Unknown,
        ];
        for kind in terminal {
            assert!(!kind.is_retryable(), "{kind} should not be retried");
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::TransportExhausted.as_ref(), "transport_exhausted");
        assert_eq!(
            ErrorKind::from_str("malformed_response").unwrap(),
            ErrorKind::MalformedResponse
        );
    }
}
