//! Process-level error classification.

use herald_slack::ErrorKind;
use thiserror::Error;

/// Exit status for invalid configuration or input.
pub const EXIT_CONFIGURATION: i32 = 2;

/// Exit status for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// Failure that terminates the process, classified by its library error kind.
#[derive(Debug, Error)]
pub enum CliError {
    /// No usable transport, or invalid settings.
    #[error("invalid configuration: {0:#}")]
    Configuration(#[source] anyhow::Error),

    /// The file to upload could not be used.
    #[error("invalid input: {0:#}")]
    InvalidInput(#[source] anyhow::Error),

    /// The remote API refused the request.
    #[error("request rejected: {0:#}")]
    Rejected(#[source] anyhow::Error),

    /// Every delivery attempt failed.
    #[error("delivery failed: {0:#}")]
    Exhausted(#[source] anyhow::Error),

    /// Any other failure.
    #[error("{0:#}")]
    Other(#[source] anyhow::Error),
}

impl CliError {
    /// Returns a unique error code for this error type.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "E001",
            Self::InvalidInput(_) => "E002",
            Self::Rejected(_) => "E003",
            Self::Exhausted(_) => "E004",
            Self::Other(_) => "E005",
        }
    }

    /// Returns the process exit status for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::InvalidInput(_) => EXIT_CONFIGURATION,
            Self::Rejected(_) | Self::Exhausted(_) | Self::Other(_) => EXIT_FAILURE,
        }
    }

    /// Returns the delivery error behind this failure, if any.
    pub fn delivery_error(&self) -> Option<&herald_slack::Error> {
        let (Self::Configuration(error)
        | Self::InvalidInput(error)
        | Self::Rejected(error)
        | Self::Exhausted(error)
        | Self::Other(error)) = self;

        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<herald_slack::Error>())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        let kind = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<herald_slack::Error>())
            .map(herald_slack::Error::kind);

        match kind {
            Some(ErrorKind::Configuration) => Self::Configuration(error),
            Some(ErrorKind::InvalidInput) => Self::InvalidInput(error),
            Some(ErrorKind::ApplicationRejected) => Self::Rejected(error),
            Some(ErrorKind::TransportExhausted) => Self::Exhausted(error),
            _ => Self::Other(error),
        }
    }
}
