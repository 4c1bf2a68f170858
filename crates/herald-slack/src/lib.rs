#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod service;

pub mod blocks;
pub mod compose;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use blocks::{Attachment, Block, Text};
pub use compose::{Field, Mention, Status, compose, compose_message};
pub use config::{
    DEFAULT_API_BASE, DEFAULT_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS,
    DeliveryConfig,
};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use request::{MessagePayload, UploadRequest};
pub use response::{DeliveryResult, UploadResult};
pub use service::SlackService;
pub use transport::{TransportMode, select, select_api};

/// Tracing target for delivery operations.
pub const TRACING_TARGET: &str = "herald_slack";

/// Core trait for message delivery and file upload.
///
/// Implement this trait to create custom delivery providers.
#[async_trait::async_trait]
pub trait SlackProvider: Send + Sync {
    /// Delivers a message over the configured transport.
    ///
    /// Returns the thread reference of the posted message when the transport
    /// provides one.
    async fn send(&self, payload: &MessagePayload) -> Result<DeliveryResult>;

    /// Uploads a file, optionally into the thread of a previous message.
    ///
    /// Requires a bot token: incoming webhooks cannot upload files.
    async fn upload(&self, request: &UploadRequest) -> Result<UploadResult>;
}
