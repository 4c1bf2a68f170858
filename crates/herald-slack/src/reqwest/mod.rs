//! Reqwest-based delivery client.
//!
//! [`ReqwestClient`] implements [`SlackProvider`] on top of a single
//! send-with-retry primitive shared by message delivery and file upload. The
//! primitive is parameterized by an exchange strategy that builds each
//! attempt's request and interprets an accepted response.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_slack::reqwest::ReqwestClient;
//! use herald_slack::{DeliveryConfig, MessagePayload, SlackProvider};
//!
//! let client = ReqwestClient::new(DeliveryConfig::webhook(url))?;
//! let result = client.send(&MessagePayload::text("build passed")).await?;
//! ```
//!
//! [`SlackProvider`]: crate::SlackProvider

mod client;
mod error;
mod exchange;
mod retry;

pub use client::ReqwestClient;
pub use retry::{RetryPolicy, retry_after};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "herald_slack::reqwest";

/// Tracing target for the retry loop.
pub const TRACING_TARGET_RETRY: &str = "herald_slack::retry";
