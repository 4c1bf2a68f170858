//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── delivery: DeliveryConfig  # Webhook URL, bot token, retries, timeouts
//! ├── message: MessageArgs      # Text, tile, status, mention, file
//! └── pipeline: PipelineArgs    # JOB_NAME, BUILD_NUMBER, GIT_COMMIT, ...
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! # Post a status tile through the Web API
//! SLACK_BOT_TOKEN="xoxb-..." SLACK_CHANNEL="#builds" herald --tile --status SUCCESS
//!
//! # Or a plain message through an incoming webhook
//! SLACK_WEBHOOK_URL="https://hooks.slack.com/services/..." herald -m "Deployed"
//! ```

mod message;
mod pipeline;

use std::process;

use anyhow::Context;
use clap::Parser;
use herald_slack::{DeliveryConfig, transport};
pub use message::MessageArgs;
pub use pipeline::PipelineArgs;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
///
/// Combines all configuration groups for the notifier:
/// - [`DeliveryConfig`]: Transport credentials and retry behavior
/// - [`MessageArgs`]: Message content and routing
/// - [`PipelineArgs`]: Build metadata shown on tiles
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "herald")]
#[command(about = "Send rich Slack messages (tiles/text) and files")]
#[command(version)]
pub struct Cli {
    /// Transport credentials, retries and timeouts.
    #[clap(flatten)]
    pub delivery: DeliveryConfig,

    /// Message content and routing.
    #[clap(flatten)]
    pub message: MessageArgs,

    /// Build pipeline metadata.
    #[clap(flatten)]
    pub pipeline: PipelineArgs,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// This ensures .env files are loaded before clap parses arguments,
    /// allowing environment variables from .env to be used as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so that stdout stays free for the caller.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Returns the delivery configuration.
    ///
    /// The `--channel` override stands in for an unset default channel.
    pub fn delivery_config(&self) -> DeliveryConfig {
        let mut config = self.delivery.clone();
        if config.channel.as_deref().is_none_or(str::is_empty) {
            config.channel.clone_from(&self.message.channel);
        }
        config
    }

    /// Validates all configuration values.
    ///
    /// A file upload additionally requires Web API credentials, which are
    /// checked here so that nothing is sent when the upload cannot follow.
    pub fn validate(&self) -> anyhow::Result<()> {
        let config = self.delivery_config();
        config
            .validate()
            .context("invalid delivery configuration")?;

        transport::select(&config).context("no usable transport")?;

        if self.message.file.is_some() {
            transport::select_api(&config, self.message.channel.as_deref())
                .context("file upload requires a bot token and a channel")?;
        }

        Ok(())
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            has_webhook = self.delivery.webhook_url.is_some(),
            has_bot_token = self.delivery.bot_token.is_some(),
            default_channel = ?self.delivery.channel,
            http_timeout_secs = self.delivery.http_timeout,
            max_retries = self.delivery.max_retries,
            backoff_ms = self.delivery.backoff_ms,
            "Delivery configuration"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            tile = self.message.tile,
            status = %self.message.effective_status(),
            mention = %self.message.mention,
            channel = ?self.message.channel,
            file = ?self.message.file,
            job = ?self.pipeline.job_name,
            build = ?self.pipeline.build_number,
            "Message configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
