//! Delivery configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default timeout for HTTP requests: 12 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 12;

/// Default number of attempts per send operation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default linear backoff unit: 800 milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 800;

/// Default base URL of the Slack Web API.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api/";

/// Configuration for message delivery and file upload.
///
/// Exactly one transport is used per send: the incoming webhook when
/// `webhook_url` is set, otherwise the Web API when both `bot_token` and
/// `channel` are set. See [`crate::transport::select`].
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct DeliveryConfig {
    /// Incoming webhook URL (channel is fixed when the webhook is created)
    #[cfg_attr(
        feature = "config",
        arg(long = "webhook-url", env = "SLACK_WEBHOOK_URL")
    )]
    #[serde(default)]
    pub webhook_url: Option<Url>,

    /// Bot token used as bearer credential for Web API calls
    #[cfg_attr(
        feature = "config",
        arg(long = "bot-token", env = "SLACK_BOT_TOKEN", hide_env_values = true)
    )]
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,

    /// Default channel ID or #name for Web API calls
    #[cfg_attr(
        feature = "config",
        arg(long = "default-channel", env = "SLACK_CHANNEL")
    )]
    #[serde(default)]
    pub channel: Option<String>,

    /// Base URL of the Web API
    #[cfg_attr(
        feature = "config",
        arg(long = "api-base", env = "SLACK_API_BASE", default_value = DEFAULT_API_BASE)
    )]
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    /// HTTP request timeout in seconds, per attempt
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value_t = 15)
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// Maximum number of attempts per send operation
    #[cfg_attr(
        feature = "config",
        arg(long = "max-retries", env = "SLACK_MAX_RETRIES", default_value_t = 4)
    )]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff unit in milliseconds after a transport failure
    #[cfg_attr(
        feature = "config",
        arg(long = "backoff-ms", env = "SLACK_BACKOFF_MS", default_value_t = DEFAULT_BACKOFF_MS)
    )]
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            bot_token: None,
            channel: None,
            api_base: default_api_base(),
            http_timeout: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            user_agent: None,
        }
    }
}

impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<redacted>"))
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("channel", &self.channel)
            .field("api_base", &self.api_base.as_str())
            .field("http_timeout", &self.http_timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_ms", &self.backoff_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DeliveryConfig {
    /// Creates a webhook-mode configuration.
    pub fn webhook(url: Url) -> Self {
        Self {
            webhook_url: Some(url),
            ..Self::default()
        }
    }

    /// Creates an API-mode configuration.
    pub fn api(bot_token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            bot_token: Some(bot_token.into()),
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_retries` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::configuration()
                .with_message("max_retries must be at least 1")
                .with_context(format!("max_retries={}", self.max_retries)));
        }

        Ok(())
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the linear backoff unit as a Duration.
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("herald/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Returns the full URL of a Web API method, e.g. `chat.postMessage`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL cannot be joined.
    pub fn api_endpoint(&self, method: &str) -> Result<Url> {
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(base.join(method)?)
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the maximum number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the linear backoff unit in milliseconds.
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Set the Web API base URL.
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// Set the webhook URL.
    pub fn with_webhook_url(mut self, url: Url) -> Self {
        self.webhook_url = Some(url);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
