//! Transport selection.

use std::fmt;

use url::Url;

use crate::{DeliveryConfig, Error, Result};

/// The transport a message is delivered over.
#[derive(Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Incoming webhook. The target channel is fixed when the webhook is
    /// created, so channel overrides and thread references have no effect.
    Webhook {
        /// Webhook URL.
        url: Url,
    },
    /// Web API with a bearer credential.
    Api {
        /// Bot token.
        token: String,
        /// Channel the request targets.
        channel: String,
    },
}

impl TransportMode {
    /// Returns the transport name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Webhook { .. } => "webhook",
            Self::Api { .. } => "api",
        }
    }
}

impl fmt::Debug for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook { .. } => f.debug_struct("Webhook").finish_non_exhaustive(),
            Self::Api { channel, .. } => f
                .debug_struct("Api")
                .field("channel", channel)
                .finish_non_exhaustive(),
        }
    }
}

/// Selects the transport for a message.
///
/// The webhook wins when both transports are configured.
///
/// # Errors
///
/// Returns a configuration error if neither a webhook URL nor a bot token
/// together with a default channel is configured.
pub fn select(config: &DeliveryConfig) -> Result<TransportMode> {
    if let Some(url) = &config.webhook_url {
        return Ok(TransportMode::Webhook { url: url.clone() });
    }

    match (non_empty(&config.bot_token), non_empty(&config.channel)) {
        (Some(token), Some(channel)) => Ok(TransportMode::Api {
            token: token.to_owned(),
            channel: channel.to_owned(),
        }),
        _ => Err(Error::configuration()
            .with_message("no transport configured")
            .with_context("set SLACK_WEBHOOK_URL, or SLACK_BOT_TOKEN and SLACK_CHANNEL")),
    }
}

/// Selects the Web API transport, which file upload requires.
///
/// `channel` overrides the configured default channel.
///
/// # Errors
///
/// Returns a configuration error if no bot token is configured, even when a
/// webhook is, or if no channel is given or configured.
pub fn select_api(config: &DeliveryConfig, channel: Option<&str>) -> Result<TransportMode> {
    let (token, channel) = api_credentials(config, channel)?;
    Ok(TransportMode::Api {
        token: token.to_owned(),
        channel: channel.to_owned(),
    })
}

/// Resolves the bot token and target channel of a Web API call.
pub(crate) fn api_credentials<'a>(
    config: &'a DeliveryConfig,
    channel: Option<&'a str>,
) -> Result<(&'a str, &'a str)> {
    let Some(token) = non_empty(&config.bot_token) else {
        return Err(Error::configuration()
            .with_message("file upload requires a bot token")
            .with_context("set SLACK_BOT_TOKEN; incoming webhooks cannot upload files"));
    };

    let channel = channel
        .filter(|channel| !channel.is_empty())
        .or_else(|| non_empty(&config.channel));
    let Some(channel) = channel else {
        return Err(Error::configuration()
            .with_message("channel not set")
            .with_context("pass --channel or set SLACK_CHANNEL"));
    };

    Ok((token, channel))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn webhook_url() -> Url {
        Url::parse("https://hooks.slack.com/services/T000/B000/XXXX").unwrap()
    }

    #[test]
    fn test_select_webhook() {
        let config = DeliveryConfig::webhook(webhook_url());
        let mode = select(&config).unwrap();
        assert_eq!(mode, TransportMode::Webhook { url: webhook_url() });
        assert_eq!(mode.name(), "webhook");
    }

    #[test]
    fn test_select_api() {
        let config = DeliveryConfig::api("xoxb-1", "C0123456789");
        let mode = select(&config).unwrap();
        assert_eq!(
            mode,
            TransportMode::Api {
                token: "xoxb-1".to_owned(),
                channel: "C0123456789".to_owned(),
            }
        );
    }

    #[test]
    fn test_webhook_wins_when_both_configured() {
        let config = DeliveryConfig::api("xoxb-1", "#builds").with_webhook_url(webhook_url());
        assert_eq!(select(&config).unwrap().name(), "webhook");
    }

    #[test]
    fn test_select_fails_without_transport() {
        let configs = [
            DeliveryConfig::default(),
            DeliveryConfig {
                bot_token: Some("xoxb-1".to_owned()),
                ..DeliveryConfig::default()
            },
            DeliveryConfig {
                channel: Some("#builds".to_owned()),
                ..DeliveryConfig::default()
            },
            DeliveryConfig::api("", "#builds"),
            DeliveryConfig::api("xoxb-1", ""),
        ];

        for config in configs {
            let error = select(&config).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Configuration, "{config:?}");
        }
    }

    #[test]
    fn test_select_api_requires_token() {
        let config = DeliveryConfig::webhook(webhook_url());
        let error = select_api(&config, Some("#builds")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_select_api_channel_override() {
        let config = DeliveryConfig::api("xoxb-1", "#builds");
        let mode = select_api(&config, Some("#releases")).unwrap();
        assert!(matches!(mode, TransportMode::Api { channel, .. } if channel == "#releases"));

        let mode = select_api(&config, None).unwrap();
        assert!(matches!(mode, TransportMode::Api { channel, .. } if channel == "#builds"));
    }

    #[test]
    fn test_select_api_requires_channel() {
        let config = DeliveryConfig {
            bot_token: Some("xoxb-1".to_owned()),
            ..DeliveryConfig::default()
        };
        let error = select_api(&config, None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_debug_hides_token() {
        let mode = TransportMode::Api {
            token: "xoxb-secret".to_owned(),
            channel: "#builds".to_owned(),
        };
        assert!(!format!("{mode:?}").contains("xoxb-secret"));
    }
}
