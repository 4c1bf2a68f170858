//! Reqwest-based HTTP client for message delivery and file upload.

use std::sync::Arc;

use jiff::Timestamp;
use reqwest::Client;
use uuid::Uuid;

use super::TRACING_TARGET;
use super::exchange::{ApiMessage, FileUpload, WebhookMessage};
use super::retry::{self, RetryPolicy};
use crate::transport::{self, TransportMode};
use crate::{
    DeliveryConfig, DeliveryResult, Error, MessagePayload, Result, SlackProvider, SlackService,
    UploadRequest, UploadResult,
};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: DeliveryConfig,
    policy: RetryPolicy,
}

/// Reqwest-based client delivering messages and files to Slack.
///
/// The configuration is fixed at construction and shared by every clone.
///
/// # Examples
///
/// ```rust,ignore
/// use herald_slack::reqwest::ReqwestClient;
/// use herald_slack::{DeliveryConfig, MessagePayload, SlackProvider, UploadRequest};
///
/// let client = ReqwestClient::new(DeliveryConfig::api(token, "C0123456789"))?;
/// let sent = client.send(&MessagePayload::text("build passed")).await?;
///
/// let upload = UploadRequest::new("build.log").with_thread(sent.thread_ts);
/// client.upload(&upload).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: DeliveryConfig) -> Result<Self> {
        config.validate()?;

        let policy = RetryPolicy::from(&config);
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = policy.timeout.as_millis(),
            max_attempts = policy.max_attempts,
            backoff_ms = policy.base_backoff.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(policy.timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|error| {
                Error::configuration()
                    .with_message("failed to build HTTP client")
                    .with_source(error)
            })?;

        let inner = ReqwestClientInner {
            http,
            config,
            policy,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &DeliveryConfig {
        &self.inner.config
    }

    /// Gets the retry policy derived from the configuration.
    pub fn policy(&self) -> &RetryPolicy {
        &self.inner.policy
    }

    /// Converts this client into a [`SlackService`] for use with dependency injection.
    pub fn into_service(self) -> SlackService {
        SlackService::new(self)
    }

    /// Delivers a message over an explicitly selected transport.
    ///
    /// In webhook mode the payload's channel override and thread reference
    /// have no effect. In API mode the payload's channel overrides the
    /// channel of `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationRejected`] if the Web API reports a failure, and
    /// [`TransportExhausted`] once every attempt has failed.
    ///
    /// [`ApplicationRejected`]: crate::ErrorKind::ApplicationRejected
    /// [`TransportExhausted`]: crate::ErrorKind::TransportExhausted
    pub async fn deliver(
        &self,
        mode: &TransportMode,
        payload: &MessagePayload,
    ) -> Result<DeliveryResult> {
        let request_id = Uuid::now_v7();
        let started_at = Timestamp::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request_id,
            transport = mode.name(),
            has_text = payload.text.is_some(),
            blocks = payload.blocks.as_ref().map_or(0, Vec::len),
            "Delivering message"
        );

        let attempted = match mode {
            TransportMode::Webhook { url } => {
                if payload.channel.is_some() || payload.thread_ts.is_some() {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        request_id = %request_id,
                        channel = ?payload.channel,
                        thread_ts = ?payload.thread_ts,
                        "Channel and thread are fixed by the webhook, ignoring overrides"
                    );
                }

                let exchange = WebhookMessage::new(url.clone(), payload)?;
                retry::execute(&self.inner.http, &self.inner.policy, &exchange).await?
            }
            TransportMode::Api { token, channel } => {
                let channel = payload.channel.as_deref().unwrap_or(channel);
                let url = self.inner.config.api_endpoint("chat.postMessage")?;
                let exchange = ApiMessage::new(url, token, channel, payload)?;
                retry::execute(&self.inner.http, &self.inner.policy, &exchange).await?
            }
        };

        let result = DeliveryResult {
            request_id,
            ok: true,
            thread_ts: attempted.output.thread_ts,
            channel: attempted.output.channel,
            status_code: attempted.status_code,
            attempts: attempted.attempts,
            waited: attempted.waited,
            started_at,
            finished_at: Timestamp::now(),
            body: attempted.output.body,
        };

        tracing::info!(
            target: TRACING_TARGET,
            request_id = %request_id,
            transport = mode.name(),
            attempts = result.attempts,
            duration = %result.duration(),
            thread_ts = ?result.thread_ts,
            "Message delivered"
        );

        Ok(result)
    }
}

#[async_trait::async_trait]
impl SlackProvider for ReqwestClient {
    async fn send(&self, payload: &MessagePayload) -> Result<DeliveryResult> {
        let mode = transport::select(&self.inner.config)?;
        self.deliver(&mode, payload).await
    }

    async fn upload(&self, request: &UploadRequest) -> Result<UploadResult> {
        let (token, channel) =
            transport::api_credentials(&self.inner.config, request.channel.as_deref())?;

        let request_id = Uuid::now_v7();
        let filename = request.effective_filename();

        let content = tokio::fs::read(&request.path).await.map_err(|error| {
            Error::invalid_input()
                .with_message(format!("cannot read {}", request.path.display()))
                .with_source(error)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request_id,
            filename = %filename,
            bytes = content.len(),
            channel = %channel,
            thread_ts = ?request.thread_ts,
            "Uploading file"
        );

        let started_at = Timestamp::now();
        let exchange = FileUpload {
            url: self.inner.config.api_endpoint("files.upload")?,
            token: token.to_owned(),
            channel: channel.to_owned(),
            filename,
            content,
            initial_comment: request.initial_comment.clone(),
            thread_ts: request.thread_ts.clone(),
        };
        let attempted = retry::execute(&self.inner.http, &self.inner.policy, &exchange).await?;

        let result = UploadResult {
            request_id,
            file_id: attempted.output.file_id,
            status_code: attempted.status_code,
            attempts: attempted.attempts,
            waited: attempted.waited,
            started_at,
            finished_at: Timestamp::now(),
            body: attempted.output.body,
        };

        tracing::info!(
            target: TRACING_TARGET,
            request_id = %request_id,
            attempts = result.attempts,
            duration = %result.duration(),
            file_id = ?result.file_id,
            "File uploaded"
        );

        Ok(result)
    }
}
