//! Exchange strategies: webhook message, API message and file upload.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use super::TRACING_TARGET;
use super::retry::Exchange;
use crate::blocks::{Attachment, Block};
use crate::{Error, MessagePayload, Result};

/// Error code used when a rejection carries no `error` field.
const UNKNOWN_ERROR_CODE: &str = "unknown_error";

/// Body of an incoming webhook request.
#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<&'a [Block]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a [Attachment]>,
}

/// Body of a `chat.postMessage` request.
#[derive(Debug, Serialize)]
struct PostMessageBody<'a> {
    channel: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocks: Option<&'a [Block]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<&'a [Attachment]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

/// Fields of a Web API response that the client reads.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    file: Option<ApiFile>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFile {
    #[serde(default)]
    id: Option<String>,
}

/// Reply to a delivered message.
#[derive(Debug)]
pub(crate) struct MessageReply {
    pub thread_ts: Option<String>,
    pub channel: Option<String>,
    pub body: serde_json::Value,
}

/// Reply to an uploaded file.
#[derive(Debug)]
pub(crate) struct UploadReply {
    pub file_id: Option<String>,
    pub body: serde_json::Value,
}

/// Message sent to an incoming webhook. Success is the HTTP status alone.
pub(crate) struct WebhookMessage {
    url: Url,
    body: Vec<u8>,
}

impl WebhookMessage {
    pub fn new(url: Url, payload: &MessagePayload) -> Result<Self> {
        let body = WebhookBody {
            text: payload.text.as_deref(),
            blocks: payload.blocks.as_deref(),
            attachments: payload.attachments.as_deref(),
        };

        Ok(Self {
            url,
            body: serde_json::to_vec(&body)?,
        })
    }
}

#[async_trait::async_trait]
impl Exchange for WebhookMessage {
    type Output = MessageReply;

    fn name(&self) -> &'static str {
        "webhook"
    }

    fn build(&self, http: &Client) -> Result<RequestBuilder> {
        Ok(http
            .post(self.url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(self.body.clone()))
    }

    async fn interpret(&self, response: Response) -> Result<Self::Output> {
        let ack = response.text().await?;
        tracing::trace!(target: TRACING_TARGET, ack = %ack, "Webhook acknowledged");

        Ok(MessageReply {
            thread_ts: None,
            channel: None,
            body: serde_json::Value::Null,
        })
    }
}

/// Message sent through `chat.postMessage`.
pub(crate) struct ApiMessage {
    url: Url,
    token: String,
    body: Vec<u8>,
}

impl ApiMessage {
    pub fn new(url: Url, token: &str, channel: &str, payload: &MessagePayload) -> Result<Self> {
        let body = PostMessageBody {
            channel,
            text: payload.text.as_deref(),
            blocks: payload.blocks.as_deref(),
            attachments: payload.attachments.as_deref(),
            thread_ts: payload.thread_ts.as_deref(),
        };

        Ok(Self {
            url,
            token: token.to_owned(),
            body: serde_json::to_vec(&body)?,
        })
    }
}

#[async_trait::async_trait]
impl Exchange for ApiMessage {
    type Output = MessageReply;

    fn name(&self) -> &'static str {
        "chat.postMessage"
    }

    fn build(&self, http: &Client) -> Result<RequestBuilder> {
        Ok(http
            .post(self.url.as_str())
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(self.body.clone()))
    }

    async fn interpret(&self, response: Response) -> Result<Self::Output> {
        let payload = String::from_utf8_lossy(&self.body);
        let (reply, body) = read_reply(self.name(), response, &payload).await?;

        Ok(MessageReply {
            thread_ts: reply.ts,
            channel: reply.channel,
            body,
        })
    }
}

/// File sent through `files.upload` as a multipart form.
pub(crate) struct FileUpload {
    pub url: Url,
    pub token: String,
    pub channel: String,
    pub filename: String,
    pub content: Vec<u8>,
    pub initial_comment: Option<String>,
    pub thread_ts: Option<String>,
}

impl FileUpload {
    /// Describes the form fields for rejection diagnostics.
    fn describe(&self) -> String {
        serde_json::json!({
            "channels": self.channel,
            "filename": self.filename,
            "bytes": self.content.len(),
            "initial_comment": self.initial_comment,
            "thread_ts": self.thread_ts,
        })
        .to_string()
    }
}

#[async_trait::async_trait]
impl Exchange for FileUpload {
    type Output = UploadReply;

    fn name(&self) -> &'static str {
        "files.upload"
    }

    fn build(&self, http: &Client) -> Result<RequestBuilder> {
        let file = Part::bytes(self.content.clone()).file_name(self.filename.clone());
        let mut form = Form::new()
            .text("channels", self.channel.clone())
            .part("file", file);

        if let Some(comment) = &self.initial_comment {
            form = form.text("initial_comment", comment.clone());
        }
        if let Some(thread_ts) = &self.thread_ts {
            form = form.text("thread_ts", thread_ts.clone());
        }

        Ok(http
            .post(self.url.as_str())
            .bearer_auth(&self.token)
            .multipart(form))
    }

    async fn interpret(&self, response: Response) -> Result<Self::Output> {
        let (reply, body) = read_reply(self.name(), response, &self.describe()).await?;

        Ok(UploadReply {
            file_id: reply.file.and_then(|file| file.id),
            body,
        })
    }
}

/// Reads a Web API response and checks its `ok` indicator.
///
/// An unreadable or non-JSON body is a retryable malformed response; `ok`
/// false or absent is a non-retryable rejection carrying `payload` as context.
async fn read_reply(
    name: &str,
    response: Response,
    payload: &str,
) -> Result<(ApiReply, serde_json::Value)> {
    let bytes = response.bytes().await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|error| {
        Error::malformed_response()
            .with_message(format!("{name} returned a non-JSON body"))
            .with_source(error)
    })?;
    let reply = ApiReply::deserialize(&body).map_err(|error| {
        Error::malformed_response()
            .with_message(format!("{name} returned an unexpected body"))
            .with_source(error)
    })?;

    if reply.ok != Some(true) {
        let code = reply
            .error
            .clone()
            .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned());

        return Err(Error::application_rejected(code)
            .with_message(format!("{name} rejected the request"))
            .with_context(format!("payload={payload}")));
    }

    Ok((reply, body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::compose::{Status, compose_message};

    fn body_json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_webhook_body_drops_routing_fields() {
        let payload = MessagePayload::text("build passed")
            .with_channel("#ignored")
            .with_thread("1690000000.000100");
        let url = Url::parse("https://hooks.slack.com/services/T/B/X").unwrap();
        let message = WebhookMessage::new(url, &payload).unwrap();

        assert_eq!(body_json(&message.body), json!({"text": "build passed"}));
    }

    #[test]
    fn test_post_message_body() {
        let payload = compose_message("deployed", Status::Success).with_thread("1690000000.000100");
        let url = Url::parse("https://slack.com/api/chat.postMessage").unwrap();
        let message = ApiMessage::new(url, "xoxb-1", "C0123456789", &payload).unwrap();

        assert_eq!(
            body_json(&message.body),
            json!({
                "channel": "C0123456789",
                "text": "deployed",
                "attachments": [{"color": "good"}],
                "thread_ts": "1690000000.000100",
            })
        );
    }

    #[test]
    fn test_api_reply_fields() {
        let body = json!({"ok": true, "ts": "1.2", "channel": "C1", "file": {"id": "F1"}});
        let reply = ApiReply::deserialize(&body).unwrap();

        assert_eq!(reply.ok, Some(true));
        assert_eq!(reply.ts.as_deref(), Some("1.2"));
        assert_eq!(reply.channel.as_deref(), Some("C1"));
        assert_eq!(reply.file.and_then(|file| file.id).as_deref(), Some("F1"));
    }

    #[test]
    fn test_upload_description_omits_content() {
        let upload = FileUpload {
            url: Url::parse("https://slack.com/api/files.upload").unwrap(),
            token: "xoxb-secret".to_owned(),
            channel: "#builds".to_owned(),
            filename: "build.log".to_owned(),
            content: b"line 1\nline 2\n".to_vec(),
            initial_comment: None,
            thread_ts: Some("1.2".to_owned()),
        };

        let description = upload.describe();
        assert!(description.contains("build.log"));
        assert!(!description.contains("xoxb-secret"));
        assert!(!description.contains("line 1"));
    }
}
