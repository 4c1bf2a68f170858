//! Message and file upload request types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::blocks::{Attachment, Block};
use crate::compose::Mention;

/// A transport-agnostic message.
///
/// Empty text and empty block or attachment lists are treated as absent. A
/// payload with neither text nor blocks is still sent; rejecting it is left to
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Message text, also used as the notification fallback for blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Ordered layout blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    /// Attachments, used for the colored sidebar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    /// Thread to reply into (Web API only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Channel overriding the configured default (Web API only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl MessagePayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a text-only payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().with_text(text)
    }

    /// Sets the message text. Empty text clears it.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = (!text.is_empty()).then_some(text);
        self
    }

    /// Sets the layout blocks. An empty list clears them.
    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = (!blocks.is_empty()).then_some(blocks);
        self
    }

    /// Sets the attachments. An empty list clears them.
    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = (!attachments.is_empty()).then_some(attachments);
        self
    }

    /// Sets the thread to reply into.
    pub fn with_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    /// Sets the target channel override.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Prepends the broadcast token of `mention` to the text.
    ///
    /// The result is trimmed; a payload without text gains the bare token.
    pub fn with_mention(mut self, mention: Mention) -> Self {
        let text = format!("{}{}", mention.token(), self.text.as_deref().unwrap_or(""));
        let text = text.trim();
        self.text = (!text.is_empty()).then(|| text.to_owned());
        self
    }

    /// Returns `true` if the payload carries neither text nor blocks.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.blocks.is_none()
    }
}

/// A request to upload a file, optionally into an existing thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Path of the file to upload.
    pub path: PathBuf,
    /// File name shown in the chat client, defaults to the path's file name.
    pub filename: Option<String>,
    /// Channel overriding the configured default.
    pub channel: Option<String>,
    /// Message posted along with the file.
    pub initial_comment: Option<String>,
    /// Thread the file is attached to.
    pub thread_ts: Option<String>,
}

impl UploadRequest {
    /// Creates an upload request for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filename: None,
            channel: None,
            initial_comment: None,
            thread_ts: None,
        }
    }

    /// Sets the displayed file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the target channel override.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets the comment posted with the file.
    pub fn with_initial_comment(mut self, comment: impl Into<String>) -> Self {
        self.initial_comment = Some(comment.into());
        self
    }

    /// Sets the thread the file is attached to, if any.
    pub fn with_thread(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }

    /// Returns the file name sent to the remote API.
    pub fn effective_filename(&self) -> String {
        self.filename.clone().unwrap_or_else(|| file_name(&self.path))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_text_payload_serializes_only_text() {
        let payload = MessagePayload::text("build passed");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"text": "build passed"})
        );
    }

    #[test]
    fn test_empty_values_are_absent() {
        let payload = MessagePayload::text("")
            .with_blocks(Vec::new())
            .with_attachments(Vec::new());
        assert!(payload.is_empty());
        assert!(payload.attachments.is_none());
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({}));
    }

    #[test]
    fn test_mention_prepends_token() {
        let payload = MessagePayload::text("deploy done").with_mention(Mention::Here);
        assert_eq!(payload.text.as_deref(), Some("<!here> deploy done"));

        let payload = MessagePayload::text("deploy done").with_mention(Mention::Channel);
        assert_eq!(payload.text.as_deref(), Some("<!channel> deploy done"));

        let payload = MessagePayload::text("deploy done").with_mention(Mention::None);
        assert_eq!(payload.text.as_deref(), Some("deploy done"));
    }

    #[test]
    fn test_mention_without_text() {
        let payload = MessagePayload::new().with_mention(Mention::Here);
        assert_eq!(payload.text.as_deref(), Some("<!here>"));

        let payload = MessagePayload::new().with_mention(Mention::None);
        assert!(payload.text.is_none());
    }

    #[test]
    fn test_upload_filename_defaults_to_path() {
        let request = UploadRequest::new("/tmp/logs/build.log");
        assert_eq!(request.effective_filename(), "build.log");

        let request = request.with_filename("console.txt");
        assert_eq!(request.effective_filename(), "console.txt");
    }
}
