//! Message content and routing options.

use std::path::PathBuf;

use clap::Args;
use herald_slack::{Mention, MessagePayload, Status, UploadRequest, compose, compose_message};
use serde::{Deserialize, Serialize};

use super::PipelineArgs;

/// Title of a tile when none is given.
pub const DEFAULT_TITLE: &str = "🔔 Jenkins Notification";

/// Comment posted along with an uploaded file.
pub const UPLOAD_COMMENT: &str = "↗️ Attached file";

/// What to send and where.
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
pub struct MessageArgs {
    /// Message text, or the context line of a tile
    #[arg(short = 'm', long = "message", default_value = "Hello from Jenkins!")]
    pub message: String,

    /// Channel ID or #name overriding the default channel (bot token only)
    #[arg(id = "channel_override", long = "channel")]
    pub channel: Option<String>,

    /// Send a status tile built from the pipeline metadata
    #[arg(long = "tile", default_value_t = false)]
    pub tile: bool,

    /// Status coloring the message
    #[arg(long = "status", value_enum, ignore_case = true, default_value_t = Status::Info)]
    pub status: Status,

    /// Infer the status from keywords in the message when --status is INFO
    #[arg(long = "infer-status", default_value_t = false)]
    pub infer_status: bool,

    /// Broadcast mention prepended to the message
    #[arg(long = "mention", value_enum, ignore_case = true, default_value_t = Mention::None)]
    pub mention: Mention,

    /// File uploaded into the message thread after sending
    #[arg(long = "file")]
    pub file: Option<PathBuf>,

    /// Title of the tile
    #[arg(long = "title", default_value = DEFAULT_TITLE)]
    pub title: String,
}

impl MessageArgs {
    /// Returns the status coloring the message.
    ///
    /// An explicit status wins; otherwise the status is inferred from the
    /// message text when inference is enabled.
    pub fn effective_status(&self) -> Status {
        match self.status {
            Status::Info if self.infer_status => Status::infer(&self.message),
            status => status,
        }
    }

    /// Builds the payload to send.
    ///
    /// A tile shows the pipeline metadata with the message as its context
    /// line. An explicit status other than INFO replaces the status reported
    /// by the pipeline.
    pub fn payload(&self, pipeline: &PipelineArgs) -> MessagePayload {
        let status = self.effective_status();

        let payload = if self.tile {
            let status_override = (status != Status::Info).then(|| status.as_ref());
            let fields = pipeline.fields(status_override);
            let context: Vec<&str> = Some(self.message.as_str())
                .filter(|message| !message.is_empty())
                .into_iter()
                .collect();
            compose(&self.title, status.as_ref(), &fields, &context)
        } else {
            compose_message(&self.message, status)
        };

        let payload = payload.with_mention(self.mention);
        match &self.channel {
            Some(channel) => payload.with_channel(channel),
            None => payload,
        }
    }

    /// Builds the upload following the message, if a file was given.
    ///
    /// The thread reference is filled in once the message is delivered.
    pub fn upload(&self) -> Option<UploadRequest> {
        let file = self.file.as_ref()?;
        let request = UploadRequest::new(file).with_initial_comment(UPLOAD_COMMENT);

        Some(match &self.channel {
            Some(channel) => request.with_channel(channel),
            None => request,
        })
    }
}
