//! Delivery and upload result types.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a successful message delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Unique identifier of the send operation.
    pub request_id: Uuid,
    /// Whether the remote system accepted the message.
    pub ok: bool,
    /// Thread reference of the posted message (Web API only).
    pub thread_ts: Option<String>,
    /// Channel the message was posted to, as reported by the remote system.
    pub channel: Option<String>,
    /// HTTP status code of the accepted response.
    pub status_code: u16,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    /// Total time spent waiting between attempts.
    pub waited: Duration,
    /// Timestamp when the first attempt was started.
    pub started_at: Timestamp,
    /// Timestamp when the accepted response was received.
    pub finished_at: Timestamp,
    /// Raw response body (`null` for webhooks, which acknowledge with plain text).
    #[serde(default)]
    pub body: serde_json::Value,
}

impl DeliveryResult {
    /// Calculates the duration of the whole send operation.
    pub fn duration(&self) -> jiff::Span {
        self.started_at.until(self.finished_at).unwrap_or_default()
    }

    /// Returns the thread reference, for attaching follow-ups to this message.
    pub fn thread(&self) -> Option<&str> {
        self.thread_ts.as_deref()
    }
}

/// Outcome of a successful file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Unique identifier of the upload operation.
    pub request_id: Uuid,
    /// Identifier of the uploaded file, as reported by the remote system.
    pub file_id: Option<String>,
    /// HTTP status code of the accepted response.
    pub status_code: u16,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    /// Total time spent waiting between attempts.
    pub waited: Duration,
    /// Timestamp when the first attempt was started.
    pub started_at: Timestamp,
    /// Timestamp when the accepted response was received.
    pub finished_at: Timestamp,
    /// Raw response body.
    pub body: serde_json::Value,
}

impl UploadResult {
    /// Calculates the duration of the whole upload operation.
    pub fn duration(&self) -> jiff::Span {
        self.started_at.until(self.finished_at).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_reference() {
        let started_at = Timestamp::now();
        let result = DeliveryResult {
            request_id: Uuid::now_v7(),
            ok: true,
            thread_ts: Some("1690000000.000100".to_owned()),
            channel: Some("C0123456789".to_owned()),
            status_code: 200,
            attempts: 1,
            waited: Duration::ZERO,
            started_at,
            finished_at: Timestamp::now(),
            body: serde_json::Value::Null,
        };

        assert_eq!(result.thread(), Some("1690000000.000100"));
        assert!(!result.duration().is_negative());
    }
}
