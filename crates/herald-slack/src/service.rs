//! Shared handle over a delivery provider.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::{
    DeliveryResult, MessagePayload, Result, SlackProvider, TRACING_TARGET, UploadRequest,
    UploadResult,
};

/// Cloneable handle to a [`SlackProvider`], used for dependency injection.
#[derive(Clone)]
pub struct SlackService {
    inner: Arc<dyn SlackProvider>,
}

impl fmt::Debug for SlackService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackService").finish_non_exhaustive()
    }
}

impl SlackService {
    /// Wraps a provider.
    pub fn new<P: SlackProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Sends a message, then uploads a file into its thread.
    ///
    /// The upload inherits the message's thread reference unless the request
    /// already names one. A failed upload does not undo the delivered message.
    pub async fn send_with_file(
        &self,
        payload: &MessagePayload,
        upload: UploadRequest,
    ) -> Result<(DeliveryResult, UploadResult)> {
        let delivered = self.inner.send(payload).await?;

        let upload = match upload.thread_ts {
            Some(_) => upload,
            None => upload.with_thread(delivered.thread_ts.clone()),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %delivered.request_id,
            thread_ts = ?upload.thread_ts,
            "Following message with file upload"
        );

        let uploaded = self.inner.upload(&upload).await?;
        Ok((delivered, uploaded))
    }
}

impl Deref for SlackService {
    type Target = dyn SlackProvider;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use jiff::Timestamp;
    use uuid::Uuid;

    use super::*;
    use crate::{Error, ErrorKind};

    /// Records calls and answers with canned results.
    #[derive(Default)]
    struct Recording {
        uploads: Mutex<Vec<UploadRequest>>,
        reject_upload: bool,
    }

    #[async_trait::async_trait]
    impl SlackProvider for Recording {
        async fn send(&self, _payload: &MessagePayload) -> Result<DeliveryResult> {
            Ok(DeliveryResult {
                request_id: Uuid::now_v7(),
                ok: true,
                thread_ts: Some("1690000000.000100".to_owned()),
                channel: Some("C1".to_owned()),
                status_code: 200,
                attempts: 1,
                waited: Duration::ZERO,
                started_at: Timestamp::now(),
                finished_at: Timestamp::now(),
                body: serde_json::Value::Null,
            })
        }

        async fn upload(&self, request: &UploadRequest) -> Result<UploadResult> {
            self.uploads.lock().unwrap().push(request.clone());
            if self.reject_upload {
                return Err(Error::application_rejected("not_in_channel"));
            }

            Ok(UploadResult {
                request_id: Uuid::now_v7(),
                file_id: Some("F1".to_owned()),
                status_code: 200,
                attempts: 1,
                waited: Duration::ZERO,
                started_at: Timestamp::now(),
                finished_at: Timestamp::now(),
                body: serde_json::Value::Null,
            })
        }
    }

    #[tokio::test]
    async fn test_upload_inherits_thread() {
        let provider = Arc::new(Recording::default());
        let service = SlackService {
            inner: provider.clone(),
        };
        let (delivered, uploaded) = service
            .send_with_file(&MessagePayload::text("done"), UploadRequest::new("build.log"))
            .await
            .unwrap();

        assert_eq!(delivered.thread(), Some("1690000000.000100"));
        assert_eq!(uploaded.file_id.as_deref(), Some("F1"));

        let uploads = provider.uploads.lock().unwrap();
        assert_eq!(uploads[0].thread_ts.as_deref(), Some("1690000000.000100"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let service = SlackService::new(Recording {
            reject_upload: true,
            ..Recording::default()
        });
        let error = service
            .send_with_file(&MessagePayload::text("done"), UploadRequest::new("build.log"))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::ApplicationRejected);
        assert_eq!(error.code(), Some("not_in_channel"));
    }

    #[tokio::test]
    async fn test_explicit_thread_is_kept() {
        let provider = Arc::new(Recording::default());
        let service = SlackService {
            inner: provider.clone(),
        };
        let upload = UploadRequest::new("build.log").with_thread(Some("42.0".to_owned()));
        service
            .send_with_file(&MessagePayload::text("done"), upload)
            .await
            .unwrap();

        let uploads = provider.uploads.lock().unwrap();
        assert_eq!(uploads[0].thread_ts.as_deref(), Some("42.0"));
    }
}
