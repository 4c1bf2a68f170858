#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;

use std::process;

use anyhow::Context;
use herald_slack::reqwest::ReqwestClient;
use herald_slack::{MessagePayload, SlackService, UploadRequest};

use crate::config::Cli;
use crate::error::CliError;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "herald_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "herald_cli::config";
pub const TRACING_TARGET_NOTIFY: &str = "herald_cli::notify";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    let error = CliError::from(error);
    let context = error
        .delivery_error()
        .and_then(|cause| cause.context.as_deref());

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_NOTIFY,
            code = error.error_code(),
            context = context,
            "{error}"
        );
    } else {
        eprintln!("error[{}]: {error}", error.error_code());
        if let Some(context) = context {
            eprintln!("  context: {context}");
        }
    }

    process::exit(error.exit_code());
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let client = ReqwestClient::new(cli.delivery_config()).context("failed to create client")?;
    let service = client.into_service();

    let payload = cli.message.payload(&cli.pipeline);
    match cli.message.upload() {
        Some(upload) => notify_with_file(&service, &payload, upload).await,
        None => notify(&service, &payload).await,
    }
}

/// Sends the message alone.
async fn notify(service: &SlackService, payload: &MessagePayload) -> anyhow::Result<()> {
    let delivered = service.send(payload).await.context("failed to send message")?;

    tracing::info!(
        target: TRACING_TARGET_NOTIFY,
        attempts = delivered.attempts,
        thread_ts = ?delivered.thread_ts,
        "Notification sent"
    );

    Ok(())
}

/// Sends the message, then uploads the file into its thread.
async fn notify_with_file(
    service: &SlackService,
    payload: &MessagePayload,
    upload: UploadRequest,
) -> anyhow::Result<()> {
    let path = upload.path.display().to_string();
    let (delivered, uploaded) = service
        .send_with_file(payload, upload)
        .await
        .with_context(|| format!("failed to send message with {path}"))?;

    tracing::info!(
        target: TRACING_TARGET_NOTIFY,
        attempts = delivered.attempts,
        thread_ts = ?delivered.thread_ts,
        file_id = ?uploaded.file_id,
        "Notification sent with file"
    );

    Ok(())
}
