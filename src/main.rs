// src/main.rs
//! Relayscope Capture Engine
//!
//! Local debugging transport for the capture protocol: line-delimited JSON
//! requests on stdin, one JSON response per line on stdout, persisted through
//! a file-backed store.

use anyhow::Result;
use relayscope_engine::{CaptureConfig, CaptureEngine, Dispatcher, FileBacking, Request};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Relayscope capture engine v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = std::env::var("RELAYSCOPE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".relayscope"));
    info!("Persisting under {:?}", data_dir);

    let engine = CaptureEngine::new(FileBacking::new(data_dir), CaptureConfig::default());
    let dispatcher = Dispatcher::new(engine);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let response = dispatcher.handle(request).await;
                serde_json::to_string(&response)?
            }
            Err(e) => {
                warn!("Unparsable request line: {}", e);
                r#"{"success":false}"#.to_string()
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}
