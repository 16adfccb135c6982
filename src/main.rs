use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{cursor, execute, terminal};
use presigned_upload::utils::{format_bytes, format_duration};
use presigned_upload::{Config, UploadCoordinator, UploadRequest};
use tracing_subscriber::EnvFilter;

/// Upload one file through backend issued presigned URLs.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Config file holding the backend endpoint and upload tuning
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Category the backend uses to pick the storage path
    #[arg(long, default_value = "uploads")]
    category: String,

    #[arg(long, default_value = "application/octet-stream")]
    content_type: String,

    /// Store the object under this name instead of the local file name
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load_config(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    let mut request = UploadRequest::from_path(&args.file, args.content_type, args.category)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if let Some(name) = args.name {
        request = request.with_file_name(name);
    }
    let size = request.size();

    let coordinator = UploadCoordinator::from_config(&config).context("Failed to build uploader")?;
    let handle = coordinator.spawn(request);

    let mut progress = handle.progress();
    let render = tokio::spawn(async move {
        loop {
            let percent = *progress.borrow_and_update();
            let mut out = stdout();
            let _ = execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            );
            let _ = write!(out, "Uploading {} ... {:>3}%", format_bytes(size), percent);
            let _ = out.flush();

            if progress.changed().await.is_err() {
                break;
            }
        }
    });

    let cancel = handle.cancellation_token();
    let finished = handle.finish_with_report();
    tokio::pin!(finished);

    let interrupted = tokio::select! {
        outcome = &mut finished => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    let outcome = match interrupted {
        Some(outcome) => outcome,
        None => {
            tracing::warn!("Interrupted, cancelling upload");
            cancel.cancel();
            finished.await
        }
    };
    let _ = render.await;
    println!();

    let (result, report) = outcome;
    if let Some(elapsed) = report.as_ref().and_then(|report| report.elapsed()) {
        if let Ok(elapsed) = elapsed.to_std() {
            tracing::info!("Session ended after {}", format_duration(elapsed));
        }
    }

    let stored = result.context("Upload failed, please try again")?;
    println!("Stored {} as {}", stored.file_name, stored.key);
    println!("{}", stored.url);

    Ok(())
}
