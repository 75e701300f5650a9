//! Share command implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use shaloc_core::config::ShareConfig;
use shaloc_core::crypto::Passphrase;
use shaloc_core::file::format_size;
use shaloc_core::session::{DownloadLimit, RouteName, ServingSession, ShareOptions};

use super::{BindArgs, ShareArgs, SourceArgs};
use crate::ui::{describe_summary, UrlBox};

/// Run the share command.
pub async fn run(args: ShareArgs) -> Result<()> {
    let config = super::load_config().share;

    let limit = DownloadLimit::from_raw(args.max.unwrap_or(config.max_downloads))?;
    let passphrase = if args.aes {
        Some(crate::prompt::confirmed_passphrase()?)
    } else {
        None
    };

    serve_source(&args.source, &args.bind, &config, limit, passphrase).await
}

/// Share a file, or a folder through a temporary zip archive, until the
/// quota is reached or Ctrl+C is pressed.
pub(super) async fn serve_source(
    source: &SourceArgs,
    bind: &BindArgs,
    config: &ShareConfig,
    limit: DownloadLimit,
    passphrase: Option<Passphrase>,
) -> Result<()> {
    let (path, archive_dir) = resolve_source(source).await?;

    let result = serve_path(&path, bind, config, limit, passphrase).await;

    if let Some(dir) = archive_dir {
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            tracing::warn!("Failed to remove {}: {}", dir.display(), e);
        }
    }

    result
}

async fn resolve_source(source: &SourceArgs) -> Result<(PathBuf, Option<PathBuf>)> {
    match (&source.file, &source.folder) {
        (Some(file), _) => Ok((file.clone(), None)),
        (None, Some(folder)) => {
            let work_dir = shaloc_core::file::create_work_dir()?;
            match shaloc_core::file::compress_folder(folder, &work_dir).await {
                Ok(archive) => Ok((archive, Some(work_dir))),
                Err(e) => {
                    let _ = tokio::fs::remove_dir_all(&work_dir).await;
                    Err(e).with_context(|| format!("Failed to zip {}", folder.display()))
                }
            }
        }
        (None, None) => anyhow::bail!("Either --file or --folder is required"),
    }
}

async fn serve_path(
    path: &Path,
    bind: &BindArgs,
    config: &ShareConfig,
    limit: DownloadLimit,
    passphrase: Option<Passphrase>,
) -> Result<()> {
    let encrypted = passphrase.is_some();

    let mut options = ShareOptions::new(path)
        .with_bind(
            bind.ip.clone().unwrap_or_else(|| config.ip.clone()),
            bind.port.clone().unwrap_or_else(|| config.port.clone()),
        )
        .with_route(RouteName::from_length(
            bind.random.unwrap_or(config.random_length),
        ))
        .with_limit(limit)
        .with_shutdown_timeout(config.shutdown_timeout);
    if let Some(passphrase) = passphrase {
        options = options.with_passphrase(passphrase);
    }

    let session = ServingSession::prepare(options).await?;
    let size = session.artifact().size();

    let running = match session.start().await {
        Ok(running) => running,
        Err(e) => {
            if let Some(hint) = e.suggestion() {
                eprintln!("  {}", hint);
            }
            return Err(e.into());
        }
    };

    println!();
    println!("Shaloc v{}", shaloc_core::VERSION);
    println!("{}", "-".repeat(37));
    println!();
    println!("  {} ({})", path.display(), format_size(size));
    println!();
    UrlBox::new(&running.url())
        .with_downloads(running.remaining())
        .encrypted(encrypted)
        .display();
    println!();
    println!("  Press Ctrl+C to stop sharing.");
    println!();

    let signal = running.shutdown_signal();
    let ctrl_c = tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                if signal.trigger() {
                    tracing::info!("Interrupted, shutting down the server.");
                }
            }
            () = signal.wait() => {}
        }
    });

    let start_time = Instant::now();
    let summary = running.wait().await?;
    ctrl_c.abort();

    println!(
        "  {} ({}s)",
        describe_summary(&summary),
        start_time.elapsed().as_secs()
    );
    Ok(())
}
