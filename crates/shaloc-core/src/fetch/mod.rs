//! Downloading a share from a URL.
//!
//! The response body is streamed straight to disk, so large shares never sit
//! in memory.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Name used when the URL has no last path segment.
pub const DEFAULT_OUTPUT_NAME: &str = "out";

/// Default output file name for `url`: its last path segment, or
/// [`DEFAULT_OUTPUT_NAME`].
#[must_use]
pub fn output_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest.split_once('/').map_or("", |(_, path)| path));

    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => DEFAULT_OUTPUT_NAME.to_string(),
    }
}

/// Download `url` into `output` and return the number of bytes written.
///
/// # Errors
///
/// Returns [`Error::Download`] if the request fails or the server answers
/// with a non-success status, and an I/O error if `output` cannot be written.
/// A partially written `output` is removed.
pub async fn download(url: &str, output: &Path) -> Result<u64> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Download(format!("failed to build HTTP client: {e}")))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Download(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Download(format!("{url} answered {status}")));
    }

    let mut file = tokio::fs::File::create(output).await?;
    let written = match write_body(response, &mut file).await {
        Ok(written) => written,
        Err(e) => {
            drop(file);
            let _ = tokio::fs::remove_file(output).await;
            return Err(e);
        }
    };

    tracing::info!("Downloaded {} bytes to {}", written, output.display());
    Ok(written)
}

async fn write_body(response: reqwest::Response, file: &mut tokio::fs::File) -> Result<u64> {
    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::Download(format!("download interrupted: {e}")))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_from_url() {
        assert_eq!(
            output_name_from_url("http://192.168.1.36:8080/report.pdf"),
            "report.pdf"
        );
        assert_eq!(output_name_from_url("http://host/a/b/c.txt?x=1"), "c.txt");
        assert_eq!(output_name_from_url("http://host/dir/"), "out");
        assert_eq!(output_name_from_url("http://host:8080"), "out");
        assert_eq!(output_name_from_url(""), "out");
    }

    #[tokio::test]
    async fn test_download_unreachable_host() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");

        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = download(&format!("http://127.0.0.1:{port}/x"), &output).await;
        assert!(matches!(result, Err(Error::Download(_))));
        assert!(!output.exists());
    }

    #[cfg(feature = "web")]
    #[tokio::test]
    async fn test_download_from_share() {
        use crate::session::{ServingSession, ShareOptions};

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("shared.bin");
        let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&source, &content).unwrap();

        let options = ShareOptions::new(&source)
            .with_bind("127.0.0.1", "0")
            .with_limit_raw(1)
            .unwrap();
        let running = ServingSession::prepare(options)
            .await
            .unwrap()
            .start()
            .await
            .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join(output_name_from_url(&running.url()));
        assert!(output.ends_with("shared.bin"));
        let written = download(&running.url(), &output).await.unwrap();
        assert_eq!(written, content.len() as u64);
        assert_eq!(std::fs::read(&output).unwrap(), content);

        running.wait().await.unwrap();
    }

    #[cfg(feature = "web")]
    #[tokio::test]
    async fn test_download_missing_route_is_an_error() {
        use crate::session::{ServingSession, ShareOptions};

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("shared.txt");
        std::fs::write(&source, b"x").unwrap();

        let running = ServingSession::prepare(ShareOptions::new(&source).with_bind("127.0.0.1", "0"))
            .await
            .unwrap()
            .start()
            .await
            .unwrap();

        let url = format!("http://{}/nope", running.local_addr());
        let output = dir.path().join("nope");
        assert!(matches!(
            download(&url, &output).await,
            Err(Error::Download(_))
        ));
        assert!(!output.exists());

        running.stop();
        running.wait().await.unwrap();
    }
}
