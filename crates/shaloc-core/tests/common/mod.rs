//! Common test utilities for shaloc integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use shaloc_core::session::{RunningSession, ServingSession, ShareOptions};

/// Create a temporary directory for test files.
///
/// The directory will be automatically cleaned up when the returned
/// `TempDir` is dropped.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test file with the given content.
pub fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Generate random bytes for testing.
pub fn random_bytes(size: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Options sharing `source` on an ephemeral localhost port.
pub fn local_options(source: &Path) -> ShareOptions {
    ShareOptions::new(source).with_bind("127.0.0.1", "0")
}

/// Prepare and start a share.
pub async fn start_share(options: ShareOptions) -> RunningSession {
    ServingSession::prepare(options)
        .await
        .expect("Failed to prepare share")
        .start()
        .await
        .expect("Failed to start share")
}

/// GET `url` and return the status and the full body.
pub async fn fetch(client: &reqwest::Client, url: &str) -> reqwest::Result<(u16, Vec<u8>)> {
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    Ok((status, body.to_vec()))
}

/// Wait for a share to close, failing the test if it takes too long.
pub async fn wait_closed(running: RunningSession) -> shaloc_core::session::SessionSummary {
    tokio::time::timeout(std::time::Duration::from_secs(10), running.wait())
        .await
        .expect("Share did not close in time")
        .expect("Share failed")
}
