//! State shared by the share route and the session that owns it.
//!
//! The download counter, the shutdown signal and the artifact path are the
//! only mutable shared state. Handlers only ever see them through
//! [`ShareState`], wrapped in an [`Arc`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::session::counter::{DownloadCounter, DownloadOutcome};
use crate::session::shutdown::ShutdownSignal;
use crate::session::{Artifact, CloseReason, SessionState, SessionSummary};

/// Shared state type used by the axum router.
pub type SharedState = Arc<ShareState>;

/// Everything a request handler needs to serve one share.
#[derive(Debug)]
pub struct ShareState {
    /// The file served on the route
    pub artifact: Artifact,
    /// Remaining download quota
    pub counter: DownloadCounter,
    /// Fired once the session must stop accepting connections
    pub shutdown: ShutdownSignal,
    state_tx: watch::Sender<SessionState>,
    close_reason: OnceLock<CloseReason>,
    completed: AtomicU64,
}

impl ShareState {
    /// Create the state for a share that has not started serving yet.
    #[must_use]
    pub fn new(artifact: Artifact, counter: DownloadCounter, shutdown: ShutdownSignal) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            artifact,
            counter,
            shutdown,
            state_tx,
            close_reason: OnceLock::new(),
            completed: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Subscribe to lifecycle changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Number of downloads streamed to completion so far.
    #[must_use]
    pub fn completed_downloads(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_serving(&self) {
        self.transition(SessionState::Idle, SessionState::Serving);
    }

    pub(crate) fn mark_draining(&self) {
        self.transition(SessionState::Serving, SessionState::Draining);
    }

    pub(crate) fn mark_closed(&self) {
        self.state_tx.send_if_modified(|state| {
            let changed = *state != SessionState::Closed;
            *state = SessionState::Closed;
            changed
        });
    }

    fn transition(&self, from: SessionState, to: SessionState) {
        self.state_tx.send_if_modified(|state| {
            if *state == from {
                tracing::debug!("Session {} -> {}", from, to);
                *state = to;
                true
            } else {
                false
            }
        });
    }

    /// Stop accepting new connections. Only the first call has an effect;
    /// it returns `true` and records `reason`.
    pub fn begin_draining(&self, reason: CloseReason) -> bool {
        if !self.shutdown.trigger() {
            return false;
        }
        let _ = self.close_reason.set(reason);
        self.mark_draining();
        true
    }

    /// Account for one response that streamed the whole artifact.
    ///
    /// The request that uses up the quota deletes a temporary artifact before
    /// firing the shutdown signal, so cleanup never races the teardown.
    pub async fn complete_download(&self) -> DownloadOutcome {
        self.completed.fetch_add(1, Ordering::AcqRel);
        let outcome = self.counter.record_download();

        match outcome {
            DownloadOutcome::Exhausted => {
                self.remove_temporary_artifact().await;
                self.begin_draining(CloseReason::QuotaReached);
                tracing::info!("Max number of downloads reached, shutting down the server.");
            }
            DownloadOutcome::Remaining(remaining) => {
                tracing::info!("Downloads remaining: {}", remaining);
            }
            DownloadOutcome::Unbounded => {
                tracing::info!("Download completed ({} so far)", self.completed_downloads());
            }
            DownloadOutcome::AlreadyExhausted => {
                tracing::debug!("Download finished after the quota was reached");
            }
        }

        outcome
    }

    /// Delete the artifact if it is a temporary copy. Safe to call twice.
    pub async fn remove_temporary_artifact(&self) {
        if let Err(e) = self.artifact.remove_temporary().await {
            tracing::error!(
                "Failed to remove temporary artifact {}: {}",
                self.artifact.path().display(),
                e
            );
        }
    }

    /// Summary of the session so far.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            completed_downloads: self.completed_downloads(),
            reason: self
                .close_reason
                .get()
                .copied()
                .unwrap_or(CloseReason::Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::counter::DownloadLimit;

    fn state_with_limit(limit: i64, artifact: Artifact) -> ShareState {
        ShareState::new(
            artifact,
            DownloadCounter::configure(limit).unwrap(),
            ShutdownSignal::new(),
        )
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"data").unwrap();

        let state = state_with_limit(-1, Artifact::original(path, 4));
        assert_eq!(state.state(), SessionState::Idle);

        state.mark_draining();
        assert_eq!(state.state(), SessionState::Idle);

        state.mark_serving();
        assert_eq!(state.state(), SessionState::Serving);

        assert!(state.begin_draining(CloseReason::Stopped));
        assert!(!state.begin_draining(CloseReason::QuotaReached));
        assert_eq!(state.state(), SessionState::Draining);
        assert_eq!(state.summary().reason, CloseReason::Stopped);

        state.mark_closed();
        assert_eq!(state.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_exhausting_download_removes_temporary_artifact_first() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("shaloc-work");
        std::fs::create_dir_all(&work).unwrap();
        let path = work.join("f.txt.enc");
        std::fs::write(&path, b"data").unwrap();

        let artifact = Artifact::temporary(path.clone(), work.clone(), "f.txt").unwrap();
        let state = state_with_limit(2, artifact);
        state.mark_serving();

        assert_eq!(state.complete_download().await, DownloadOutcome::Remaining(1));
        assert!(path.exists());
        assert!(!state.shutdown.is_triggered());

        assert_eq!(state.complete_download().await, DownloadOutcome::Exhausted);
        assert!(!work.exists());
        assert!(state.shutdown.is_triggered());
        assert_eq!(state.state(), SessionState::Draining);

        let summary = state.summary();
        assert_eq!(summary.completed_downloads, 2);
        assert_eq!(summary.reason, CloseReason::QuotaReached);
    }

    #[tokio::test]
    async fn test_unbounded_downloads_never_drain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"data").unwrap();

        let state = ShareState::new(
            Artifact::original(path.clone(), 4),
            DownloadCounter::new(DownloadLimit::Unbounded),
            ShutdownSignal::new(),
        );
        state.mark_serving();

        for _ in 0..10 {
            assert_eq!(state.complete_download().await, DownloadOutcome::Unbounded);
        }
        assert_eq!(state.state(), SessionState::Serving);
        assert!(!state.shutdown.is_triggered());
        assert!(path.exists());
    }
}
