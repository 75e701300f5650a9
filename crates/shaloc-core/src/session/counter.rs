//! The shared download countdown.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{Error, Result};

/// How many downloads a share allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadLimit {
    /// Serve until stopped from outside
    Unbounded,
    /// Serve this many complete downloads, then shut down
    Bounded(NonZeroU64),
}

impl DownloadLimit {
    /// Interpret a raw limit: negative means unbounded, positive is a quota.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero, which would mean a share
    /// that can never be downloaded.
    pub fn from_raw(limit: i64) -> Result<Self> {
        if limit < 0 {
            return Ok(Self::Unbounded);
        }

        u64::try_from(limit)
            .ok()
            .and_then(NonZeroU64::new)
            .map(Self::Bounded)
            .ok_or_else(|| Error::InvalidConfig {
                key: "max_downloads".into(),
                reason: "must be positive, or negative for no limit".into(),
            })
    }

    /// Whether the limit is unbounded.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl std::fmt::Display for DownloadLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unlimited"),
            Self::Bounded(n) => write!(f, "{n}"),
        }
    }
}

/// Result of recording one completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The share has no quota
    Unbounded,
    /// Downloads still allowed after this one
    Remaining(u64),
    /// This download consumed the last slot
    Exhausted,
    /// The quota was already used up when this download finished
    AlreadyExhausted,
}

impl DownloadOutcome {
    /// Whether this call moved the counter from 1 to 0.
    #[must_use]
    pub const fn is_exhausting(self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// A countdown shared by every request handler.
///
/// Internally a single signed integer: negative is unbounded, zero is
/// exhausted, positive is the number of downloads left. Decrement-and-test is
/// one compare-and-swap, so exactly one caller ever sees
/// [`DownloadOutcome::Exhausted`].
#[derive(Debug)]
pub struct DownloadCounter {
    remaining: AtomicI64,
}

impl DownloadCounter {
    /// Create a counter for `limit`.
    #[must_use]
    pub fn new(limit: DownloadLimit) -> Self {
        let remaining = match limit {
            DownloadLimit::Unbounded => -1,
            DownloadLimit::Bounded(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
        };
        Self {
            remaining: AtomicI64::new(remaining),
        }
    }

    /// Create a counter from a raw limit, rejecting zero.
    ///
    /// # Errors
    ///
    /// See [`DownloadLimit::from_raw`].
    pub fn configure(limit: i64) -> Result<Self> {
        DownloadLimit::from_raw(limit).map(Self::new)
    }

    /// Record one completed download.
    pub fn record_download(&self) -> DownloadOutcome {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current > 0).then(|| current - 1)
            });

        match previous {
            Ok(1) => DownloadOutcome::Exhausted,
            Ok(n) => DownloadOutcome::Remaining(n.unsigned_abs() - 1),
            Err(n) if n < 0 => DownloadOutcome::Unbounded,
            Err(_) => DownloadOutcome::AlreadyExhausted,
        }
    }

    /// Whether the quota is used up. Always false when unbounded.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    /// Downloads left, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        u64::try_from(self.remaining.load(Ordering::Acquire)).ok()
    }
}
