//! UI utilities for the shaloc CLI.

use shaloc_core::session::{CloseReason, SessionSummary};

const BOX_MIN_WIDTH: usize = 33;

/// A formatted box for displaying where a share is served.
pub struct UrlBox<'a> {
    url: &'a str,
    downloads: Option<String>,
    encrypted: bool,
}

impl<'a> UrlBox<'a> {
    /// Create a new box for `url`.
    #[must_use]
    pub const fn new(url: &'a str) -> Self {
        Self {
            url,
            downloads: None,
            encrypted: false,
        }
    }

    /// Show the download quota.
    #[must_use]
    pub fn with_downloads(mut self, remaining: Option<u64>) -> Self {
        self.downloads = Some(remaining.map_or_else(
            || "Unlimited downloads".to_string(),
            |n| format!("{} download(s) allowed", n),
        ));
        self
    }

    /// Mark the share as encrypted.
    #[must_use]
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Display the box to stdout.
    pub fn display(&self) {
        let mut lines = vec![self.url.to_string()];
        if let Some(downloads) = &self.downloads {
            lines.push(downloads.clone());
        }
        if self.encrypted {
            lines.push("Encrypted (AES-256)".to_string());
        }

        let width = lines
            .iter()
            .map(|l| l.chars().count() + 4)
            .max()
            .unwrap_or(0)
            .max(BOX_MIN_WIDTH);

        println!("  ┌{}┐", "─".repeat(width));
        println!("  │{}│", " ".repeat(width));
        for line in &lines {
            println!("  │{}│", center_in_box(line, width));
        }
        println!("  │{}│", " ".repeat(width));
        println!("  └{}┘", "─".repeat(width));
    }
}

fn center_in_box(content: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(content_len);
    let left = padding / 2;
    let right = padding - left;
    format!("{}{}{}", " ".repeat(left), content, " ".repeat(right))
}

/// One line describing how a share ended.
pub fn describe_summary(summary: &SessionSummary) -> String {
    match summary.reason {
        CloseReason::QuotaReached => format!(
            "Download limit reached after {} download(s).",
            summary.completed_downloads
        ),
        CloseReason::Stopped => format!(
            "Stopped after {} download(s).",
            summary.completed_downloads
        ),
    }
}
