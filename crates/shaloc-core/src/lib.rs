//! # Shaloc Core Library
//!
//! `shaloc-core` shares a single local file over plain HTTP on the local
//! network, optionally encrypted with a passphrase and optionally limited to
//! a number of downloads.
//!
//! ## Features
//!
//! - **One route per share**: the file is served under its own name or a
//!   random string
//! - **Download quota**: the server shuts itself down after N complete
//!   downloads, counted atomically
//! - **Passphrase encryption**: AES-256-CBC container, decryptable with
//!   `shaloc decrypt`
//! - **Folders**: zipped into a temporary archive before sharing
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`crypto`] - Key derivation and the encrypted container format
//! - [`mod@file`] - File validation, folder archiving and temporary artifacts
//! - [`session`] - Serving session lifecycle, download quota, shutdown
//! - [`web`] - The HTTP route serving a share
//! - [`fetch`] - Downloading a share from a URL
//!
//! ## Example
//!
//! ```rust,ignore
//! use shaloc_core::session::{ServingSession, ShareOptions};
//!
//! let options = ShareOptions::new("notes.txt").with_limit_raw(2)?;
//! let running = ServingSession::prepare(options).await?.start().await?;
//! println!("{}", running.url());
//! let summary = running.wait().await?;
//! println!("{} download(s)", summary.completed_downloads);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod file;

#[cfg(feature = "web")]
pub mod session;

#[cfg(feature = "web")]
pub mod web;

#[cfg(feature = "fetch")]
pub mod fetch;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default IP address to listen on
pub const DEFAULT_IP: &str = "127.0.0.1";

/// Default port to listen on
pub const DEFAULT_PORT: &str = "8080";

/// Default upper bound on draining in-flight downloads at shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
