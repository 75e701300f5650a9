//! The serving session: one file, one route, an optional download quota.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Serving ──quota reached / stop()──▶ Draining ──▶ Closed
//! ```
//!
//! - **Idle**: the source is validated, the artifact prepared (encrypted into
//!   a temporary copy when a passphrase is set) and the route chosen.
//! - **Serving**: the listener is bound and the route registered.
//! - **Draining**: entered once, either by the request that used up the quota
//!   or by an external stop. No new connections are accepted; responses in
//!   flight finish streaming.
//! - **Closed**: graceful shutdown finished (or the shutdown deadline passed),
//!   temporary artifacts are gone.
//!
//! ## Example
//!
//! ```rust,ignore
//! use shaloc_core::session::{ServingSession, ShareOptions};
//!
//! let options = ShareOptions::new("report.pdf").with_limit_raw(1)?;
//! let running = ServingSession::prepare(options).await?.start().await?;
//! println!("Sharing on {}", running.url());
//! let summary = running.wait().await?;
//! ```

pub mod counter;
pub mod route;
pub mod shutdown;

pub use counter::{DownloadCounter, DownloadLimit, DownloadOutcome};
pub use route::RouteName;
pub use shutdown::ShutdownSignal;

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::crypto::Passphrase;
use crate::error::{Error, Result};
use crate::web::{self, ShareState, SharedState};

/// Lifecycle state of a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Prepared, not listening yet
    Idle,
    /// Listening and serving the route
    Serving,
    /// No longer accepting connections, in-flight responses finishing
    Draining,
    /// Shut down
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The download quota was used up
    QuotaReached,
    /// Stopped from outside (Ctrl+C, [`RunningSession::stop`])
    Stopped,
}

/// What happened during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Responses that streamed the whole artifact
    pub completed_downloads: u64,
    /// Why the session ended
    pub reason: CloseReason,
}

/// Options for one share. Built by the caller and moved into the session.
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// File to share
    pub source: PathBuf,
    /// Encrypt the file with this passphrase before serving
    pub passphrase: Option<Passphrase>,
    /// Download quota
    pub limit: DownloadLimit,
    /// IP address to bind to
    pub ip: String,
    /// Port to bind to
    pub port: String,
    /// How the route is named
    pub route: RouteName,
    /// Upper bound on draining in-flight downloads during shutdown
    pub shutdown_timeout: Duration,
}

impl ShareOptions {
    /// Options sharing `source` unencrypted and without a quota on the
    /// default address.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            passphrase: None,
            limit: DownloadLimit::Unbounded,
            ip: crate::DEFAULT_IP.to_string(),
            port: crate::DEFAULT_PORT.to_string(),
            route: RouteName::FromFileName,
            shutdown_timeout: Duration::from_secs(crate::DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Encrypt the served file.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: Passphrase) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    /// Set the download quota.
    #[must_use]
    pub fn with_limit(mut self, limit: DownloadLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Set the download quota from a raw number (negative = unbounded).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero.
    pub fn with_limit_raw(self, limit: i64) -> Result<Self> {
        Ok(self.with_limit(DownloadLimit::from_raw(limit)?))
    }

    /// Set the address to listen on.
    #[must_use]
    pub fn with_bind(mut self, ip: impl Into<String>, port: impl Into<String>) -> Self {
        self.ip = ip.into();
        self.port = port.into();
        self
    }

    /// Set the route naming.
    #[must_use]
    pub fn with_route(mut self, route: RouteName) -> Self {
        self.route = route;
        self
    }

    /// Set the shutdown deadline.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The `host:port` string handed to the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

/// The file behind the share route.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    display_name: String,
    size: u64,
    work_dir: Option<PathBuf>,
}

impl Artifact {
    /// The user's own file, served as-is and never deleted.
    #[must_use]
    pub fn original(path: PathBuf, size: u64) -> Self {
        let display_name = header_file_name(&path);
        Self {
            path,
            display_name,
            size,
            work_dir: None,
        }
    }

    /// A derived copy living in its own `work_dir`, removed with it when the
    /// share no longer needs it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be inspected.
    pub fn temporary(path: PathBuf, work_dir: PathBuf, display_name: &str) -> Result<Self> {
        let size = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            display_name: sanitize_header_value(display_name),
            size,
            work_dir: Some(work_dir),
        })
    }

    /// Path of the served file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name announced in `Content-Disposition`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Size in bytes when the share was prepared.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether the file is a temporary copy.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.work_dir.is_some()
    }

    /// Delete a temporary artifact and its work directory. A no-op for the
    /// user's own file, and for an artifact that is already gone.
    pub async fn remove_temporary(&self) -> std::io::Result<()> {
        let Some(work_dir) = &self.work_dir else {
            return Ok(());
        };

        match tokio::fs::remove_dir_all(work_dir).await {
            Ok(()) => {
                tracing::debug!("Removed temporary artifact {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn header_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| sanitize_header_value(&name.to_string_lossy()))
        .unwrap_or_default()
}

/// Keep a file name safe inside a quoted `Content-Disposition` value.
fn sanitize_header_value(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A prepared share that is not listening yet.
#[derive(Debug)]
pub struct ServingSession {
    options: ShareOptions,
    artifact: Artifact,
    uri: String,
}

impl ServingSession {
    /// Validate the source, encrypt it if requested, and choose the route.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is missing or not a regular file, or
    /// if encryption fails.
    pub async fn prepare(options: ShareOptions) -> Result<Self> {
        let size = crate::file::check_regular_file(&options.source)?;
        let uri = options.route.resolve(&options.source)?;

        let artifact = match &options.passphrase {
            None => Artifact::original(options.source.clone(), size),
            Some(passphrase) => {
                let work_dir = crate::file::create_work_dir()?;
                let encrypted =
                    crate::crypto::encrypt_file(&options.source, passphrase, &work_dir).await;
                match encrypted.and_then(|path| {
                    Artifact::temporary(path, work_dir.clone(), &header_file_name(&options.source))
                }) {
                    Ok(artifact) => artifact,
                    Err(e) => {
                        let _ = tokio::fs::remove_dir_all(&work_dir).await;
                        return Err(e);
                    }
                }
            }
        };

        tracing::debug!(
            "Prepared {} as {} ({} bytes)",
            options.source.display(),
            artifact.path().display(),
            artifact.size()
        );

        Ok(Self {
            options,
            artifact,
            uri,
        })
    }

    /// Route segment the file will be served under.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The prepared artifact.
    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// The options this session was built from.
    #[must_use]
    pub const fn options(&self) -> &ShareOptions {
        &self.options
    }

    /// A prepared session is always idle.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        SessionState::Idle
    }

    /// Bind the listener, register the route and start serving.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address cannot be bound. A temporary
    /// artifact is removed in that case.
    pub async fn start(self) -> Result<RunningSession> {
        let Self {
            options,
            artifact,
            uri,
        } = self;

        let addr = options.bind_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(source) => {
                if let Err(e) = artifact.remove_temporary().await {
                    tracing::warn!("Failed to remove temporary artifact: {}", e);
                }
                return Err(Error::Bind { addr, source });
            }
        };
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(ShareState::new(
            artifact,
            DownloadCounter::new(options.limit),
            ShutdownSignal::new(),
        ));

        let app = web::router(&uri, Arc::clone(&shared));
        let shutdown = shared.shutdown.wait_owned();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
        });

        shared.mark_serving();
        tracing::info!(
            "Serving {} on http://{}/{} (downloads: {})",
            options.source.display(),
            local_addr,
            uri,
            options.limit
        );

        Ok(RunningSession {
            local_addr,
            uri,
            shared,
            server,
            shutdown_timeout: options.shutdown_timeout,
        })
    }
}

/// A share that is listening.
#[derive(Debug)]
pub struct RunningSession {
    local_addr: SocketAddr,
    uri: String,
    shared: SharedState,
    server: JoinHandle<std::io::Result<()>>,
    shutdown_timeout: Duration,
}

impl RunningSession {
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Route segment of the share.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Full URL of the share.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/{}", self.local_addr, self.uri)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Subscribe to lifecycle changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.subscribe()
    }

    /// Downloads left, or `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        self.shared.counter.remaining()
    }

    /// A handle that stops the session when triggered, e.g. from a signal
    /// handler.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shared.shutdown.clone()
    }

    /// Stop accepting connections. Returns `false` if the session was already
    /// draining.
    pub fn stop(&self) -> bool {
        self.shared.begin_draining(CloseReason::Stopped)
    }

    /// Wait for the session to close and clean up after it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task failed.
    pub async fn wait(self) -> Result<SessionSummary> {
        let Self {
            shared,
            mut server,
            shutdown_timeout,
            ..
        } = self;

        let joined = tokio::select! {
            () = shared.shutdown.wait() => {
                shared.begin_draining(CloseReason::Stopped);
                shared.mark_draining();
                let drained = tokio::time::timeout(shutdown_timeout, &mut server).await;
                match drained {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        tracing::warn!(
                            "Downloads still running after {}s, forcing shutdown",
                            shutdown_timeout.as_secs()
                        );
                        server.abort();
                        None
                    }
                }
            }
            joined = &mut server => {
                shared.begin_draining(CloseReason::Stopped);
                Some(joined)
            }
        };

        shared.remove_temporary_artifact().await;
        shared.mark_closed();

        let summary = shared.summary();
        tracing::info!(
            "Share closed after {} download(s)",
            summary.completed_downloads
        );

        match joined {
            Some(Ok(Err(e))) => Err(Error::Io(e)),
            Some(Err(e)) if !e.is_cancelled() => {
                Err(Error::Internal(format!("server task failed: {e}")))
            }
            _ => Ok(summary),
        }
    }
}
