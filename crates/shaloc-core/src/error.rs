//! Error types for shaloc.
//!
//! This module provides a unified error type for all shaloc operations,
//! with specific error variants for different failure modes.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for shaloc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for shaloc.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed encrypted container
    #[error("malformed container: {0}")]
    Format(String),

    /// Cipher construction failed
    #[error("cipher error: {0}")]
    Crypto(String),

    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Path exists but is not a regular file
    #[error("not a regular file: {0}")]
    NotAFile(String),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Unable to bind the HTTP listener
    #[error("unable to listen on {addr}: {source}")]
    Bind {
        /// The address that was requested
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Downloading from a URL failed
    #[error("download failed: {0}")]
    Download(String),

    /// The two typed passphrases differ
    #[error("passphrases do not match")]
    PassphraseMismatch,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Internal error (should not happen)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns whether this error happened before anything was served and
    /// should abort the command.
    #[must_use]
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::NotAFile(_)
                | Self::InvalidPath(_)
                | Self::Bind { .. }
                | Self::InvalidConfig { .. }
                | Self::Crypto(_)
        )
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Bind { .. } => Some(
                "Another process may already use this port. Try:\n\
                   shaloc share -f <file> -p <other port>",
            ),
            Self::NotAFile(_) => Some("To share a directory, use -F <folder> instead of -f."),
            Self::InvalidConfig { key, .. } if key == "max_downloads" => {
                Some("Use a positive number of downloads, or -1 for no limit.")
            }
            Self::Format(_) => Some(
                "The file does not look like a shaloc container. \
                 Was it downloaded without --aes?",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Format("container too short".into());
        assert_eq!(err.to_string(), "malformed container: container too short");

        let err = Error::InvalidConfig {
            key: "max_downloads".into(),
            reason: "must not be zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration value for 'max_downloads': must not be zero"
        );
    }

    #[test]
    fn test_bind_error_keeps_source() {
        let err = Error::Bind {
            addr: "127.0.0.1:80".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_setup_error());
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_io_error_is_not_setup_error() {
        let err: Error = io::Error::from(io::ErrorKind::BrokenPipe).into();
        assert!(!err.is_setup_error());
        assert!(err.suggestion().is_none());
    }
}
