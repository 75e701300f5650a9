//! Route naming for a share.

use std::path::Path;

use rand::Rng;

use crate::error::{Error, Result};

/// Characters used for random routes.
pub const ROUTE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// How the URL path of a share is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteName {
    /// Use the shared file's name
    #[default]
    FromFileName,
    /// Use a random string of this many letters
    Random(usize),
}

impl RouteName {
    /// Build from the `--random` flag: 0 keeps the file name.
    #[must_use]
    pub const fn from_length(length: usize) -> Self {
        if length == 0 {
            Self::FromFileName
        } else {
            Self::Random(length)
        }
    }

    /// Resolve the route segment for `file`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if a file-name route is requested for a
    /// path without a file name.
    pub fn resolve(self, file: &Path) -> Result<String> {
        match self {
            Self::Random(length) => Ok(random_id(length)),
            Self::FromFileName => file
                .file_name()
                .map(|name| sanitize_segment(&name.to_string_lossy()))
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| Error::InvalidPath(file.display().to_string())),
        }
    }
}

/// Generate a random route of `length` ASCII letters.
#[must_use]
pub fn random_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ROUTE_CHARSET[rng.gen_range(0..ROUTE_CHARSET.len())] as char)
        .collect()
}

/// Make a file name usable as a literal URL path segment.
///
/// ASCII alphanumerics and `-._~` are kept; anything else becomes `_`.
#[must_use]
pub fn sanitize_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
