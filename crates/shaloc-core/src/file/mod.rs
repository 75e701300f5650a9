//! File operations for shaloc.
//!
//! This module handles:
//! - Validating the file handed to a share
//! - Zipping a folder into a single shareable archive
//! - Temporary artifacts (`shaloc*` entries in the system temp directory)
//!
//! Every temporary artifact shaloc creates starts with [`TEMP_PREFIX`], which
//! is what `shaloc clean` looks for.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prefix of every temporary file or directory shaloc creates.
pub const TEMP_PREFIX: &str = "shaloc";

/// Check that `path` is an existing regular file and return its size.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if nothing exists at `path` and
/// [`Error::NotAFile`] for directories and other non-regular entries.
pub fn check_regular_file(path: &Path) -> Result<u64> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(Error::NotAFile(path.display().to_string()));
    }

    Ok(metadata.len())
}

/// Whether `path` is a directory.
///
/// # Errors
///
/// Returns an error if the path cannot be inspected.
pub fn is_folder(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create a fresh private working directory under the system temp directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn create_work_dir() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("{TEMP_PREFIX}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Path of the archive [`compress_folder`] writes for `source`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if `source` has no final component.
pub fn archive_path_for(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::InvalidPath(source.display().to_string()))?;
    Ok(dest_dir.join(format!("{TEMP_PREFIX}-{}.zip", name.to_string_lossy())))
}

/// Zip the folder `source` into `<dest_dir>/shaloc-<folder name>.zip`.
///
/// Entries are stored under the folder's own name, so extracting the archive
/// recreates the folder. Files are deflated; directories become explicit
/// entries.
///
/// # Errors
///
/// Returns an error if `source` is not a directory or any entry cannot be
/// read or written.
pub async fn compress_folder(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !is_folder(source)? {
        return Err(Error::InvalidPath(format!(
            "{} is not a directory",
            source.display()
        )));
    }

    let output_path = archive_path_for(source, dest_dir)?;
    tracing::info!(
        "Zipping {} into {}...",
        source.display(),
        output_path.display()
    );

    let source = source.to_path_buf();
    let target = output_path.clone();
    tokio::task::spawn_blocking(move || write_zip(&source, &target))
        .await
        .map_err(|e| Error::Internal(format!("compression task failed: {e}")))??;

    Ok(output_path)
}

fn write_zip(source: &Path, output_path: &Path) -> Result<()> {
    let base_name = source
        .file_name()
        .ok_or_else(|| Error::InvalidPath(source.display().to_string()))?
        .to_string_lossy()
        .into_owned();

    let file = std::fs::File::create(output_path)?;
    let mut zip = zip::ZipWriter::new(file);

    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for entry in walkdir::WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| Error::InvalidPath(entry.path().display().to_string()))?;

        let mut name = base_name.clone();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options).map_err(zip_error)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options).map_err(zip_error)?;
            let mut f = std::fs::File::open(entry.path())?;
            std::io::copy(&mut f, &mut zip)?;
        }
    }

    zip.finish().map_err(zip_error)?.flush()?;
    Ok(())
}

fn zip_error(e: zip::result::ZipError) -> Error {
    match e {
        zip::result::ZipError::Io(io) => Error::Io(io),
        other => Error::Internal(format!("zip error: {other}")),
    }
}

/// Remove every `shaloc*` entry from `dir`.
///
/// Entries that cannot be removed are logged and skipped. Returns the paths
/// that were removed.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed.
pub fn clean_temp_artifacts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
            continue;
        }

        let path = entry.path();
        let result = if entry.file_type().is_ok_and(|t| t.is_dir()) {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };

        match result {
            Ok(()) => removed.push(path),
            Err(e) => tracing::error!("Failed to remove {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

/// Format a file size for display.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_check_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"12345").unwrap();

        assert_eq!(check_regular_file(&file).unwrap(), 5);
        assert!(matches!(
            check_regular_file(dir.path()),
            Err(Error::NotAFile(_))
        ));
        assert!(matches!(
            check_regular_file(&dir.path().join("missing")),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_is_folder() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(is_folder(dir.path()).unwrap());
        assert!(!is_folder(&file).unwrap());
        assert!(is_folder(&dir.path().join("missing")).is_err());
    }

    #[tokio::test]
    async fn test_compress_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("photos");
        std::fs::create_dir_all(folder.join("2024")).unwrap();
        std::fs::write(folder.join("a.txt"), b"first").unwrap();
        std::fs::write(folder.join("2024").join("b.txt"), b"second").unwrap();

        let out = TempDir::new().unwrap();
        let archive = compress_folder(&folder, out.path()).await.unwrap();
        assert_eq!(archive, out.path().join("shaloc-photos.zip"));

        let mut zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
        let mut content = String::new();
        zip.by_name("photos/2024/b.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "second");
        assert!(zip.by_name("photos/a.txt").is_ok());
    }

    #[tokio::test]
    async fn test_compress_folder_rejects_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(compress_folder(&file, dir.path()).await.is_err());
    }

    #[test]
    fn test_clean_temp_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shaloc-docs.zip"), b"zip").unwrap();
        std::fs::create_dir_all(dir.path().join("shaloc-1234")).unwrap();
        std::fs::write(dir.path().join("shaloc-1234").join("f.enc"), b"enc").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"keep").unwrap();

        let removed = clean_temp_artifacts(dir.path()).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(dir.path().join("keep.txt").exists());
        assert!(!dir.path().join("shaloc-docs.zip").exists());
        assert!(!dir.path().join("shaloc-1234").exists());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
