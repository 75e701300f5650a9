//! The encrypted container format.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | original size (u64, little-endian) |
//! | 8 | 16 | IV |
//! | 24 | n * 16 | AES-256-CBC ciphertext |
//!
//! The plaintext is padded with random bytes up to the next block boundary;
//! the size field tells the decoder where the real data ends.

use std::path::{Path, PathBuf};

use aes::Aes256;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use super::{derive_key, fill_random, random_bytes, Passphrase, BLOCK_SIZE};
use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Length of the little-endian size field.
pub const SIZE_FIELD_LEN: usize = 8;

/// Length of the fixed header (size field + IV).
pub const HEADER_LEN: usize = SIZE_FIELD_LEN + BLOCK_SIZE;

/// Extension appended to encrypted artifacts.
const ENCRYPTED_EXTENSION: &str = "enc";

/// Extension appended to decrypted files.
const DECRYPTED_EXTENSION: &str = "dec";

/// The fixed-size part of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Plaintext length before padding
    pub original_size: u64,
    /// CBC initialization vector
    pub iv: [u8; BLOCK_SIZE],
}

/// Parse and validate the header of a container.
///
/// # Errors
///
/// Returns [`Error::Format`] if the container is shorter than the header or
/// the ciphertext is not block aligned.
pub fn read_header(container: &[u8]) -> Result<ContainerHeader> {
    if container.len() < HEADER_LEN {
        return Err(Error::Format(format!(
            "container is {} bytes, need at least {HEADER_LEN}",
            container.len()
        )));
    }

    let mut size = [0u8; SIZE_FIELD_LEN];
    size.copy_from_slice(&container[..SIZE_FIELD_LEN]);
    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&container[SIZE_FIELD_LEN..HEADER_LEN]);

    let ciphertext_len = container.len() - HEADER_LEN;
    if ciphertext_len % BLOCK_SIZE != 0 {
        return Err(Error::Format(format!(
            "ciphertext length {ciphertext_len} is not a multiple of {BLOCK_SIZE}"
        )));
    }

    Ok(ContainerHeader {
        original_size: u64::from_le_bytes(size),
        iv,
    })
}

/// Encrypt `plaintext` into a container.
///
/// # Errors
///
/// Returns [`Error::Crypto`] if the cipher cannot be constructed.
pub fn encode(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let key = derive_key(passphrase);
    let iv: [u8; BLOCK_SIZE] = random_bytes();

    let padded_len = plaintext.len().next_multiple_of(BLOCK_SIZE);
    let mut out = Vec::with_capacity(HEADER_LEN + padded_len);
    out.extend_from_slice(&(plaintext.len() as u64).to_le_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(plaintext);
    out.resize(HEADER_LEN + padded_len, 0);
    fill_random(&mut out[HEADER_LEN + plaintext.len()..]);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| Error::Crypto(format!("failed to initialize AES-256-CBC: {e}")))?;
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut out[HEADER_LEN..], padded_len)
        .map_err(|_| Error::Crypto("padded plaintext is not block aligned".into()))?;

    Ok(out)
}

/// Decrypt a container produced by [`encode`].
///
/// A wrong passphrase is not detected: the result has the original length
/// but meaningless content.
///
/// # Errors
///
/// Returns [`Error::Format`] for malformed containers and [`Error::Crypto`]
/// if the cipher cannot be constructed.
pub fn decode(container: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let header = read_header(container)?;
    let key = derive_key(passphrase);

    let mut plaintext = container[HEADER_LEN..].to_vec();
    let original_size = usize::try_from(header.original_size)
        .ok()
        .filter(|size| *size <= plaintext.len())
        .ok_or_else(|| {
            Error::Format(format!(
                "size field {} exceeds ciphertext length {}",
                header.original_size,
                plaintext.len()
            ))
        })?;

    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &header.iv)
        .map_err(|e| Error::Crypto(format!("failed to initialize AES-256-CBC: {e}")))?;
    cipher
        .decrypt_padded_mut::<NoPadding>(&mut plaintext)
        .map_err(|_| Error::Format("ciphertext is not block aligned".into()))?;

    plaintext.truncate(original_size);
    Ok(plaintext)
}

/// Encrypt `source` into `<dest_dir>/<file name>.enc`.
///
/// Returns the path of the written container.
pub async fn encrypt_file(
    source: &Path,
    passphrase: &Passphrase,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let name = source
        .file_name()
        .ok_or_else(|| Error::InvalidPath(source.display().to_string()))?;
    let mut out_name = name.to_os_string();
    out_name.push(".");
    out_name.push(ENCRYPTED_EXTENSION);
    let out_path = dest_dir.join(out_name);

    let plaintext = tokio::fs::read(source).await?;
    let passphrase = passphrase.clone();
    let container = tokio::task::spawn_blocking(move || encode(&plaintext, passphrase.expose()))
        .await
        .map_err(|e| Error::Internal(format!("encryption task failed: {e}")))??;

    tokio::fs::write(&out_path, &container).await?;
    tracing::debug!(
        "Encrypted {} into {} ({} bytes)",
        source.display(),
        out_path.display(),
        container.len()
    );

    Ok(out_path)
}

/// Decrypt the container at `path` into `<path>.dec`.
///
/// Returns the path of the written plaintext.
pub async fn decrypt_file(path: &Path, passphrase: &Passphrase) -> Result<PathBuf> {
    let mut out_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?
        .to_os_string();
    out_name.push(".");
    out_name.push(DECRYPTED_EXTENSION);
    let out_path = path.with_file_name(out_name);

    let container = tokio::fs::read(path).await?;
    let passphrase = passphrase.clone();
    let plaintext = tokio::task::spawn_blocking(move || decode(&container, passphrase.expose()))
        .await
        .map_err(|e| Error::Internal(format!("decryption task failed: {e}")))??;

    tokio::fs::write(&out_path, &plaintext).await?;
    Ok(out_path)
}
