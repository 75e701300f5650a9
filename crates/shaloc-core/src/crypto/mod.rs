//! Cryptographic primitives for shaloc.
//!
//! This module provides:
//! - SHA-256 passphrase-to-key derivation
//! - The AES-256-CBC container format used for `--aes` shares
//!
//! ## Security Model
//!
//! A container is encrypted but **not authenticated**. Decoding with the wrong
//! passphrase, or decoding a tampered container, succeeds and yields garbage
//! of the original length. Existing artifacts depend on this layout, so no
//! MAC is added.

mod container;

pub use container::{
    decode, decrypt_file, encode, encrypt_file, read_header, ContainerHeader, HEADER_LEN,
    SIZE_FIELD_LEN,
};

use std::fmt;

use zeroize::Zeroizing;

/// AES block size in bytes. Also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// Length of a derived key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A passphrase typed by the operator.
///
/// The contents are wiped on drop and never appear in `Debug` output, so a
/// passphrase can travel inside configuration structs that get logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    /// Wrap a passphrase.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the passphrase is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Passphrase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A symmetric key derived from a passphrase. Zeroized on drop.
pub struct Key(Zeroizing<[u8; KEY_LEN]>);

impl Key {
    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(***)")
    }
}

/// Derive the container key for a passphrase.
///
/// The key is the SHA-256 digest of the UTF-8 passphrase bytes, with no salt
/// and no stretching, to stay compatible with existing containers.
#[must_use]
pub fn derive_key(passphrase: &str) -> Key {
    Key(Zeroizing::new(sha256(passphrase.as_bytes())))
}

/// Compute SHA-256 hash of data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Fill a buffer with cryptographically secure random bytes.
pub fn fill_random(buf: &mut [u8]) {
    use rand::RngCore;

    rand::thread_rng().fill_bytes(buf);
}

/// Generate cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    fill_random(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let hash = sha256(b"hello");
        assert_eq!(hash.len(), 32);

        let hash2 = sha256(b"hello");
        assert_eq!(hash, hash2);

        let hash3 = sha256(b"world");
        assert_ne!(hash, hash3);
    }

    #[test]
    fn test_derive_key_matches_sha256_of_passphrase() {
        // sha256("secret")
        let expected: [u8; 32] = [
            0x2b, 0xb8, 0x0d, 0x53, 0x7b, 0x1d, 0xa3, 0xe3, 0x8b, 0xd3, 0x03, 0x61, 0xaa, 0x85,
            0x56, 0x86, 0xbd, 0xe0, 0xea, 0xcd, 0x71, 0x62, 0xfe, 0xf6, 0xa2, 0x5f, 0xe9, 0x7b,
            0xf5, 0x27, 0xa2, 0x5b,
        ];
        assert_eq!(derive_key("secret").as_bytes(), &expected);
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key("a").as_bytes(), derive_key("a").as_bytes());
        assert_ne!(derive_key("a").as_bytes(), derive_key("b").as_bytes());
        assert_eq!(derive_key("").as_bytes().len(), KEY_LEN);
    }

    #[test]
    fn test_passphrase_debug_is_redacted() {
        let pass = Passphrase::new("hunter2");
        let debug = format!("{pass:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(pass.expose(), "hunter2");
        assert!(!pass.is_empty());
        assert!(Passphrase::from("").is_empty());
    }

    #[test]
    fn test_random_bytes() {
        let a: [u8; 16] = random_bytes();
        let b: [u8; 16] = random_bytes();
        assert_ne!(a, b);
    }
}
