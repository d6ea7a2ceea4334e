//! Content-addressed, encrypted on-disk cache for resolved secrets
//!
//! Each entry is stored at `{dir}/kv-cache-{hex(iv)}` where the AES key is
//! `SHA-256(vault_base_url || secret_name || secret_version)` and the IV is
//! the first 16 bytes of `SHA-256(key)`. The filename is therefore a pure
//! function of the reference, so no index is kept. File contents are raw
//! AES-256-CBC ciphertext (PKCS#7 padding) of the UTF-8 secret value.
//!
//! Entries are never expired or invalidated. A file that cannot be read or
//! decrypted is treated as a miss.

use crate::{Error, Result, SecretReference};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use secrecy::{ExposeSecret, SecretBox};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Filename prefix for cache entries
pub const CACHE_FILE_PREFIX: &str = "kv-cache-";

/// Key and IV derived from a secret reference
///
/// The key bytes are zeroed on drop.
pub struct CacheKey {
    key: SecretBox<[u8; 32]>,
    iv: [u8; 16],
}

impl CacheKey {
    /// Derive the key material for a reference.
    ///
    /// A missing version contributes an empty string.
    #[must_use]
    pub fn derive(reference: &SecretReference) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(reference.vault_base_url.as_bytes());
        hasher.update(reference.secret_name.as_bytes());
        hasher.update(reference.secret_version.as_deref().unwrap_or("").as_bytes());
        let digest = hasher.finalize();
        let key = SecretBox::<[u8; 32]>::init_with_mut(|key: &mut [u8; 32]| {
            key.copy_from_slice(digest.as_slice());
        });

        let mut iv = [0u8; 16];
        iv.copy_from_slice(&Sha256::digest(key.expose_secret()).as_slice()[..16]);

        Self { key, iv }
    }

    /// Hex-encoded IV, used as the entry's file name suffix
    #[must_use]
    pub fn iv_hex(&self) -> String {
        hex::encode(self.iv)
    }

    /// Entry file name, `kv-cache-{hex(iv)}`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{CACHE_FILE_PREFIX}{}", self.iv_hex())
    }

    /// Encrypt a plaintext value
    #[must_use]
    pub fn encrypt(&self, plaintext: &str) -> Vec<u8> {
        Aes256CbcEnc::new(&(*self.key.expose_secret()).into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes())
    }

    /// Decrypt a ciphertext. Returns `None` on bad padding or non-UTF-8 output.
    #[must_use]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Option<String> {
        let plaintext = Aes256CbcDec::new(&(*self.key.expose_secret()).into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .ok()?;
        String::from_utf8(plaintext).ok()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.iv == other.iv && self.key.expose_secret() == other.key.expose_secret()
    }
}

impl Eq for CacheKey {}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("iv", &self.iv_hex())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Encrypted secret cache rooted at a directory
#[derive(Debug, Clone)]
pub struct SecretCache {
    dir: PathBuf,
}

impl SecretCache {
    /// Create a cache rooted at `dir`. The directory is not created.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of this cache
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `reference`, whether or not it exists
    #[must_use]
    pub fn entry_path(&self, reference: &SecretReference) -> PathBuf {
        self.path_for(&CacheKey::derive(reference))
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read and decrypt the entry for `reference`.
    ///
    /// Every failure is a miss: absent file, I/O error, or undecryptable data.
    pub async fn read(&self, reference: &SecretReference) -> Option<String> {
        let key = CacheKey::derive(reference);
        let path = self.path_for(&key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(
                    secret = %reference.secret_name,
                    path = %path.display(),
                    error = %e,
                    "Secret cache miss"
                );
                return None;
            }
        };

        let value = key.decrypt(&bytes);
        if value.is_none() {
            tracing::debug!(
                secret = %reference.secret_name,
                path = %path.display(),
                "Ignoring undecryptable secret cache entry"
            );
        }
        value
    }

    /// Encrypt `value` and write it as the entry for `reference`, owner
    /// read/write only. Existing entries are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub async fn write(&self, reference: &SecretReference, value: &str) -> Result<()> {
        let key = CacheKey::derive(reference);
        let path = self.path_for(&key);
        let contents = key.encrypt(value);

        write_private(&path, &contents)
            .await
            .map_err(|e| Error::io(e, &path, "write"))?;

        tracing::debug!(
            secret = %reference.secret_name,
            path = %path.display(),
            "Cached secret"
        );
        Ok(())
    }
}

#[cfg(unix)]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[cfg(not(unix))]
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, contents).await
}
