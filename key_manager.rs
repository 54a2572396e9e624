//! Master key loading and generation.
//!
//! This module provides [`KeyManager`] for loading and generating the 32-byte
//! binary key file that keys both the data cipher and, hashed, the ESSIV
//! generator.
//!
//! ## Security Features
//!
//! - Key bytes are zeroized on drop (via `Zeroize` trait)
//! - Generated key files get Unix permissions 0600 (owner read/write only)
//! - Cryptographically secure random generation via `OsRng`
//!
//! Generation never happens implicitly: a transform run with a missing key
//! file fails, and [`KeyManager::generate`] is only reached through an
//! explicit CLI flag.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::error::VolCryptError;
use crate::sector::SectorCipher;

/// Expected key file length: the AES-256 key size.
pub const KEY_SIZE: usize = 32;

/// Holds the master key for the lifetime of a run.
pub struct KeyManager {
    key_bytes: [u8; KEY_SIZE],
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("key_bytes", &"[redacted]")
            .finish()
    }
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        self.key_bytes.zeroize();
    }
}

impl KeyManager {
    /// Loads an existing key file, rejecting any length other than 32 bytes.
    pub async fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading encryption key");
        let mut data = fs::read(path)
            .await
            .with_context(|| format!("reading key from {}", path.display()))?;
        if data.len() != KEY_SIZE {
            warn!(path = %path.display(), found_bytes = data.len(), "invalid key size");
            data.zeroize();
            return Err(VolCryptError::key(format!(
                "expected 32-byte key at {} but found {} bytes",
                path.display(),
                data.len()
            ))
            .into());
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(&data);
        data.zeroize();
        Ok(Self { key_bytes: arr })
    }

    /// Generates a fresh random key file. Refuses to overwrite an existing
    /// file.
    pub async fn generate(path: &Path) -> Result<Self> {
        if fs::try_exists(path)
            .await
            .with_context(|| format!("checking existence of {}", path.display()))?
        {
            bail!(
                "key file '{}' already exists; remove it first or use a different path",
                path.display()
            );
        }

        info!(path = %path.display(), "generating new encryption key");
        let mut key = [0u8; KEY_SIZE];
        {
            use rand_core::{OsRng, RngCore};
            OsRng.fill_bytes(&mut key);
        }

        // Write with restrictive permissions using spawn_blocking for Unix
        #[cfg(unix)]
        {
            let path_buf = path.to_path_buf();
            let key_clone = key;
            tokio::task::spawn_blocking(move || {
                use std::fs::OpenOptions;
                use std::io::Write;
                use std::os::unix::fs::OpenOptionsExt;

                let mut f = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(&path_buf)?;
                f.write_all(&key_clone)?;
                Ok::<(), anyhow::Error>(())
            })
            .await??;
        }
        #[cfg(not(unix))]
        {
            fs::write(path, &key).await?;
        }

        Ok(Self { key_bytes: key })
    }

    /// Hands out a sector cipher keyed with the loaded master key.
    pub fn sector_cipher(&self) -> SectorCipher {
        SectorCipher::new(&self.key_bytes)
    }
}
