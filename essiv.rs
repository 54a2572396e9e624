//! ESSIV (Encrypted Salt-Sector IV) derivation.
//!
//! This module provides [`Essiv`], which derives the per-sector IV the same
//! way dm-crypt's `essiv:sha256` generator does: the 64-bit sector index,
//! little-endian in the low 8 bytes of an otherwise zero AES block, is
//! encrypted under AES-256 keyed with SHA-256 of the master key.
//!
//! The derivation is a pure function of (master key, sector index), so an
//! encryptor and a decryptor configured with the same key recompute identical
//! IVs without any IV ever being stored or transmitted.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes256, Block};
use sha2::{Digest, Sha256};

/// Per-sector IV generator keyed with the salt key SHA-256(master key).
pub struct Essiv {
    salt_cipher: Aes256,
}

impl Essiv {
    pub fn new(master_key: &[u8; 32]) -> Self {
        let salt_key = Sha256::digest(master_key);
        // SHA-256 output is exactly the AES-256 key size
        let salt_cipher = Aes256::new_from_slice(&salt_key)
            .expect("BUG: SHA-256 digest is always 32 bytes, this should never fail");
        Self { salt_cipher }
    }

    /// Derives the 16-byte IV for a sector index.
    ///
    /// Single-block CBC under an all-zero IV is the same operation as one raw
    /// block encryption, so the salt cipher is applied to the index block
    /// directly.
    pub fn derive(&self, sector: u64) -> [u8; 16] {
        let mut block = Block::default();
        block[..8].copy_from_slice(&sector.to_le_bytes());
        self.salt_cipher.encrypt_block(&mut block);

        let mut iv = [0u8; 16];
        iv.copy_from_slice(&block);
        iv
    }
}
