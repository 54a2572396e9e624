//! Per-sector AES-256-CBC encryption and decryption.
//!
//! [`SectorCipher`] is the seam between the stream engine and the concrete
//! cryptographic primitives: it owns the data-cipher key and the ESSIV
//! generator, and transforms exact [`SECTOR_SIZE`] buffers in place. Sectors
//! are cryptographically independent of each other; CBC chaining restarts
//! from the derived IV at every sector boundary.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use zeroize::Zeroize;

use crate::essiv::Essiv;

/// Sector size in bytes; the unit of I/O and of the cryptographic transform.
/// 512 bytes = 32 chained AES blocks per sector.
pub const SECTOR_SIZE: usize = 512;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

pub struct SectorCipher {
    key: [u8; 32],
    essiv: Essiv,
}

impl Drop for SectorCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl SectorCipher {
    pub fn new(master_key: &[u8; 32]) -> Self {
        Self {
            key: *master_key,
            essiv: Essiv::new(master_key),
        }
    }

    /// Encrypts one sector in place under IV = ESSIV(key, index).
    pub fn encrypt_sector(&self, index: u64, sector: &mut [u8; SECTOR_SIZE]) {
        let iv = self.essiv.derive(index);
        Aes256CbcEnc::new((&self.key).into(), (&iv).into())
            .encrypt_padded_mut::<NoPadding>(sector, SECTOR_SIZE)
            .expect("BUG: sector size is a multiple of the AES block size, this should never fail");
    }

    /// Decrypts one sector in place under IV = ESSIV(key, index).
    pub fn decrypt_sector(&self, index: u64, sector: &mut [u8; SECTOR_SIZE]) {
        let iv = self.essiv.derive(index);
        Aes256CbcDec::new((&self.key).into(), (&iv).into())
            .decrypt_padded_mut::<NoPadding>(sector)
            .expect("BUG: sector size is a multiple of the AES block size, this should never fail");
    }
}
