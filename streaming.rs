//! Streaming sector transform for volume images.
//!
//! This module provides [`SectorStreamer`] for encrypting or decrypting a
//! raw image sector by sector without loading it into memory.
//!
//! ## Stream Layout
//!
//! ```text
//! [sector 0: 512 bytes][sector 1: 512 bytes]...
//! ```
//!
//! The output carries no header or framing of its own: it is exactly as long
//! as the input, and sector *i* of the output is the CBC transform of sector
//! *i* of the input under IV = ESSIV(key, *i*).
//!
//! ## Termination
//!
//! The transform loop has three terminal outcomes: clean EOF at a sector
//! boundary (success), a truncated final sector (reported with the trailing
//! byte count, nothing written for it), or an I/O failure (reported with the
//! failing operation). Sectors written before an error are left in place.

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::VolCryptError;
use crate::sector::{SectorCipher, SECTOR_SIZE};

/// SectorStreamer drives the sequential per-sector transform between two
/// byte streams.
pub struct SectorStreamer {
    cipher: SectorCipher,
}

impl SectorStreamer {
    pub fn new(cipher: SectorCipher) -> Self {
        Self { cipher }
    }

    /// Encrypts a plaintext image from reader to writer.
    /// Returns the number of bytes processed.
    pub async fn encrypt_stream<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.crypt(reader, writer, false).await
    }

    /// Decrypts an encrypted image from reader to writer.
    /// Returns the number of bytes processed.
    pub async fn decrypt_stream<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.crypt(reader, writer, true).await
    }

    async fn crypt<R, W>(&self, reader: &mut R, writer: &mut W, decrypt: bool) -> Result<u64>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = [0u8; SECTOR_SIZE];
        let mut total_bytes = 0u64;

        for sector in 0u64.. {
            let n = read_sector(reader, &mut buffer)
                .await
                .context("read input")?;
            if n == 0 {
                break; // EOF at a sector boundary
            }
            if n < SECTOR_SIZE {
                return Err(VolCryptError::TruncatedInput { trailing: n }.into());
            }

            if decrypt {
                self.cipher.decrypt_sector(sector, &mut buffer);
            } else {
                self.cipher.encrypt_sector(sector, &mut buffer);
            }

            writer.write_all(&buffer).await.context("write output")?;
            total_bytes += SECTOR_SIZE as u64;
        }

        writer.flush().await.context("write output")?;
        Ok(total_bytes)
    }
}

/// Fills `buffer` from `reader`, retrying short reads. Returns the number of
/// bytes read: the full buffer length, or less only when EOF was reached.
async fn read_sector<R>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_streamer() -> SectorStreamer {
        SectorStreamer::new(SectorCipher::new(&[0x42u8; 32]))
    }

    fn patterned_image(sectors: usize) -> Vec<u8> {
        (0..sectors * SECTOR_SIZE)
            .map(|i| (i % 251) as u8)
            .collect()
    }

    #[tokio::test]
    async fn round_trip_small() {
        let streamer = make_streamer();

        let plaintext = patterned_image(2);
        let mut reader = Cursor::new(plaintext.clone());
        let mut encrypted = Vec::new();
        let bytes = streamer
            .encrypt_stream(&mut reader, &mut encrypted)
            .await
            .expect("encryption failed");

        assert_eq!(bytes, plaintext.len() as u64);
        assert_eq!(encrypted.len(), plaintext.len());
        assert_ne!(encrypted, plaintext);

        let mut decrypt_reader = Cursor::new(encrypted);
        let mut decrypted = Vec::new();
        streamer
            .decrypt_stream(&mut decrypt_reader, &mut decrypted)
            .await
            .expect("decryption failed");

        assert_eq!(decrypted, plaintext);
    }

    #[tokio::test]
    async fn round_trip_large() {
        let streamer = make_streamer();

        let plaintext = patterned_image(64);
        let mut reader = Cursor::new(plaintext.clone());
        let mut encrypted = Vec::new();
        streamer
            .encrypt_stream(&mut reader, &mut encrypted)
            .await
            .expect("encryption failed");

        let mut decrypt_reader = Cursor::new(encrypted);
        let mut decrypted = Vec::new();
        let bytes = streamer
            .decrypt_stream(&mut decrypt_reader, &mut decrypted)
            .await
            .expect("decryption failed");

        assert_eq!(decrypted, plaintext);
        assert_eq!(bytes, plaintext.len() as u64);
    }

    #[tokio::test]
    async fn encryption_is_deterministic() {
        let streamer = make_streamer();
        let plaintext = patterned_image(4);

        let mut first = Vec::new();
        streamer
            .encrypt_stream(&mut Cursor::new(plaintext.clone()), &mut first)
            .await
            .unwrap();

        let mut second = Vec::new();
        streamer
            .encrypt_stream(&mut Cursor::new(plaintext), &mut second)
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn flipping_one_byte_touches_one_sector() {
        let streamer = make_streamer();

        let plaintext = patterned_image(4);
        let mut modified = plaintext.clone();
        modified[2 * SECTOR_SIZE + 100] ^= 0x01; // inside sector 2

        let mut base = Vec::new();
        streamer
            .encrypt_stream(&mut Cursor::new(plaintext), &mut base)
            .await
            .unwrap();
        let mut perturbed = Vec::new();
        streamer
            .encrypt_stream(&mut Cursor::new(modified), &mut perturbed)
            .await
            .unwrap();

        for sector in 0..4 {
            let range = sector * SECTOR_SIZE..(sector + 1) * SECTOR_SIZE;
            if sector == 2 {
                assert_ne!(base[range.clone()], perturbed[range]);
            } else {
                assert_eq!(base[range.clone()], perturbed[range]);
            }
        }
    }

    #[tokio::test]
    async fn truncated_input_fails_after_full_sectors() {
        let streamer = make_streamer();

        // One full sector plus 188 trailing bytes
        let mut input = patterned_image(1);
        input.extend(std::iter::repeat(0x7Fu8).take(188));

        let mut reader = Cursor::new(input);
        let mut output = Vec::new();
        let err = streamer
            .encrypt_stream(&mut reader, &mut output)
            .await
            .expect_err("truncated input must fail");

        match err.downcast_ref::<VolCryptError>() {
            Some(VolCryptError::TruncatedInput { trailing }) => assert_eq!(*trailing, 188),
            other => panic!("unexpected error: {:?}", other),
        }

        // The full sector before the truncation point was written
        assert_eq!(output.len(), SECTOR_SIZE);
    }

    #[tokio::test]
    async fn empty_input_is_empty_output() {
        let streamer = make_streamer();

        let mut reader = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let bytes = streamer
            .encrypt_stream(&mut reader, &mut output)
            .await
            .expect("empty input is valid");

        assert_eq!(bytes, 0);
        assert!(output.is_empty());
    }
}
