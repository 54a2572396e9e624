//! # volcrypt - dm-crypt Compatible Volume Encryption Library
//!
//! volcrypt transforms raw block-device images between plaintext and the
//! sector-encrypted layout dm-crypt expects in `aes-cbc-essiv:sha256` mode.
//!
//! ## Features
//!
//! - **AES-256-CBC per sector**: every 512-byte sector is an independent CBC unit
//! - **ESSIV IVs**: sector IVs derived from SHA-256 of the master key, never stored
//! - **Headerless output**: byte-for-byte compatible with an independently keyed dm-crypt mapping
//! - **Streaming API**: process arbitrarily large images without loading them into memory
//! - **Secure Key Handling**: 32-byte binary key files, zeroization, Unix permissions
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use volcrypt::{key_manager::KeyManager, streaming::SectorStreamer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let km = KeyManager::load(Path::new("./volume.key")).await?;
//!     let streamer = SectorStreamer::new(km.sector_cipher());
//!
//!     let mut input = tokio::fs::File::open("plain.img").await?;
//!     let mut output = tokio::fs::File::create("encrypted.img").await?;
//!     streamer.encrypt_stream(&mut input, &mut output).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## On-Disk Format
//!
//! There is none beyond the sectors themselves: output sector *i* is the
//! AES-256-CBC transform of input sector *i* under IV = ESSIV(key, *i*). No
//! header, magic bytes, salt, or IV is ever written, so the image can be
//! mapped directly with `cryptsetup open --type plain` in
//! `aes-cbc-essiv:sha256` mode.

pub mod error;
pub mod essiv;
pub mod key_manager;
pub mod sector;
pub mod streaming;

// Re-export common types for convenience
pub use error::VolCryptError;
