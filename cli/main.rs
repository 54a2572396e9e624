use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use volcrypt::error::VolCryptError;
use volcrypt::key_manager::KeyManager;
use volcrypt::sector::SECTOR_SIZE;
use volcrypt::streaming::SectorStreamer;

/// volcrypt - prepare raw volume images for dm-crypt in aes-cbc-essiv:sha256 mode
///
/// Writes the output file in a format that can be mapped with dm-crypt in
/// aes-cbc-essiv:sha256 mode. The key file is a 32-byte binary key.
#[derive(Parser)]
#[command(name = "volcrypt")]
#[command(author, version, about)]
struct Cli {
    /// Decrypt instead of encrypt
    #[arg(short, long)]
    decrypt: bool,

    /// Generate a fresh random key at KEY_FILE and exit
    #[arg(short = 'g', long, conflicts_with = "decrypt")]
    generate_key: bool,

    /// Path to the 32-byte binary key file
    key_file: PathBuf,

    /// Raw image to read
    #[arg(required_unless_present = "generate_key")]
    input: Option<PathBuf>,

    /// Path for the transformed image
    #[arg(required_unless_present = "generate_key")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging
    // Use RUST_LOG environment variable to control log level (e.g., RUST_LOG=info,volcrypt=debug)
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    if cli.generate_key {
        return cmd_generate_key(&cli.key_file).await;
    }

    // clap enforces these unless --generate-key was given
    let input = cli
        .input
        .context("input path is required unless --generate-key is used")?;
    let output = cli
        .output
        .context("output path is required unless --generate-key is used")?;

    cmd_crypt(&cli.key_file, &input, &output, cli.decrypt).await
}

/// Create a styled progress bar for the transform
fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Generate a fresh key file
async fn cmd_generate_key(key_file: &Path) -> Result<()> {
    let _km = KeyManager::generate(key_file).await?;

    println!("Generated key: {}", key_file.display());
    println!();
    println!("IMPORTANT: Keep your key file secure and backed up!");
    println!("Without it, volumes encrypted with it cannot be recovered.");

    Ok(())
}

/// Run the sector transform between the input and output images
async fn cmd_crypt(key_file: &Path, input: &Path, output: &Path, decrypt: bool) -> Result<()> {
    if input == output {
        return Err(VolCryptError::config(format!(
            "input and output must be different paths (both are '{}')",
            input.display()
        ))
        .into());
    }

    let km = KeyManager::load(key_file).await?;
    let streamer = SectorStreamer::new(km.sector_cipher());

    let input_size = fs::metadata(input)
        .await
        .with_context(|| format!("reading metadata for {:?}", input))?
        .len();

    let mut reader = fs::File::open(input)
        .await
        .with_context(|| format!("opening {:?}", input))?;
    let mut writer = fs::File::create(output)
        .await
        .with_context(|| format!("creating {:?}", output))?;

    let verb = if decrypt { "Decrypting" } else { "Encrypting" };
    let pb = create_progress_bar(input_size, verb);

    let result = if decrypt {
        streamer.decrypt_stream(&mut reader, &mut writer).await
    } else {
        streamer.encrypt_stream(&mut reader, &mut writer).await
    };

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e);
        }
    };

    pb.set_position(bytes);
    let done = if decrypt { "Decrypted" } else { "Encrypted" };
    pb.finish_with_message(format!(
        "{} {} bytes ({} sectors)",
        done,
        bytes,
        bytes / SECTOR_SIZE as u64
    ));

    info!(bytes, decrypt, "transform complete");
    println!("  {} -> {}", input.display(), output.display());
    Ok(())
}
