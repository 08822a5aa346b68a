//! QRseal - encrypted data transfer over QR codes.
//!
//! CLI front end over the library pipeline: generate keys, encrypt a file
//! or text into QR-ready chunks, render the chunk set as images, and
//! decrypt from scanned images or pasted chunk text.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qrcode::EcLevel;
use std::fs;
use std::path::PathBuf;

use qrseal::crypto::{Compression, KeyPair};
use qrseal::qr::{
    self, generate_qr_set, read_qr_text_from_file, smallest_version_for, QrConfig, QrFormat,
};
use qrseal::{load_private_key, load_public_key, pipeline, Chunk};

/// QRseal - encrypted data transfer over QR codes
///
/// Encrypts data end to end (AES-256-GCM under an RSA-3072-wrapped session
/// key) and packages it as a set of QR codes that can be printed, carried,
/// and scanned back in any order.
#[derive(Parser)]
#[command(name = "qrseal")]
#[command(version)]
#[command(about = "Encrypted data transfer over printed or displayed QR codes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new RSA key pair
    Keygen {
        /// Output path for keys (creates .pub and .key files)
        #[arg(short, long, default_value = "qrseal")]
        output: PathBuf,

        /// Modulus size in bits
        #[arg(long, default_value_t = 3072)]
        bits: usize,
    },

    /// Encrypt a file or text into QR-ready chunks
    Encrypt {
        /// File to encrypt (mutually exclusive with --text)
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to encrypt (mutually exclusive with --input)
        #[arg(short, long)]
        text: Option<String>,

        /// Path to the recipient's public key
        #[arg(short, long)]
        key: PathBuf,

        /// Write chunk text lines to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also render the chunk set as QR images into this directory
        #[arg(long)]
        qr_dir: Option<PathBuf>,

        /// Filename prefix for rendered QR images
        #[arg(long, default_value = "qrseal")]
        qr_prefix: String,

        /// QR image format: png, svg, or ascii
        #[arg(long, default_value = "png")]
        qr_format: String,

        /// Target QR version (1-40); sets the per-chunk capacity budget
        #[arg(long, default_value_t = 30)]
        qr_version: u8,

        /// Error correction level: l, m, q, or h
        #[arg(long, default_value = "m")]
        ec_level: String,

        /// Skip compression (for payloads that are already compressed)
        #[arg(long)]
        no_compress: bool,
    },

    /// Decrypt a chunk set back to the original payload
    Decrypt {
        /// Chunk texts, as printed by encrypt (any order)
        chunks: Vec<String>,

        /// Read chunk texts from a file, one per line
        #[arg(short = 'f', long, conflicts_with = "images")]
        file: Option<PathBuf>,

        /// Read chunks from QR image files (any order)
        #[arg(long, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Path to your private key
        #[arg(short, long)]
        key: PathBuf,

        /// Write the payload to this file; without it, print as text
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how many QR codes a payload of a given size would need
    Info {
        /// Payload size in bytes
        size: usize,

        /// Target QR version (1-40)
        #[arg(long, default_value_t = 30)]
        qr_version: u8,

        /// Error correction level: l, m, q, or h
        #[arg(long, default_value = "m")]
        ec_level: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { output, bits } => keygen(&output, bits),
        Commands::Encrypt {
            input,
            text,
            key,
            output,
            qr_dir,
            qr_prefix,
            qr_format,
            qr_version,
            ec_level,
            no_compress,
        } => encrypt(
            input,
            text,
            &key,
            output,
            qr_dir,
            &qr_prefix,
            &qr_format,
            qr_version,
            &ec_level,
            no_compress,
        ),
        Commands::Decrypt {
            chunks,
            file,
            images,
            key,
            output,
        } => decrypt(chunks, file, images, &key, output),
        Commands::Info {
            size,
            qr_version,
            ec_level,
        } => info(size, qr_version, &ec_level),
    }
}

fn keygen(output: &PathBuf, bits: usize) -> Result<()> {
    println!("Generating RSA-{bits} key pair (this can take a few seconds)...");

    let pair = KeyPair::generate_with_size(bits).context("key generation failed")?;
    pair.save_to_files(output)
        .with_context(|| format!("failed to write key files at {}", output.display()))?;

    println!("Public key:  {}", output.with_extension("pub").display());
    println!("Private key: {}", output.with_extension("key").display());
    println!("Share the public key; keep the private key to yourself.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn encrypt(
    input: Option<PathBuf>,
    text: Option<String>,
    key: &PathBuf,
    output: Option<PathBuf>,
    qr_dir: Option<PathBuf>,
    qr_prefix: &str,
    qr_format: &str,
    qr_version: u8,
    ec_level: &str,
    no_compress: bool,
) -> Result<()> {
    let payload = match (input, text) {
        (Some(path), None) => fs::read(&path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        (None, Some(text)) => text.into_bytes(),
        _ => bail!("provide exactly one of --input or --text"),
    };

    let ec_level = parse_ec_level(ec_level)?;
    let max_chunk = qr::max_chunk_chars(qr_version, ec_level)
        .with_context(|| format!("QR version {qr_version} cannot carry a chunk"))?;

    let public_key = load_public_key(key)
        .with_context(|| format!("failed to load public key {}", key.display()))?;
    let compression = if no_compress {
        Compression::None
    } else {
        Compression::Zstd
    };

    let chunks = pipeline::encrypt(&payload, &public_key, compression, max_chunk)?;
    println!(
        "Encrypted {} bytes into {} chunk(s) (version {qr_version}, budget {max_chunk} chars)",
        payload.len(),
        chunks.len()
    );

    let lines: Vec<String> = chunks.iter().map(Chunk::to_qr_text).collect();
    match &output {
        Some(path) => {
            fs::write(path, lines.join("\n") + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Chunk text written to {}", path.display());
        }
        None => {
            for line in &lines {
                println!("{line}");
            }
        }
    }

    if let Some(dir) = qr_dir {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let config = QrConfig {
            ec_level,
            format: parse_qr_format(qr_format)?,
            ..Default::default()
        };
        let paths = generate_qr_set(&chunks, &dir, qr_prefix, &config)?;
        println!("Rendered {} QR image(s) in {}", paths.len(), dir.display());
    }

    Ok(())
}

fn decrypt(
    chunk_texts: Vec<String>,
    file: Option<PathBuf>,
    images: Vec<PathBuf>,
    key: &PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut texts = chunk_texts;

    if let Some(path) = file {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        texts.extend(content.lines().filter(|l| !l.is_empty()).map(String::from));
    }

    for path in &images {
        let text = read_qr_text_from_file(path)
            .with_context(|| format!("failed to read QR code from {}", path.display()))?;
        texts.push(text);
    }

    if texts.is_empty() {
        bail!("no chunks given; pass chunk text, --file, or --images");
    }

    let chunks: Vec<Chunk> = texts
        .iter()
        .map(|text| Chunk::from_qr_text(text))
        .collect::<Result<_, _>>()
        .context("invalid chunk")?;

    let private_key = load_private_key(key)
        .with_context(|| format!("failed to load private key {}", key.display()))?;
    let payload = pipeline::decrypt(&chunks, &private_key)?;

    match output {
        Some(path) => {
            fs::write(&path, &payload)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Decrypted {} bytes to {}", payload.len(), path.display());
        }
        None => match String::from_utf8(payload) {
            Ok(text) => println!("{text}"),
            Err(_) => bail!("payload is not valid UTF-8 text; use --output to write it to a file"),
        },
    }

    Ok(())
}

fn info(size: usize, qr_version: u8, ec_level: &str) -> Result<()> {
    let ec_level = parse_ec_level(ec_level)?;
    let max_chunk = qr::max_chunk_chars(qr_version, ec_level)
        .with_context(|| format!("QR version {qr_version} cannot carry a chunk"))?;

    // Envelope overhead: ~430 bytes of CBOR framing, wrapped key, nonce
    // and tag, then Base45 expands by 3/2.
    let envelope_bytes = size + 430;
    let transport_chars = envelope_bytes.div_ceil(2) * 3;
    let chunk_count = transport_chars.div_ceil(max_chunk);

    println!("Payload size:       {size} bytes (before compression)");
    println!("Envelope estimate:  {envelope_bytes} bytes");
    println!("Transport estimate: {transport_chars} characters");
    println!("Chunk budget:       {max_chunk} characters per code");
    println!("QR codes needed:    ~{chunk_count}");
    if let Some(version) = smallest_version_for(transport_chars + qr::CHUNK_HEADER_RESERVE, ec_level) {
        println!("Fits one code at:   version {version}");
    }

    Ok(())
}

fn parse_ec_level(value: &str) -> Result<EcLevel> {
    match value.to_ascii_lowercase().as_str() {
        "l" => Ok(EcLevel::L),
        "m" => Ok(EcLevel::M),
        "q" => Ok(EcLevel::Q),
        "h" => Ok(EcLevel::H),
        other => bail!("unknown error correction level {other:?} (expected l, m, q, or h)"),
    }
}

fn parse_qr_format(value: &str) -> Result<QrFormat> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Ok(QrFormat::Png),
        "svg" => Ok(QrFormat::Svg),
        "ascii" => Ok(QrFormat::Ascii),
        other => bail!("unknown QR format {other:?} (expected png, svg, or ascii)"),
    }
}
