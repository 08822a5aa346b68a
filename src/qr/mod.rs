//! QR code rendering, reading, and capacity planning.
//!
//! The pipeline produces Base45 text precisely because a QR symbol's
//! alphanumeric mode packs that character set more densely than byte mode
//! packs Base64. This module renders chunk text to symbols, reads symbols
//! back to text, and answers the capacity questions the chunker needs.

mod capacity;
mod generator;
mod reader;

pub use capacity::{
    alphanumeric_capacity, max_chunk_chars, smallest_version_for, CHUNK_HEADER_RESERVE,
};
pub use generator::{
    generate_qr, generate_qr_set, generate_qr_to_file, QrConfig, QrFormat, QrOutput,
};
pub use reader::{read_qr_text, read_qr_text_from_file, GrayscaleDecoder, QrDecoder, ThresholdDecoder};

use thiserror::Error;

/// Errors that can occur during QR code operations.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("data too large for one QR symbol: {chars} characters")]
    DataTooLarge { chars: usize },

    #[error("QR code generation failed: {0}")]
    Generation(String),

    #[error("image save error: {0}")]
    ImageSave(String),

    #[error("image load error: {0}")]
    ImageLoad(String),

    #[error("no QR code decoded; attempts: {attempts}")]
    AllDecodersFailed { attempts: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
