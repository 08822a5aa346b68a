//! QR code reading.
//!
//! Reading a printed, re-photographed symbol is the flaky half of the
//! round trip, so decoding is a capability: every [`QrDecoder`] variant
//! gets a try in a fixed preference order, the first success wins, and a
//! total failure reports every variant's reason in one error instead of
//! only the last one.

use image::{DynamicImage, GrayImage};
use rqrr::PreparedImage;
use std::path::Path;

use super::QrError;

/// One way of locating and decoding QR symbols in an image.
pub trait QrDecoder {
    /// Short name used in aggregated failure reports.
    fn name(&self) -> &'static str;

    /// Returns the text of every symbol found, or why none was decoded.
    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>, String>;
}

/// Plain grayscale pass; handles clean renders and good scans.
pub struct GrayscaleDecoder;

impl QrDecoder for GrayscaleDecoder {
    fn name(&self) -> &'static str {
        "grayscale"
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>, String> {
        decode_gray(image.to_luma8())
    }
}

/// Binarizing retry pass for washed-out or unevenly lit photographs:
/// thresholds every pixel against the image's mean luminance before
/// detection.
pub struct ThresholdDecoder;

impl QrDecoder for ThresholdDecoder {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn decode(&self, image: &DynamicImage) -> Result<Vec<String>, String> {
        let mut gray = image.to_luma8();

        let sum: u64 = gray.pixels().map(|p| p.0[0] as u64).sum();
        let pixel_count = (gray.width() as u64 * gray.height() as u64).max(1);
        let mean = (sum / pixel_count) as u8;

        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] < mean { 0 } else { 255 };
        }

        decode_gray(gray)
    }
}

fn decode_gray(gray: GrayImage) -> Result<Vec<String>, String> {
    let mut prepared = PreparedImage::prepare(gray);
    let grids = prepared.detect_grids();

    if grids.is_empty() {
        return Err("no QR grid found".to_string());
    }

    let mut contents = Vec::new();
    let mut failures = Vec::new();
    for grid in grids {
        match grid.decode() {
            Ok((_, content)) => contents.push(content),
            Err(e) => failures.push(format!("{e:?}")),
        }
    }

    if contents.is_empty() {
        return Err(format!("grids found but none decoded: {}", failures.join(", ")));
    }

    Ok(contents)
}

/// The decoder preference order.
const DECODERS: [&dyn QrDecoder; 2] = [&GrayscaleDecoder, &ThresholdDecoder];

/// Reads the text of a single QR symbol from an image.
///
/// Tries each decoder in preference order; first success wins. When every
/// decoder fails, the error aggregates each one's reason.
pub fn read_qr_text(image: &DynamicImage) -> Result<String, QrError> {
    let mut attempts = Vec::new();

    for decoder in DECODERS {
        match decoder.decode(image) {
            Ok(mut contents) => return Ok(contents.swap_remove(0)),
            Err(reason) => attempts.push(format!("{}: {}", decoder.name(), reason)),
        }
    }

    Err(QrError::AllDecodersFailed {
        attempts: attempts.join("; "),
    })
}

/// Reads the text of a single QR symbol from an image file.
pub fn read_qr_text_from_file<P: AsRef<Path>>(path: P) -> Result<String, QrError> {
    let image = image::open(path).map_err(|e| QrError::ImageLoad(e.to_string()))?;
    read_qr_text(&image)
}
