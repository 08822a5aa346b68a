//! QR code rendering.
//!
//! Renders chunk text to PNG images, SVG, or terminal ASCII. The text a
//! chunk produces is pure Base45 alphabet plus its header, so the encoder
//! picks alphanumeric mode on its own and the symbol holds the full
//! capacity-table budget.

use image::{DynamicImage, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use std::path::{Path, PathBuf};

use super::QrError;
use crate::chunk::Chunk;

/// Output format for QR codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrFormat {
    /// PNG image (default)
    #[default]
    Png,
    /// SVG vector image
    Svg,
    /// ASCII art (for terminal display)
    Ascii,
}

impl QrFormat {
    /// File extension for saved output in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            QrFormat::Png => "png",
            QrFormat::Svg => "svg",
            QrFormat::Ascii => "txt",
        }
    }
}

/// Configuration for QR code generation.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Error correction level (default: Medium)
    pub ec_level: EcLevel,
    /// Module size in pixels (default: 10)
    pub module_size: u32,
    /// Whether to draw the quiet zone around the symbol
    pub quiet_zone: bool,
    /// Output format
    pub format: QrFormat,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::M,
            module_size: 10,
            quiet_zone: true,
            format: QrFormat::Png,
        }
    }
}

/// Output from QR code generation.
pub enum QrOutput {
    /// PNG/image output
    Image(DynamicImage),
    /// SVG string output
    Svg(String),
    /// ASCII art output
    Ascii(String),
}

impl QrOutput {
    /// Returns the image if this is an image output.
    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            QrOutput::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Returns the string content (for SVG or ASCII).
    pub fn as_string(&self) -> Option<&str> {
        match self {
            QrOutput::Svg(s) | QrOutput::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders one QR symbol from already-encoded text.
pub fn generate_qr(text: &str, config: &QrConfig) -> Result<QrOutput, QrError> {
    let qr = QrCode::with_error_correction_level(text, config.ec_level).map_err(|e| {
        match e {
            qrcode::types::QrError::DataTooLong => QrError::DataTooLarge { chars: text.len() },
            other => QrError::Generation(other.to_string()),
        }
    })?;

    match config.format {
        QrFormat::Png => {
            let image = qr
                .render::<Luma<u8>>()
                .min_dimensions(100, 100)
                .quiet_zone(config.quiet_zone)
                .module_dimensions(config.module_size, config.module_size)
                .build();
            Ok(QrOutput::Image(DynamicImage::ImageLuma8(image)))
        }
        QrFormat::Svg => {
            let svg_string = qr
                .render()
                .min_dimensions(200, 200)
                .quiet_zone(config.quiet_zone)
                .dark_color(svg::Color("#000000"))
                .light_color(svg::Color("#ffffff"))
                .build();
            Ok(QrOutput::Svg(svg_string))
        }
        QrFormat::Ascii => {
            let ascii = qr
                .render::<char>()
                .quiet_zone(config.quiet_zone)
                .module_dimensions(2, 1)
                .build();
            Ok(QrOutput::Ascii(ascii))
        }
    }
}

/// Renders one QR symbol and saves it to a file.
pub fn generate_qr_to_file<P: AsRef<Path>>(
    text: &str,
    path: P,
    config: &QrConfig,
) -> Result<(), QrError> {
    let output = generate_qr(text, config)?;
    let path = path.as_ref();

    match output {
        QrOutput::Image(image) => {
            image
                .save(path)
                .map_err(|e| QrError::ImageSave(e.to_string()))?;
        }
        QrOutput::Svg(svg) => std::fs::write(path, svg)?,
        QrOutput::Ascii(ascii) => std::fs::write(path, ascii)?,
    }

    Ok(())
}

/// Renders a whole chunk set to numbered files `{prefix}_01.{ext}`,
/// `{prefix}_02.{ext}`, ... in `dir`, ordered by sequence index.
///
/// Returns the written paths in the same order.
pub fn generate_qr_set(
    chunks: &[Chunk],
    dir: &Path,
    prefix: &str,
    config: &QrConfig,
) -> Result<Vec<PathBuf>, QrError> {
    let mut paths = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let path = dir.join(format!(
            "{prefix}_{:02}.{}",
            chunk.sequence_index + 1,
            config.format.extension()
        ));
        generate_qr_to_file(&chunk.to_qr_text(), &path, config)?;
        paths.push(path);
    }

    Ok(paths)
}
