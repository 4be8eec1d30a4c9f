// SPDX-License-Identifier: MPL-2.0

//! Core types for frame analysis results
//!
//! These types flow from the decoder through the analysis gate to the scan
//! controller and the viewfinder overlay.

use crate::errors::DecodeError;
use serde::{Deserialize, Serialize};

/// A point reported by the decoder, in decoder image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultPoint {
    pub x: f32,
    pub y: f32,
}

impl ResultPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Barcode symbologies that can appear in decoder hints and results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    Ean8,
    Ean13,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Code128,
    Codabar,
    Itf,
}

impl BarcodeFormat {
    /// All formats, for CLI parsing and display
    pub const ALL: [BarcodeFormat; 13] = [
        BarcodeFormat::QrCode,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Aztec,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::Codabar,
        BarcodeFormat::Itf,
    ];

    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::QrCode => "QR Code",
            Self::DataMatrix => "Data Matrix",
            Self::Aztec => "Aztec",
            Self::Pdf417 => "PDF417",
            Self::Ean8 => "EAN-8",
            Self::Ean13 => "EAN-13",
            Self::UpcA => "UPC-A",
            Self::UpcE => "UPC-E",
            Self::Code39 => "Code 39",
            Self::Code93 => "Code 93",
            Self::Code128 => "Code 128",
            Self::Codabar => "Codabar",
            Self::Itf => "ITF",
        }
    }

    /// Parse a format name as written on the command line (`qr_code`, `qr`, `ean13`, ...)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "qr" | "qrcode" => Some(Self::QrCode),
            "datamatrix" => Some(Self::DataMatrix),
            "aztec" => Some(Self::Aztec),
            "pdf417" => Some(Self::Pdf417),
            "ean8" => Some(Self::Ean8),
            "ean13" => Some(Self::Ean13),
            "upca" => Some(Self::UpcA),
            "upce" => Some(Self::UpcE),
            "code39" => Some(Self::Code39),
            "code93" => Some(Self::Code93),
            "code128" => Some(Self::Code128),
            "codabar" => Some(Self::Codabar),
            "itf" => Some(Self::Itf),
            _ => None,
        }
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Options handed to the decoder once at construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeHints {
    /// Format allow-list; empty means every format the decoder supports
    pub possible_formats: Vec<BarcodeFormat>,
    /// Spend more time per frame (full resolution, no subsampling)
    pub try_harder: bool,
}

impl DecodeHints {
    /// Check whether a format passes the allow-list
    pub fn allows(&self, format: BarcodeFormat) -> bool {
        self.possible_formats.is_empty() || self.possible_formats.contains(&format)
    }
}

/// A successfully decoded barcode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Decoded text content
    pub text: String,
    /// Symbol corners or finder patterns in decoder image space
    pub points: Vec<ResultPoint>,
    pub format: BarcodeFormat,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    NoResult,
    Decoded(ScanResult),
}

impl DecodeOutcome {
    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeOutcome::Decoded(_))
    }
}

/// Contiguous `Y ‖ U ‖ V` bytes extracted from one frame
///
/// Only the leading luminance plane is read by decoders. `row_stride` is
/// the Y plane's stride, which may be wider than `width`.
#[derive(Debug, Clone)]
pub struct LuminanceImage {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub row_stride: usize,
    pub luma_len: usize,
}

impl LuminanceImage {
    pub(crate) fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: usize,
        luma_len: usize,
    ) -> Self {
        Self {
            data,
            width,
            height,
            row_stride,
            luma_len,
        }
    }

    /// All extracted bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Total extracted length (sum of all plane lengths)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Verify the luminance plane covers the declared geometry
    pub fn check_bounds(&self) -> Result<(), DecodeError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let needed = match height {
            0 => 0,
            rows => self.row_stride * (rows - 1) + width,
        };
        if self.row_stride < width || needed > self.luma_len {
            return Err(DecodeError::OutOfBounds {
                needed,
                available: self.luma_len,
            });
        }
        Ok(())
    }

    /// Luminance at (x, y); callers must have run [`check_bounds`](Self::check_bounds)
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.row_stride + x as usize]
    }
}
