// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for barcode analysis
//!
//! Camera frames flow through three stages:
//!
//! - [`extractor`]: pull the luminance plane out of a [`PixelFrame`](crate::backends::camera::PixelFrame)
//! - [`tasks`]: decoders that find codes in a luminance image
//! - [`analyzer`]: the enable/disable gate that runs a decoder per frame

pub mod analyzer;
pub mod extractor;
pub mod tasks;
pub mod types;

pub use analyzer::{AnalysisState, CodeAnalyzer, ResultListener};
pub use extractor::extract_luminance;
pub use tasks::{BarcodeDecoder, QrDecoder};
pub use types::{
    BarcodeFormat, DecodeHints, DecodeOutcome, LuminanceImage, ResultPoint, ScanResult,
};
