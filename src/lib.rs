// SPDX-License-Identifier: MPL-2.0

//! Codescan - barcode scanning core
//!
//! Takes camera frames, decodes barcodes from their luminance plane on a
//! dedicated analysis thread, and renders a viewfinder overlay with a
//! framing rectangle, an animated laser and fading candidate points.
//!
//! # Architecture
//!
//! - [`app`]: frame analysis, the scan controller and the viewfinder overlay
//! - [`backends`]: frame sources, the analysis executor and scan feedback
//! - [`config`]: user configuration handling
//! - [`terminal`]: terminal preview host

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{BarcodeFormat, DecodeHints, ResultPoint, ScanResult};
pub use app::{ScanController, ScanState, ViewfinderOverlay};
pub use config::Config;
pub use errors::{AppError, AppResult};
