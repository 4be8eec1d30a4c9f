// SPDX-License-Identifier: MPL-2.0

//! Scanning application logic
//!
//! # Architecture
//!
//! - `frame_processor`: luminance extraction, decoding and the analysis gate
//! - `viewfinder`: overlay rendering, laser animation and result points
//! - `scan_controller`: the Scanning/Stopped state machine on the UI thread

pub mod frame_processor;
pub mod scan_controller;
pub mod viewfinder;

pub use scan_controller::{ScanController, ScanListener, ScanState, scan_channel};
pub use viewfinder::{FramingRect, Invalidation, ViewfinderOverlay, ViewfinderStyle};
