// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for headless scanning
//!
//! This module provides command-line functionality for:
//! - Decoding barcodes from still images
//! - Rendering the viewfinder overlay to an image file

use codescan::Config;
use codescan::app::frame_processor::{
    AnalysisState, BarcodeFormat, CodeAnalyzer, DecodeOutcome, QrDecoder,
};
use codescan::app::viewfinder::ViewfinderOverlay;
use codescan::app::viewfinder::canvas::PixelCanvas;
use codescan::app::viewfinder::points::ResultPointTracker;
use codescan::backends::camera::{SensorRotation, frame_from_image};
use codescan::constants::LASER_PERIOD;
use image::imageops::FilterType;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// One line of `scan --json` output
#[derive(Serialize)]
struct ScanReport<'a> {
    path: &'a Path,
    decoded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a codescan::ScanResult>,
}

/// Decode every image through the analysis gate and print what was found
pub fn scan_images(
    mut config: Config,
    images: &[PathBuf],
    json: bool,
    formats: &[String],
    try_harder: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !formats.is_empty() {
        config.hints.possible_formats = formats
            .iter()
            .map(|name| {
                BarcodeFormat::parse(name).ok_or_else(|| format!("Unknown barcode format: {}", name))
            })
            .collect::<Result<Vec<_>, _>>()?;
    }
    config.hints.try_harder |= try_harder;

    let decoder =
        QrDecoder::new(config.hints.clone()).with_max_dimension(config.max_decode_dimension);
    let mut analyzer = CodeAnalyzer::new(decoder, AnalysisState::new());

    let mut found = 0;
    for path in images {
        let image = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let frame = frame_from_image(&image, SensorRotation::None);

        let outcome = analyzer.analyze(frame);
        let result = match &outcome {
            DecodeOutcome::Decoded(result) => {
                found += 1;
                Some(result)
            }
            DecodeOutcome::NoResult => None,
        };

        if json {
            let report = ScanReport {
                path,
                decoded: result.is_some(),
                result,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else if let Some(result) = result {
            println!("{}: [{}] {}", path.display(), result.format, result.text);
        } else {
            println!("{}: no barcode found", path.display());
        }
    }

    if !json {
        println!();
        println!("Decoded {} of {} images", found, images.len());
    }

    Ok(())
}

/// Paint the overlay once, headless, and save it
pub fn render_snapshot(
    config: Config,
    width: u32,
    height: u32,
    phase: f32,
    background: Option<&Path>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if width == 0 || height == 0 {
        return Err("Snapshot size must be non-zero".into());
    }
    if !(0.0..1.0).contains(&phase) {
        return Err(format!("Phase {} is outside [0, 1)", phase).into());
    }

    let canvas = match background {
        Some(path) => {
            let image = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
            PixelCanvas::from_image(
                image
                    .resize_exact(width, height, FilterType::Triangle)
                    .to_rgba8(),
            )
        }
        None => PixelCanvas::new(width, height),
    };
    let mut canvas = canvas.ok_or("Snapshot size must be non-zero")?;

    let start = Instant::now();
    let mut overlay =
        ViewfinderOverlay::new(config.style, Arc::new(ResultPointTracker::new()), start);
    overlay.set_bounds(width, height);
    overlay.paint(&mut canvas, start + LASER_PERIOD.mul_f32(phase));

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    canvas.into_image().save(output)?;

    let rect = overlay.framing_rect();
    println!(
        "Saved {}x{} overlay to {} (framing rect {},{} - {},{})",
        width,
        height,
        output.display(),
        rect.left,
        rect.top,
        rect.right,
        rect.bottom
    );
    Ok(())
}
