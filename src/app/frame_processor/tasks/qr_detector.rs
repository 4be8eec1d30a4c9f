// SPDX-License-Identifier: GPL-3.0-only

//! QR code decoder
//!
//! Implements [`BarcodeDecoder`] on top of the rqrr crate. Large frames are
//! subsampled to a maximum dimension before detection for real-time
//! performance; reported points are scaled back to full frame coordinates.

use super::BarcodeDecoder;
use crate::app::frame_processor::types::{
    BarcodeFormat, DecodeHints, LuminanceImage, ResultPoint, ScanResult,
};
use crate::constants::DEFAULT_DECODE_MAX_DIMENSION;
use crate::errors::DecodeError;
use tracing::{debug, trace, warn};

/// QR code decoder
///
/// Holds the candidate corners found during the current call. They are
/// cleared by [`reset`](BarcodeDecoder::reset) so one frame's partial
/// detections never leak into the next.
pub struct QrDecoder {
    hints: DecodeHints,
    /// Maximum dimension for processing (frames are subsampled to this)
    max_dimension: u32,
    candidates: Vec<ResultPoint>,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new(DecodeHints::default())
    }
}

impl QrDecoder {
    /// Create a decoder with the given hints
    pub fn new(hints: DecodeHints) -> Self {
        Self {
            hints,
            max_dimension: DEFAULT_DECODE_MAX_DIMENSION,
            candidates: Vec::new(),
        }
    }

    /// Change the subsampling threshold
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    pub fn hints(&self) -> &DecodeHints {
        &self.hints
    }

    /// Candidate corners collected since the last reset
    pub fn pending_candidates(&self) -> &[ResultPoint] {
        &self.candidates
    }

    /// Scale factor from processing space back to frame space
    fn processing_scale(&self, width: u32, height: u32) -> f32 {
        if self.hints.try_harder || (width <= self.max_dimension && height <= self.max_dimension)
        {
            return 1.0;
        }
        (width as f32 / self.max_dimension as f32).max(height as f32 / self.max_dimension as f32)
    }
}

impl BarcodeDecoder for QrDecoder {
    fn decode(
        &mut self,
        image: &LuminanceImage,
        on_candidate: &mut dyn FnMut(ResultPoint),
    ) -> Result<ScanResult, DecodeError> {
        if !self.hints.allows(BarcodeFormat::QrCode) {
            return Err(DecodeError::NotFound);
        }

        if !self.candidates.is_empty() {
            warn!(
                stale = self.candidates.len(),
                "Decoder reused without reset, discarding stale candidates"
            );
            self.candidates.clear();
        }

        image.check_bounds()?;

        let start = std::time::Instant::now();
        let scale = self.processing_scale(image.width, image.height);
        let proc_width = ((image.width as f32 / scale) as usize).max(1);
        let proc_height = ((image.height as f32 / scale) as usize).max(1);
        let max_x = image.width - 1;
        let max_y = image.height - 1;

        // rqrr thresholds the greyscale samples into its own binarized view
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            proc_width,
            proc_height,
            |x, y| {
                let src_x = ((x as f32 * scale) as u32).min(max_x);
                let src_y = ((y as f32 * scale) as u32).min(max_y);
                image.luma(src_x, src_y)
            },
        );
        let grids = prepared.detect_grids();

        trace!(
            proc_width,
            proc_height,
            scale,
            grids = grids.len(),
            detection_ms = start.elapsed().as_millis(),
            "QR detection complete"
        );

        let mut last_error = DecodeError::NotFound;
        for grid in grids {
            let corners: Vec<ResultPoint> = grid
                .bounds
                .iter()
                .map(|p| ResultPoint::new(p.x as f32 * scale, p.y as f32 * scale))
                .collect();
            for corner in &corners {
                on_candidate(*corner);
            }
            self.candidates.extend_from_slice(&corners);

            match grid.decode() {
                Ok((meta, text)) => {
                    debug!(
                        version = meta.version.0,
                        length = text.len(),
                        total_ms = start.elapsed().as_millis(),
                        "Decoded QR code"
                    );
                    return Ok(ScanResult {
                        text,
                        points: corners,
                        format: BarcodeFormat::QrCode,
                    });
                }
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR grid");
                    last_error = match e {
                        rqrr::DeQRError::DataEcc | rqrr::DeQRError::FormatEcc => {
                            DecodeError::Checksum
                        }
                        other => DecodeError::Format(other.to_string()),
                    };
                }
            }
        }

        Err(last_error)
    }

    fn reset(&mut self) {
        self.candidates.clear();
    }
}
