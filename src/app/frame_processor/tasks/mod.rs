// SPDX-License-Identifier: GPL-3.0-only

//! Decoder tasks
//!
//! The analysis gate talks to barcode decoders through [`BarcodeDecoder`].
//! Decoders are stateful and reused across frames; the gate calls
//! [`BarcodeDecoder::reset`] after every decode attempt.

pub mod qr_detector;

pub use qr_detector::QrDecoder;

use crate::app::frame_processor::types::{LuminanceImage, ResultPoint, ScanResult};
use crate::errors::DecodeError;

/// An opaque barcode decoder
pub trait BarcodeDecoder: Send {
    /// Decode one luminance image
    ///
    /// Candidate points seen while locating symbols are passed to
    /// `on_candidate` as they are found, whether or not decoding succeeds.
    fn decode(
        &mut self,
        image: &LuminanceImage,
        on_candidate: &mut dyn FnMut(ResultPoint),
    ) -> Result<ScanResult, DecodeError>;

    /// Drop any partial state left by the previous call
    fn reset(&mut self);
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for Box<D> {
    fn decode(
        &mut self,
        image: &LuminanceImage,
        on_candidate: &mut dyn FnMut(ResultPoint),
    ) -> Result<ScanResult, DecodeError> {
        (**self).decode(image, on_candidate)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
