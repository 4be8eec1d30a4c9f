// SPDX-License-Identifier: GPL-3.0-only

//! Analysis gate
//!
//! [`CodeAnalyzer`] receives one frame at a time from the analysis executor,
//! skips it when scanning is disabled, and otherwise runs the decoder on
//! the extracted luminance image. Misses are the steady state and are
//! absorbed here; only decoded results reach the listener.
//!
//! Two things happen on every path out of [`CodeAnalyzer::analyze`],
//! including a panicking decoder: the decoder is reset and the frame is
//! released. Both are tied to drops rather than to control flow.

use crate::app::frame_processor::extractor::extract_luminance;
use crate::app::frame_processor::tasks::BarcodeDecoder;
use crate::app::frame_processor::types::{DecodeOutcome, ScanResult};
use crate::app::viewfinder::points::ResultPointTracker;
use crate::backends::camera::types::PixelFrame;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// The enable/disable gate shared between the scan controller and the analyzer
///
/// Written from the UI thread and read on the analysis thread. A toggle
/// racing with a frame means at most one extra or one skipped frame.
#[derive(Debug)]
pub struct AnalysisState {
    enabled: AtomicBool,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl AnalysisState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Receives decoded results on the analysis thread
pub trait ResultListener: Send {
    fn on_decoded(&self, result: &ScanResult);
}

impl<F> ResultListener for F
where
    F: Fn(&ScanResult) + Send,
{
    fn on_decoded(&self, result: &ScanResult) {
        self(result)
    }
}

/// Resets the wrapped decoder when dropped
struct ResetGuard<'a, D: BarcodeDecoder> {
    decoder: &'a mut D,
}

impl<D: BarcodeDecoder> Deref for ResetGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.decoder
    }
}

impl<D: BarcodeDecoder> DerefMut for ResetGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.decoder
    }
}

impl<D: BarcodeDecoder> Drop for ResetGuard<'_, D> {
    fn drop(&mut self) {
        self.decoder.reset();
    }
}

/// Gate and decode invoker for camera frames
pub struct CodeAnalyzer<D: BarcodeDecoder> {
    decoder: D,
    state: Arc<AnalysisState>,
    tracker: Option<Arc<ResultPointTracker>>,
    listener: Option<Box<dyn ResultListener>>,
}

impl<D: BarcodeDecoder> CodeAnalyzer<D> {
    /// Create an analyzer gated by `state`
    pub fn new(decoder: D, state: Arc<AnalysisState>) -> Self {
        Self {
            decoder,
            state,
            tracker: None,
            listener: None,
        }
    }

    /// Forward decoder candidate points to the viewfinder's tracker
    pub fn with_tracker(mut self, tracker: Arc<ResultPointTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Register the listener invoked for every decoded frame
    pub fn with_listener<L: ResultListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> &Arc<AnalysisState> {
        &self.state
    }

    /// Analyze one frame, releasing it before returning
    pub fn analyze(&mut self, frame: PixelFrame) -> DecodeOutcome {
        if !self.state.is_enabled() {
            trace!("Analysis disabled, skipping frame");
            frame.release();
            return DecodeOutcome::NoResult;
        }

        trace!(
            width = frame.width,
            height = frame.height,
            rotation = frame.rotation.degrees(),
            "Analyzing frame"
        );

        let outcome = Self::decode_frame(&mut self.decoder, self.tracker.as_deref(), &frame);
        frame.release();

        if let (DecodeOutcome::Decoded(result), Some(listener)) = (&outcome, &self.listener) {
            listener.on_decoded(result);
        }

        outcome
    }

    fn decode_frame(
        decoder: &mut D,
        tracker: Option<&ResultPointTracker>,
        frame: &PixelFrame,
    ) -> DecodeOutcome {
        let mut decoder = ResetGuard { decoder };

        let image = match extract_luminance(frame) {
            Ok(image) => image,
            Err(e) => {
                debug!(error = %e, "Malformed frame, treating as miss");
                return DecodeOutcome::NoResult;
            }
        };

        if let Some(tracker) = tracker {
            tracker.set_image_size(image.width, image.height);
        }

        let result = decoder.decode(&image, &mut |point| {
            if let Some(tracker) = tracker {
                tracker.add_point(point);
            }
        });

        match result {
            Ok(result) => {
                debug!(
                    format = %result.format,
                    points = result.points.len(),
                    "Barcode decoded"
                );
                DecodeOutcome::Decoded(result)
            }
            Err(e) => {
                trace!(error = %e, "No barcode in frame");
                DecodeOutcome::NoResult
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::{BarcodeFormat, LuminanceImage, ResultPoint};
    use crate::backends::camera::types::{Plane, SensorRotation};
    use crate::errors::DecodeError;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Calls {
        decodes: AtomicUsize,
        resets: AtomicUsize,
    }

    /// Decoder returning a scripted result
    struct ScriptedDecoder {
        calls: Arc<Calls>,
        result: Result<ScanResult, DecodeError>,
        candidates: Vec<ResultPoint>,
    }

    impl BarcodeDecoder for ScriptedDecoder {
        fn decode(
            &mut self,
            _image: &LuminanceImage,
            on_candidate: &mut dyn FnMut(ResultPoint),
        ) -> Result<ScanResult, DecodeError> {
            self.calls.decodes.fetch_add(1, Ordering::SeqCst);
            for point in &self.candidates {
                on_candidate(*point);
            }
            self.result.clone()
        }

        fn reset(&mut self) {
            self.calls.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn decoded() -> ScanResult {
        ScanResult {
            text: "hello".to_string(),
            points: vec![ResultPoint::new(1.0, 1.0)],
            format: BarcodeFormat::QrCode,
        }
    }

    fn frame(planes: usize, released: &Arc<AtomicUsize>) -> PixelFrame {
        let counter = Arc::clone(released);
        let planes = (0..planes)
            .map(|i| Plane::packed(vec![i as u8; if i == 0 { 16 } else { 4 }], 4))
            .collect();
        PixelFrame::new(4, 4, SensorRotation::None, planes).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn analyzer(result: Result<ScanResult, DecodeError>) -> (CodeAnalyzer<ScriptedDecoder>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let decoder = ScriptedDecoder {
            calls: Arc::clone(&calls),
            result,
            candidates: vec![],
        };
        (CodeAnalyzer::new(decoder, AnalysisState::new()), calls)
    }

    #[test]
    fn test_success_releases_resets_and_notifies() {
        let released = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let (analyzer, calls) = analyzer(Ok(decoded()));
        let mut analyzer = analyzer.with_listener(move |r: &ScanResult| {
            sink.lock().unwrap().push(r.text.clone());
        });

        let outcome = analyzer.analyze(frame(3, &released));

        assert!(outcome.is_decoded());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(calls.resets.load(Ordering::SeqCst), 1);
        assert_eq!(*received.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_miss_is_silent() {
        let released = Arc::new(AtomicUsize::new(0));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let (analyzer, calls) = analyzer(Err(DecodeError::NotFound));
        let mut analyzer = analyzer.with_listener(move |_: &ScanResult| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(
            analyzer.analyze(frame(3, &released)),
            DecodeOutcome::NoResult
        );
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(calls.resets.load(Ordering::SeqCst), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_skips_decoder_but_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let (mut analyzer, calls) = analyzer(Ok(decoded()));
        analyzer.state().set_enabled(false);

        assert_eq!(
            analyzer.analyze(frame(3, &released)),
            DecodeOutcome::NoResult
        );
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(calls.decodes.load(Ordering::SeqCst), 0);
        assert_eq!(calls.resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_frame_is_a_miss() {
        let released = Arc::new(AtomicUsize::new(0));
        let (mut analyzer, calls) = analyzer(Ok(decoded()));

        assert_eq!(
            analyzer.analyze(frame(2, &released)),
            DecodeOutcome::NoResult
        );
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(calls.decodes.load(Ordering::SeqCst), 0);
        // Reset still runs on the early-return path
        assert_eq!(calls.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_candidates_reach_tracker() {
        let released = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(Calls::default());
        let decoder = ScriptedDecoder {
            calls,
            result: Err(DecodeError::NotFound),
            candidates: vec![ResultPoint::new(3.0, 4.0), ResultPoint::new(5.0, 6.0)],
        };
        let tracker = Arc::new(ResultPointTracker::new());
        let mut analyzer =
            CodeAnalyzer::new(decoder, AnalysisState::new()).with_tracker(Arc::clone(&tracker));

        analyzer.analyze(frame(3, &released));

        let snapshot = tracker.take_snapshot_for_paint();
        assert_eq!(snapshot.current.len(), 2);
        assert_eq!(snapshot.image_size, Some((4, 4)));
    }
}
