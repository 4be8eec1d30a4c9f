// SPDX-License-Identifier: GPL-3.0-only

//! Scan controller
//!
//! Lives on the UI thread and owns the viewfinder overlay. Decoded results
//! arrive from the analysis thread over a channel and are applied here, so
//! the overlay only ever has one writer.
//!
//! ```text
//!            decoded result
//!   Scanning ───────────────▶ Stopped
//!      ▲                         │
//!      └──────── start_scan ─────┘
//! ```

use crate::app::frame_processor::analyzer::{AnalysisState, ResultListener};
use crate::app::frame_processor::types::{BarcodeFormat, ResultPoint, ScanResult};
use crate::app::viewfinder::ViewfinderOverlay;
use crate::backends::feedback::Feedback;
use futures::channel::mpsc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Stopped,
}

/// Host callback for decoded codes
pub trait ScanListener: Send {
    fn on_result(&mut self, text: &str, points: &[ResultPoint], format: BarcodeFormat);
}

impl<F> ScanListener for F
where
    F: FnMut(&str, &[ResultPoint], BarcodeFormat) + Send,
{
    fn on_result(&mut self, text: &str, points: &[ResultPoint], format: BarcodeFormat) {
        self(text, points, format)
    }
}

/// Analysis-thread end of the result channel
#[derive(Debug, Clone)]
pub struct ScanEventSender {
    sender: mpsc::UnboundedSender<ScanResult>,
}

impl ResultListener for ScanEventSender {
    fn on_decoded(&self, result: &ScanResult) {
        if self.sender.unbounded_send(result.clone()).is_err() {
            trace!("Scan controller gone, dropping result");
        }
    }
}

/// UI-thread end of the result channel
#[derive(Debug)]
pub struct ScanEventReceiver {
    receiver: mpsc::UnboundedReceiver<ScanResult>,
}

impl ScanEventReceiver {
    /// Next queued result without blocking
    ///
    /// Returns `None` both when the queue is empty and when every sender
    /// has been dropped.
    pub fn try_recv(&mut self) -> Option<ScanResult> {
        self.receiver.try_recv().ok()
    }
}

/// Channel that marshals decoded results onto the UI thread
pub fn scan_channel() -> (ScanEventSender, ScanEventReceiver) {
    let (sender, receiver) = mpsc::unbounded();
    (ScanEventSender { sender }, ScanEventReceiver { receiver })
}

/// Toggles analysis and the overlay in response to results and the host
pub struct ScanController {
    state: ScanState,
    analysis: Arc<AnalysisState>,
    overlay: ViewfinderOverlay,
    feedback: Box<dyn Feedback>,
    listener: Option<Box<dyn ScanListener>>,
}

impl ScanController {
    /// Create a controller in the `Scanning` state
    pub fn new(
        analysis: Arc<AnalysisState>,
        overlay: ViewfinderOverlay,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        analysis.set_enabled(true);
        Self {
            state: ScanState::Scanning,
            analysis,
            overlay,
            feedback,
            listener: None,
        }
    }

    pub fn with_listener<L: ScanListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn overlay(&self) -> &ViewfinderOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut ViewfinderOverlay {
        &mut self.overlay
    }

    /// Apply every result queued by the analysis thread; returns how many were accepted
    pub fn pump(&mut self, events: &mut ScanEventReceiver, now: Instant) -> usize {
        let mut accepted = 0;
        while let Some(result) = events.try_recv() {
            if self.on_decoded(result, now) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Handle one decoded result; returns false when it was ignored
    pub fn on_decoded(&mut self, result: ScanResult, now: Instant) -> bool {
        if self.state == ScanState::Stopped {
            // A frame that raced the gate toggle
            debug!(format = %result.format, "Ignoring result while stopped");
            return false;
        }

        self.state = ScanState::Stopped;
        self.analysis.set_enabled(false);
        self.overlay.stop_scan(now);
        self.feedback.play_beep_and_vibrate();

        info!(
            format = %result.format,
            length = result.text.len(),
            "Scan complete"
        );

        if let Some(listener) = self.listener.as_mut() {
            listener.on_result(&result.text, &result.points, result.format);
        }
        true
    }

    /// Resume scanning (e.g. the user asked to rescan)
    pub fn start_scan(&mut self, now: Instant) {
        if self.overlay.has_result_bitmap() {
            self.overlay.draw_viewfinder();
        }
        self.analysis.set_enabled(true);
        self.overlay.start_scan(now);
        self.state = ScanState::Scanning;
        debug!("Scanning started");
    }

    /// Pause scanning without a result
    pub fn stop_scan(&mut self, now: Instant) {
        self.analysis.set_enabled(false);
        self.overlay.stop_scan(now);
        self.state = ScanState::Stopped;
        debug!("Scanning stopped");
    }
}
