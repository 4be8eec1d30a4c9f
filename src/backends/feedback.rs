// SPDX-License-Identifier: GPL-3.0-only

//! Scan feedback (beep and vibration)

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, warn};

/// User preferences for scan feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    pub beep: bool,
    pub vibrate: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            beep: true,
            vibrate: false,
        }
    }
}

/// Something that can acknowledge a successful scan
pub trait Feedback: Send {
    fn play_beep_and_vibrate(&mut self);
}

/// Feedback that does nothing (tests, batch decoding)
#[derive(Debug, Default)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn play_beep_and_vibrate(&mut self) {}
}

/// Beeps by writing the terminal bell to a writer
///
/// Vibration has no terminal equivalent and is only logged.
pub struct BeepManager<W: Write + Send> {
    settings: FeedbackSettings,
    out: W,
}

impl BeepManager<std::io::Stderr> {
    /// Beep on the controlling terminal
    pub fn terminal(settings: FeedbackSettings) -> Self {
        Self::new(settings, std::io::stderr())
    }
}

impl<W: Write + Send> BeepManager<W> {
    pub fn new(settings: FeedbackSettings, out: W) -> Self {
        Self { settings, out }
    }

    /// Apply changed preferences
    pub fn update_prefs(&mut self, settings: FeedbackSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> FeedbackSettings {
        self.settings
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Feedback for BeepManager<W> {
    fn play_beep_and_vibrate(&mut self) {
        if self.settings.beep {
            if let Err(e) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
                warn!(error = %e, "Failed to play beep");
            }
        }
        if self.settings.vibrate {
            debug!("Vibration requested");
        }
    }
}
