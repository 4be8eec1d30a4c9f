// SPDX-License-Identifier: GPL-3.0-only

//! Laser animation driver
//!
//! A linear, infinitely repeating 0→1 phase with a fixed period. The
//! overlay reads the phase when it paints; the animator never paints.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct LaserAnimator {
    period: Duration,
    started_at: Option<Instant>,
    /// Phase held while paused
    frozen_phase: f32,
}

impl LaserAnimator {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            started_at: None,
            frozen_phase: 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start from phase 0; no-op when already running
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Freeze at the current phase
    pub fn pause(&mut self, now: Instant) {
        if self.started_at.is_some() {
            self.frozen_phase = self.phase(now);
            self.started_at = None;
        }
    }

    /// Cycle position in `[0, 1)`
    pub fn phase(&self, now: Instant) -> f32 {
        let Some(started_at) = self.started_at else {
            return self.frozen_phase;
        };
        let elapsed = now.saturating_duration_since(started_at).as_nanos();
        let period = self.period.as_nanos();
        ((elapsed % period) as f64 / period as f64) as f32
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Laser opacity for a phase: transparent at both ends, opaque mid-cycle
pub fn laser_alpha(phase: f32) -> u8 {
    ((phase as f64 * std::f64::consts::PI).sin() * 255.0).clamp(0.0, 255.0) as u8
}
