// SPDX-License-Identifier: GPL-3.0-only

//! Candidate result point tracking
//!
//! The decode thread adds points as the decoder reports them; the render
//! thread takes one snapshot per paint. Each snapshot moves the current
//! batch into the "previous" slot so points fade over two generations:
//! bright when new, dim on the next paint, gone after that.

use crate::app::frame_processor::types::ResultPoint;
use crate::constants::MAX_RESULT_POINTS;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Batches {
    current: Vec<ResultPoint>,
    previous: Vec<ResultPoint>,
    image_size: Option<(u32, u32)>,
}

/// Points to draw for one paint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSnapshot {
    /// Newest points, drawn at full point opacity
    pub current: Vec<ResultPoint>,
    /// Previous generation, drawn at half opacity
    pub previous: Vec<ResultPoint>,
    /// Decoder image size the points are expressed in
    pub image_size: Option<(u32, u32)>,
}

impl PointSnapshot {
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }
}

/// Bounded, thread-safe buffer of recently observed candidate points
#[derive(Debug, Default)]
pub struct ResultPointTracker {
    batches: Mutex<Batches>,
}

impl ResultPointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Batches> {
        // Point lists stay consistent even if a holder panicked
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a point, trimming back to half capacity on overflow
    pub fn add_point(&self, point: ResultPoint) {
        let mut batches = self.lock();
        let points = &mut batches.current;
        points.push(point);
        let size = points.len();
        if size > MAX_RESULT_POINTS {
            points.drain(..size - MAX_RESULT_POINTS / 2);
        }
    }

    /// Record the decoder image size that subsequent points refer to
    pub fn set_image_size(&self, width: u32, height: u32) {
        self.lock().image_size = Some((width, height));
    }

    /// Rotate the batches for one paint and return what to draw
    pub fn take_snapshot_for_paint(&self) -> PointSnapshot {
        let mut batches = self.lock();
        let image_size = batches.image_size;
        if batches.current.is_empty() {
            let previous = std::mem::take(&mut batches.previous);
            PointSnapshot {
                current: Vec::new(),
                previous,
                image_size,
            }
        } else {
            let current = std::mem::take(&mut batches.current);
            let previous = std::mem::replace(&mut batches.previous, current.clone());
            PointSnapshot {
                current,
                previous,
                image_size,
            }
        }
    }

    /// Number of points in the accumulating batch
    pub fn pending(&self) -> usize {
        self.lock().current.len()
    }

    /// Drop every tracked point
    pub fn clear(&self) {
        let mut batches = self.lock();
        batches.current.clear();
        batches.previous.clear();
    }
}
