// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the frame capture boundary

//! Frame types delivered by the capture facility

use std::sync::Arc;
use std::time::Instant;

/// Sensor rotation in degrees (clockwise)
///
/// Reported with every frame so consumers can map decoder coordinates to
/// display coordinates. The scanning core itself decodes in sensor space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// One pixel plane of a frame
///
/// The byte range is shared (`Arc`) so a capture backend can hand out
/// frames without copying. `remaining()` is the number of readable bytes,
/// which may exceed `row_stride * rows` when the backend pads the buffer.
#[derive(Debug, Clone)]
pub struct Plane {
    data: Arc<[u8]>,
    /// Bytes between the starts of two consecutive rows
    pub row_stride: usize,
    /// Bytes between two horizontally adjacent samples
    pub pixel_stride: usize,
}

impl Plane {
    /// Create a plane with explicit strides
    pub fn new(data: impl Into<Arc<[u8]>>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data: data.into(),
            row_stride,
            pixel_stride,
        }
    }

    /// Create a tightly packed plane (pixel stride 1)
    pub fn packed(data: impl Into<Arc<[u8]>>, row_stride: usize) -> Self {
        Self::new(data, row_stride, 1)
    }

    /// Number of readable bytes in this plane
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Readable bytes of this plane
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// A camera frame owned by the capture facility until it is released
///
/// The release callback runs exactly once: either when [`PixelFrame::release`]
/// is called or when the frame is dropped. Because `release` consumes the
/// frame, nothing can read it afterwards.
pub struct PixelFrame {
    pub width: u32,
    pub height: u32,
    pub rotation: SensorRotation,
    pub captured_at: Instant,
    planes: Vec<Plane>,
    release: Option<ReleaseFn>,
}

impl PixelFrame {
    /// Create a frame without a release callback
    pub fn new(width: u32, height: u32, rotation: SensorRotation, planes: Vec<Plane>) -> Self {
        Self {
            width,
            height,
            rotation,
            captured_at: Instant::now(),
            planes,
            release: None,
        }
    }

    /// Attach the callback that hands the buffer back to the capture facility
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Pixel planes in capture order (Y, U, V for planar YUV)
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Hand the frame back to the capture facility
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PixelFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for PixelFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("planes", &self.planes.len())
            .finish()
    }
}
