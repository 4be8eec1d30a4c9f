// SPDX-License-Identifier: MPL-2.0

//! Viewfinder overlay
//!
//! Draws on top of the camera preview:
//!
//! - a translucent mask outside the framing rectangle
//! - the framing rectangle border and corner brackets
//! - a laser line sweeping through the rectangle while scanning
//! - candidate result points, fading over two paints
//! - a dimmed result image once a code has been decoded
//!
//! # Repaint loop
//!
//! Every paint that shows the live viewfinder asks for exactly one more
//! paint [`ANIMATION_DELAY`] later, limited to the framing rectangle. A
//! paint that shows a result image asks for nothing, so the loop stops
//! until the result is cleared. The host collects requests with
//! [`ViewfinderOverlay::take_invalidation`].

pub mod animator;
pub mod canvas;
pub mod points;

use crate::app::frame_processor::types::ResultPoint;
use crate::constants::{
    ANIMATION_DELAY, CURRENT_POINT_OPACITY, FRAMING_RATIO, LASER_HEIGHT, LASER_INSET,
    LASER_PERIOD, POINT_SIZE, RESULT_BITMAP_OPACITY,
};
use animator::{LaserAnimator, laser_alpha};
use canvas::{Canvas, Color, Paint, RectF};
use image::RgbaImage;
use points::ResultPointTracker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Drawing constants for the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewfinderStyle {
    /// Area outside the framing rectangle while scanning
    pub mask_color: Color,
    /// Area outside the framing rectangle while a result is shown
    pub result_color: Color,
    pub laser_color: Color,
    pub result_point_color: Color,
    pub border_color: Color,
    pub border_width: f32,
    pub corner_color: Color,
    pub corner_width: f32,
    pub corner_length: f32,
    /// Radius of the newest candidate points
    pub point_size: f32,
    /// Opacity of the newest candidate points
    pub point_opacity: u8,
}

impl Default for ViewfinderStyle {
    fn default() -> Self {
        Self {
            mask_color: Color::from_argb(0x6000_0000),
            result_color: Color::from_argb(0xB000_0000),
            laser_color: Color::from_argb(0xFFCC_0000),
            result_point_color: Color::from_argb(0xC0FF_BD21),
            border_color: Color::from_argb(0x80FF_FFFF),
            border_width: 1.0,
            corner_color: Color::from_argb(0xFF1E_88E5),
            corner_width: 4.0,
            corner_length: 20.0,
            point_size: POINT_SIZE,
            point_opacity: CURRENT_POINT_OPACITY,
        }
    }
}

/// The square scanning window, in overlay pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramingRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FramingRect {
    /// Centered square whose side is 3/4 of the shorter overlay dimension
    pub fn for_bounds(width: u32, height: u32) -> Self {
        let (num, denom) = FRAMING_RATIO;
        let width = width as i32;
        let height = height as i32;
        let size = (width * num / denom).min(height * num / denom);
        let left = (width - size) / 2;
        let top = (height - size) / 2;
        Self {
            left,
            top,
            right: left + size,
            bottom: top + size,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn to_rect_f(self) -> RectF {
        RectF::new(
            self.left as f32,
            self.top as f32,
            self.right as f32,
            self.bottom as f32,
        )
    }
}

/// A repaint the overlay wants from its host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Repaint the whole overlay as soon as possible
    Full,
    /// Repaint only `rect` after `delay`
    Region { rect: FramingRect, delay: Duration },
}

/// Viewfinder overlay state and painter
///
/// Owned by the UI thread. The only state shared with the analysis thread
/// is the point tracker.
pub struct ViewfinderOverlay {
    style: ViewfinderStyle,
    width: u32,
    height: u32,
    framing_rect: FramingRect,
    animator: LaserAnimator,
    scanning: bool,
    tracker: Arc<ResultPointTracker>,
    result_bitmap: Option<RgbaImage>,
    pending: Option<Invalidation>,
}

impl ViewfinderOverlay {
    /// Create an overlay with its laser animation already running
    pub fn new(style: ViewfinderStyle, tracker: Arc<ResultPointTracker>, now: Instant) -> Self {
        let mut animator = LaserAnimator::new(LASER_PERIOD);
        animator.start(now);
        Self {
            style,
            width: 0,
            height: 0,
            framing_rect: FramingRect::default(),
            animator,
            scanning: true,
            tracker,
            result_bitmap: None,
            pending: Some(Invalidation::Full),
        }
    }

    /// Layout bounds changed
    pub fn set_bounds(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.framing_rect = FramingRect::for_bounds(width, height);
        debug!(width, height, frame = ?self.framing_rect, "Viewfinder bounds changed");
        self.pending = Some(Invalidation::Full);
    }

    pub fn framing_rect(&self) -> FramingRect {
        self.framing_rect
    }

    pub fn style(&self) -> &ViewfinderStyle {
        &self.style
    }

    pub fn tracker(&self) -> &Arc<ResultPointTracker> {
        &self.tracker
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_running()
    }

    pub fn laser_phase(&self, now: Instant) -> f32 {
        self.animator.phase(now)
    }

    pub fn has_result_bitmap(&self) -> bool {
        self.result_bitmap.is_some()
    }

    /// Show the laser and resume the animation
    pub fn start_scan(&mut self, now: Instant) {
        self.scanning = true;
        self.animator.start(now);
        self.pending.get_or_insert(Invalidation::Full);
    }

    /// Hide the laser and pause the animation
    pub fn stop_scan(&mut self, now: Instant) {
        self.scanning = false;
        self.animator.pause(now);
    }

    /// Replace the live viewfinder with an image of the decoded code
    pub fn draw_result_bitmap(&mut self, bitmap: RgbaImage) {
        self.result_bitmap = Some(bitmap);
        self.pending = Some(Invalidation::Full);
    }

    /// Drop the result image and return to the live viewfinder
    pub fn draw_viewfinder(&mut self) {
        self.result_bitmap = None;
        self.pending = Some(Invalidation::Full);
    }

    /// Take the repaint request left by the last paint or state change
    pub fn take_invalidation(&mut self) -> Option<Invalidation> {
        self.pending.take()
    }

    /// Paint the overlay; schedules the next paint unless a result is shown
    pub fn paint(&mut self, canvas: &mut dyn Canvas, now: Instant) {
        self.pending = None;

        self.draw_mask(canvas);
        self.draw_border(canvas);
        self.draw_corners(canvas);

        if let Some(bitmap) = &self.result_bitmap {
            canvas.draw_image(bitmap, self.framing_rect.to_rect_f(), RESULT_BITMAP_OPACITY);
            return;
        }

        if self.scanning {
            self.draw_laser(canvas, self.animator.phase(now));
        }
        self.draw_points(canvas);

        self.pending = Some(Invalidation::Region {
            rect: self.framing_rect,
            delay: ANIMATION_DELAY,
        });
    }

    fn draw_mask(&self, canvas: &mut dyn Canvas) {
        let frame = self.framing_rect.to_rect_f();
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        let color = if self.result_bitmap.is_some() {
            self.style.result_color
        } else {
            self.style.mask_color
        };
        let paint = Paint::fill(color);

        canvas.draw_rect(RectF::new(0.0, 0.0, width, frame.top), &paint);
        canvas.draw_rect(
            RectF::new(0.0, frame.top, frame.left, frame.bottom + 1.0),
            &paint,
        );
        canvas.draw_rect(
            RectF::new(frame.right + 1.0, frame.top, width, frame.bottom + 1.0),
            &paint,
        );
        canvas.draw_rect(RectF::new(0.0, frame.bottom + 1.0, width, height), &paint);
    }

    fn draw_border(&self, canvas: &mut dyn Canvas) {
        let paint = Paint::stroke(self.style.border_color, self.style.border_width);
        canvas.draw_rect(self.framing_rect.to_rect_f(), &paint);
    }

    fn draw_corners(&self, canvas: &mut dyn Canvas) {
        let paint = Paint::stroke(self.style.corner_color, self.style.corner_width);
        let offset = self.style.corner_width / 2.0;
        let length = self.style.corner_length;
        let RectF {
            left,
            top,
            right,
            bottom,
        } = self.framing_rect.to_rect_f();

        let segments = [
            // top-left
            ((left - offset, top), (left - offset + length, top)),
            ((left, top - offset), (left, top - offset + length)),
            // bottom-left
            ((left - offset, bottom), (left - offset + length, bottom)),
            ((left, bottom + offset), (left, bottom + offset - length)),
            // top-right
            ((right + offset, top), (right + offset - length, top)),
            ((right, top - offset), (right, top - offset + length)),
            // bottom-right
            ((right + offset, bottom), (right + offset - length, bottom)),
            ((right, bottom + offset), (right, bottom + offset - length)),
        ];
        for (from, to) in segments {
            canvas.draw_line(from, to, &paint);
        }
    }

    fn draw_laser(&self, canvas: &mut dyn Canvas, phase: f32) {
        let frame = self.framing_rect;
        let travel = (frame.bottom - frame.top - LASER_INSET) as f32;
        let laser_top = frame.top + (travel * phase) as i32;
        let paint = Paint::fill(self.style.laser_color.with_alpha(laser_alpha(phase)));
        canvas.draw_rect(
            RectF::new(
                (frame.left + LASER_INSET) as f32,
                laser_top as f32,
                (frame.right - LASER_INSET) as f32,
                (laser_top + LASER_HEIGHT) as f32,
            ),
            &paint,
        );
    }

    fn draw_points(&self, canvas: &mut dyn Canvas) {
        let snapshot = self.tracker.take_snapshot_for_paint();
        let Some((image_width, image_height)) = snapshot.image_size else {
            return;
        };
        if image_width == 0 || image_height == 0 {
            return;
        }

        let frame = self.framing_rect;
        let scale_x = frame.width() as f32 / image_width as f32;
        let scale_y = frame.height() as f32 / image_height as f32;
        let to_frame = |point: &ResultPoint| {
            (
                (frame.left + (point.x * scale_x) as i32) as f32,
                (frame.top + (point.y * scale_y) as i32) as f32,
            )
        };

        let color = self.style.result_point_color;
        let current = Paint::fill(color.with_alpha(self.style.point_opacity));
        for point in &snapshot.current {
            canvas.draw_circle(to_frame(point), self.style.point_size, &current);
        }

        let previous = Paint::fill(color.with_alpha(self.style.point_opacity / 2));
        for point in &snapshot.previous {
            canvas.draw_circle(to_frame(point), self.style.point_size / 2.0, &previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::PixelCanvas;

    /// Canvas that records primitives instead of rasterizing them
    #[derive(Default)]
    struct RecordingCanvas {
        rects: Vec<(RectF, Paint)>,
        lines: usize,
        circles: Vec<(f32, f32, f32, u8)>,
        images: Vec<u8>,
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> u32 {
            400
        }

        fn height(&self) -> u32 {
            800
        }

        fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
            self.rects.push((rect, *paint));
        }

        fn draw_line(&mut self, _from: (f32, f32), _to: (f32, f32), _paint: &Paint) {
            self.lines += 1;
        }

        fn draw_circle(&mut self, center: (f32, f32), radius: f32, paint: &Paint) {
            self.circles.push((center.0, center.1, radius, paint.color.a));
        }

        fn draw_image(&mut self, _image: &RgbaImage, _dst: RectF, alpha: u8) {
            self.images.push(alpha);
        }
    }

    fn overlay(now: Instant) -> ViewfinderOverlay {
        let mut overlay = ViewfinderOverlay::new(
            ViewfinderStyle::default(),
            Arc::new(ResultPointTracker::new()),
            now,
        );
        overlay.set_bounds(400, 800);
        overlay
    }

    #[test]
    fn test_framing_rect_is_centered_square() {
        let rect = FramingRect::for_bounds(400, 800);
        assert_eq!(
            rect,
            FramingRect {
                left: 50,
                top: 250,
                right: 350,
                bottom: 550
            }
        );

        let rect = FramingRect::for_bounds(1000, 600);
        assert_eq!(rect.width(), 450);
        assert_eq!(rect.height(), 450);
        assert_eq!(rect.left, 275);
    }

    #[test]
    fn test_live_paint_schedules_region_repaint() {
        let now = Instant::now();
        let mut overlay = overlay(now);
        let mut canvas = RecordingCanvas::default();

        overlay.paint(&mut canvas, now);

        assert_eq!(canvas.lines, 8);
        assert_eq!(
            overlay.take_invalidation(),
            Some(Invalidation::Region {
                rect: overlay.framing_rect(),
                delay: ANIMATION_DELAY
            })
        );
        assert_eq!(overlay.take_invalidation(), None);
    }

    #[test]
    fn test_laser_position_and_alpha_mid_cycle() {
        let t0 = Instant::now();
        let mut overlay = overlay(t0);
        let mut canvas = RecordingCanvas::default();

        overlay.paint(&mut canvas, t0 + LASER_PERIOD / 2);

        // mask (4) + border (1) + laser (1)
        assert_eq!(canvas.rects.len(), 6);
        let (laser, paint) = canvas.rects[5];
        // 250 + (300 - 10) * 0.5
        assert_eq!(laser.top, 395.0);
        assert_eq!(laser.bottom, 397.0);
        assert_eq!(laser.left, 60.0);
        assert_eq!(laser.right, 340.0);
        assert_eq!(paint.color.a, 255);
    }

    #[test]
    fn test_stopped_overlay_draws_no_laser_but_keeps_looping() {
        let now = Instant::now();
        let mut overlay = overlay(now);
        overlay.stop_scan(now);
        let mut canvas = RecordingCanvas::default();

        overlay.paint(&mut canvas, now);

        assert_eq!(canvas.rects.len(), 5);
        assert!(!overlay.is_animating());
        assert!(matches!(
            overlay.take_invalidation(),
            Some(Invalidation::Region { .. })
        ));
    }

    #[test]
    fn test_result_bitmap_stops_the_loop() {
        let now = Instant::now();
        let mut overlay = overlay(now);
        overlay.draw_result_bitmap(RgbaImage::new(10, 10));
        assert_eq!(overlay.take_invalidation(), Some(Invalidation::Full));

        let mut canvas = RecordingCanvas::default();
        overlay.paint(&mut canvas, now);

        assert_eq!(canvas.images, vec![RESULT_BITMAP_OPACITY]);
        assert_eq!(canvas.rects[0].1.color, ViewfinderStyle::default().result_color);
        assert_eq!(overlay.take_invalidation(), None);

        overlay.draw_viewfinder();
        assert!(!overlay.has_result_bitmap());
        assert_eq!(overlay.take_invalidation(), Some(Invalidation::Full));
    }

    #[test]
    fn test_points_fade_over_two_paints() {
        let now = Instant::now();
        let mut overlay = overlay(now);
        let tracker = Arc::clone(overlay.tracker());
        tracker.set_image_size(600, 600);
        tracker.add_point(ResultPoint::new(300.0, 300.0));

        let mut first = RecordingCanvas::default();
        overlay.paint(&mut first, now);
        // Scaled by 300/600 into the frame at (50, 250)
        assert_eq!(first.circles, vec![(200.0, 400.0, 6.0, 0xA0)]);

        let mut second = RecordingCanvas::default();
        overlay.paint(&mut second, now);
        assert_eq!(second.circles, vec![(200.0, 400.0, 3.0, 0x50)]);

        let mut third = RecordingCanvas::default();
        overlay.paint(&mut third, now);
        assert!(third.circles.is_empty());
    }

    #[test]
    fn test_pixel_paint_masks_outside_frame() {
        let now = Instant::now();
        let mut overlay = overlay(now);
        let mut canvas = PixelCanvas::new(400, 800).unwrap();

        overlay.paint(&mut canvas, now);

        let image = canvas.to_image();
        // Mask above the frame, clear in the middle of the frame
        assert_eq!(image.get_pixel(200, 10).0[3], 0x60);
        assert_eq!(image.get_pixel(200, 300).0[3], 0);
    }

    #[test]
    fn test_result_bitmap_opacity_ignores_point_style() {
        let now = Instant::now();
        let style = ViewfinderStyle {
            point_opacity: 0x40,
            ..ViewfinderStyle::default()
        };
        let mut overlay = ViewfinderOverlay::new(style, Arc::new(ResultPointTracker::new()), now);
        overlay.set_bounds(400, 800);
        overlay.draw_result_bitmap(RgbaImage::new(10, 10));

        let mut canvas = RecordingCanvas::default();
        overlay.paint(&mut canvas, now);

        assert_eq!(canvas.images, vec![0xA0]);
    }
}
