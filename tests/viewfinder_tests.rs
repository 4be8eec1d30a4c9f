// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the viewfinder overlay, rendered in software

use codescan::app::frame_processor::ResultPoint;
use codescan::app::viewfinder::animator::laser_alpha;
use codescan::app::viewfinder::canvas::PixelCanvas;
use codescan::app::viewfinder::points::ResultPointTracker;
use codescan::app::viewfinder::{FramingRect, Invalidation, ViewfinderOverlay, ViewfinderStyle};
use codescan::constants::{ANIMATION_DELAY, LASER_PERIOD};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Instant;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn white_canvas() -> PixelCanvas {
    PixelCanvas::from_image(RgbaImage::from_pixel(400, 800, WHITE)).unwrap()
}

fn overlay(tracker: Arc<ResultPointTracker>, start: Instant) -> ViewfinderOverlay {
    let mut overlay = ViewfinderOverlay::new(ViewfinderStyle::default(), tracker, start);
    overlay.set_bounds(400, 800);
    overlay
}

#[test]
fn test_framing_rect_for_portrait_view() {
    assert_eq!(
        FramingRect::for_bounds(400, 800),
        FramingRect {
            left: 50,
            top: 250,
            right: 350,
            bottom: 550,
        }
    );
}

#[test]
fn test_laser_alpha_peaks_mid_cycle() {
    assert_eq!(laser_alpha(0.0), 0);
    assert_eq!(laser_alpha(0.5), 255);
    assert!(laser_alpha(0.25) > 170 && laser_alpha(0.25) < 190);
}

#[test]
fn test_paint_mask_frame_and_laser() {
    let start = Instant::now();
    let mut overlay = overlay(Arc::new(ResultPointTracker::new()), start);
    let mut canvas = white_canvas();

    overlay.paint(&mut canvas, start + LASER_PERIOD / 2);
    let image = canvas.into_image();

    // Outside the framing rect is dimmed by the translucent black mask
    let masked = image.get_pixel(10, 10);
    assert!((158..=160).contains(&masked[0]), "mask pixel {:?}", masked);

    // Inside the framing rect, away from the laser, is untouched
    assert_eq!(*image.get_pixel(200, 300), WHITE);

    // Phase 0.5: laser fully opaque, halfway down the travel
    assert_eq!(*image.get_pixel(200, 395), Rgba([204, 0, 0, 255]));

    assert_eq!(
        overlay.take_invalidation(),
        Some(Invalidation::Region {
            rect: overlay.framing_rect(),
            delay: ANIMATION_DELAY,
        })
    );
}

#[test]
fn test_candidate_points_are_scaled_into_frame() {
    let start = Instant::now();
    let tracker = Arc::new(ResultPointTracker::new());
    let mut overlay = overlay(Arc::clone(&tracker), start);
    overlay.stop_scan(start);

    // A 300x300 image maps 1:1 onto the 300x300 framing rect
    tracker.set_image_size(300, 300);
    tracker.add_point(ResultPoint::new(150.0, 150.0));

    let mut canvas = white_canvas();
    overlay.paint(&mut canvas, start);
    let image = canvas.into_image();

    let point = image.get_pixel(200, 400);
    assert_ne!(*point, WHITE);
    assert!(point[2] < 200, "point pixel {:?}", point);
    assert_eq!(tracker.pending(), 0);
}

#[test]
fn test_result_bitmap_stops_animation_requests() {
    let start = Instant::now();
    let mut overlay = overlay(Arc::new(ResultPointTracker::new()), start);
    overlay.stop_scan(start);
    overlay.draw_result_bitmap(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255])));
    assert_eq!(overlay.take_invalidation(), Some(Invalidation::Full));

    let mut canvas = white_canvas();
    overlay.paint(&mut canvas, start);
    let image = canvas.into_image();

    // Result image is blended into the framing rect
    let inside = image.get_pixel(200, 400);
    assert!(inside[2] > inside[0], "result pixel {:?}", inside);
    assert_eq!(overlay.take_invalidation(), None);
}
