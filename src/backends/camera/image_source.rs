// SPDX-License-Identifier: GPL-3.0-only
//! Still-image frame source
//!
//! Stands in for a camera: decoded images are converted to planar I420
//! (full-resolution Y, quarter-resolution U and V) using BT.601
//! coefficients and replayed as [`PixelFrame`]s.

use super::frame_loop::{CaptureLoopController, FrameSubmitter, LoopAction};
use super::types::{PixelFrame, Plane, SensorRotation};
use crate::errors::{AppError, AppResult};
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// BT.601 luma for one RGB sample
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Convert RGBA to tightly packed I420 planes (Y, U, V)
///
/// Chroma is averaged over each 2x2 block; odd edges round up.
pub fn rgba_to_i420(image: &RgbaImage) -> [Vec<u8>; 3] {
    let (w, h) = image.dimensions();
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));

    let y_plane = image
        .pixels()
        .map(|p| luma(p[0], p[1], p[2]))
        .collect::<Vec<u8>>();

    let mut u_plane = Vec::with_capacity((cw * ch) as usize);
    let mut v_plane = Vec::with_capacity((cw * ch) as usize);
    for cy in 0..ch {
        for cx in 0..cw {
            let (mut r, mut g, mut b, mut n) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
            for y in (cy * 2)..(cy * 2 + 2).min(h) {
                for x in (cx * 2)..(cx * 2 + 2).min(w) {
                    let p = image.get_pixel(x, y);
                    r += p[0] as f32;
                    g += p[1] as f32;
                    b += p[2] as f32;
                    n += 1.0;
                }
            }
            let (r, g, b) = (r / n, g / n, b / n);
            let u = -0.169 * r - 0.331 * g + 0.5 * b + 128.0;
            let v = 0.5 * r - 0.419 * g - 0.081 * b + 128.0;
            u_plane.push(u.round().clamp(0.0, 255.0) as u8);
            v_plane.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }

    [y_plane, u_plane, v_plane]
}

/// Build a three-plane I420 frame from an image
pub fn frame_from_image(image: &DynamicImage, rotation: SensorRotation) -> PixelFrame {
    let rgba = image.to_rgba8();
    let (w, h) = rgba.dimensions();
    let chroma_stride = w.div_ceil(2) as usize;
    let [y, u, v] = rgba_to_i420(&rgba);

    PixelFrame::new(
        w,
        h,
        rotation,
        vec![
            Plane::packed(y, w as usize),
            Plane::packed(u, chroma_stride),
            Plane::packed(v, chroma_stride),
        ],
    )
}

/// One still image, converted to I420 once at load time
struct SourceImage {
    path: PathBuf,
    rgba: RgbaImage,
    planes: [Arc<[u8]>; 3],
}

impl SourceImage {
    fn new(path: PathBuf, image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let [y, u, v] = rgba_to_i420(&rgba);
        Self {
            path,
            rgba,
            planes: [y.into(), u.into(), v.into()],
        }
    }
}

/// Presents a set of still images as a camera pointed at one of them
///
/// Clones share the image set, the selected image and the release counter,
/// so a capture thread and the UI can hold one each.
#[derive(Clone)]
pub struct ImageSource {
    images: Arc<[SourceImage]>,
    selected: Arc<AtomicUsize>,
    outstanding: Arc<AtomicUsize>,
}

impl ImageSource {
    /// Load every image up front so decode errors surface immediately
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> AppResult<Self> {
        if paths.is_empty() {
            return Err(AppError::Other("no input images".into()));
        }
        let images = paths
            .iter()
            .map(|p| {
                let path = p.as_ref().to_path_buf();
                let image = image::open(&path)
                    .map_err(|e| AppError::Image(format!("{}: {}", path.display(), e)))?;
                debug!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "Loaded image"
                );
                Ok((path, image))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self::from_images(images))
    }

    pub fn from_images(images: Vec<(PathBuf, DynamicImage)>) -> Self {
        let images = images
            .into_iter()
            .map(|(path, image)| SourceImage::new(path, &image))
            .collect::<Vec<_>>();
        Self {
            images: images.into(),
            selected: Arc::new(AtomicUsize::new(0)),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn selected(&self) -> Option<&SourceImage> {
        self.images.get(self.selected.load(Ordering::Relaxed))
    }

    /// Path of the image currently in front of the "camera"
    pub fn current_path(&self) -> Option<&Path> {
        self.selected().map(|image| image.path.as_path())
    }

    /// RGBA pixels of the current image, for display
    pub fn current_image(&self) -> Option<&RgbaImage> {
        self.selected().map(|image| &image.rgba)
    }

    /// Switch to the next image, wrapping at the end
    pub fn advance(&self) {
        if self.images.is_empty() {
            return;
        }
        let next = (self.selected.load(Ordering::Relaxed) + 1) % self.images.len();
        self.selected.store(next, Ordering::Relaxed);
    }

    /// Frames handed out and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Capture one frame of the current image
    pub fn next_frame(&self) -> Option<PixelFrame> {
        let image = self.selected()?;
        let (w, h) = image.rgba.dimensions();
        let chroma_stride = w.div_ceil(2) as usize;
        let [y, u, v] = image.planes.clone();

        let outstanding = Arc::clone(&self.outstanding);
        outstanding.fetch_add(1, Ordering::SeqCst);
        let frame = PixelFrame::new(
            w,
            h,
            SensorRotation::None,
            vec![
                Plane::packed(y, w as usize),
                Plane::packed(u, chroma_stride),
                Plane::packed(v, chroma_stride),
            ],
        );
        Some(frame.on_release(move || {
            outstanding.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    /// Feed frames to `submitter` at a fixed interval on a capture thread
    pub fn start_loop(
        &self,
        submitter: FrameSubmitter,
        interval: Duration,
    ) -> CaptureLoopController {
        info!(images = self.images.len(), ?interval, "Starting image source");
        let source = self.clone();
        CaptureLoopController::start("image-source", move || {
            let Some(frame) = source.next_frame() else {
                return LoopAction::Stop;
            };
            if !submitter.submit(frame) {
                return LoopAction::Stop;
            }
            std::thread::sleep(interval);
            LoopAction::Continue
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_i420_plane_sizes() {
        let image = RgbaImage::from_pixel(5, 3, Rgba([255, 255, 255, 255]));
        let [y, u, v] = rgba_to_i420(&image);

        assert_eq!(y.len(), 15);
        assert_eq!(u.len(), 6);
        assert_eq!(v.len(), 6);
        assert!(y.iter().all(|&l| l == 255));
        assert!(u.iter().all(|&c| (127..=129).contains(&c)));
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_source_tracks_release() {
        let source = ImageSource::from_images(vec![
            (PathBuf::from("a.png"), DynamicImage::ImageRgba8(RgbaImage::new(4, 4))),
            (PathBuf::from("b.png"), DynamicImage::ImageRgba8(RgbaImage::new(6, 2))),
        ]);

        let first = source.next_frame().unwrap();
        let second = source.clone().next_frame().unwrap();
        assert_eq!(source.outstanding(), 2);
        assert_eq!(first.planes().len(), 3);
        assert_eq!(first.planes()[1].row_stride, 2);

        first.release();
        drop(second);
        assert_eq!(source.outstanding(), 0);
    }

    #[test]
    fn test_advance_wraps_and_is_shared() {
        let source = ImageSource::from_images(vec![
            (PathBuf::from("a.png"), DynamicImage::ImageRgba8(RgbaImage::new(4, 4))),
            (PathBuf::from("b.png"), DynamicImage::ImageRgba8(RgbaImage::new(6, 2))),
        ]);
        let capture = source.clone();

        source.advance();
        assert_eq!(capture.current_path(), Some(Path::new("b.png")));
        assert_eq!(capture.next_frame().unwrap().width, 6);

        source.advance();
        assert_eq!(capture.current_path(), Some(Path::new("a.png")));
    }

    #[test]
    fn test_open_without_paths_fails() {
        let paths: [&str; 0] = [];
        assert!(ImageSource::open(&paths).is_err());
    }
}
