// SPDX-License-Identifier: MPL-2.0

//! Drawing surface for the viewfinder overlay
//!
//! The overlay only needs a handful of primitives, so it draws through the
//! small [`Canvas`] trait. [`PixelCanvas`] implements it with tiny-skia and
//! hands the result back as an `image::RgbaImage`, which is what the
//! terminal preview, the PNG snapshot command and the tests use.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, Mask, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// 8-bit RGBA color
///
/// Serialized as `#AARRGGBB` (or `#RRGGBB`, taken as opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::from_argb(0x0000_0000);
    pub const BLACK: Color = Color::from_argb(0xFF00_0000);
    pub const WHITE: Color = Color::from_argb(0xFFFF_FFFF);

    /// Build a color from a packed `0xAARRGGBB` value
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Same color with its alpha replaced
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#AARRGGBB` or `#RRGGBB`
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            8 => Some(Self::from_argb(value)),
            6 => Some(Self::from_argb(0xFF00_0000 | value)),
            _ => None,
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        format!("#{:08X}", color.to_argb())
    }
}

/// Axis-aligned rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

/// How a primitive is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    pub stroke_width: f32,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
            stroke_width: 0.0,
        }
    }

    pub fn stroke(color: Color, stroke_width: f32) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke,
            stroke_width,
        }
    }
}

/// Minimal drawing surface used by the viewfinder overlay
pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Fill or stroke a rectangle (strokes are centered on the edges)
    fn draw_rect(&mut self, rect: RectF, paint: &Paint);

    /// Draw a line segment `paint.stroke_width` wide with butt caps
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), paint: &Paint);

    /// Fill a circle
    fn draw_circle(&mut self, center: (f32, f32), radius: f32, paint: &Paint);

    /// Draw an image scaled into `dst` with an extra opacity multiplier
    fn draw_image(&mut self, image: &RgbaImage, dst: RectF, alpha: u8);
}

/// Software canvas backed by a tiny-skia pixmap
///
/// Rects, lines and images are drawn without anti-aliasing so edges land
/// on whole pixels; circles are anti-aliased.
#[derive(Clone)]
pub struct PixelCanvas {
    pixmap: Pixmap,
    clip: Option<Mask>,
}

impl PixelCanvas {
    /// Transparent canvas; `None` for an empty size
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            clip: None,
        })
    }

    /// Canvas that draws on top of an existing picture
    pub fn from_image(image: RgbaImage) -> Option<Self> {
        Some(Self {
            pixmap: pixmap_from_image(&image)?,
            clip: None,
        })
    }

    /// Restrict every later draw to `rect`
    pub fn clip_to(&mut self, rect: RectF) {
        let Some(path) = skia_rect(rect).map(PathBuilder::from_rect) else {
            return;
        };
        if let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) {
            mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
            self.clip = Some(mask);
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let color = src.demultiply();
            *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        }
        image
    }

    pub fn into_image(self) -> RgbaImage {
        self.to_image()
    }
}

fn pixmap_from_image(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let Rgba([r, g, b, a]) = *src;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn skia_rect(rect: RectF) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(rect.left, rect.top, rect.right, rect.bottom)
}

fn skia_paint(color: Color, anti_alias: bool) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = anti_alias;
    paint
}

fn butt_stroke(width: f32) -> Stroke {
    Stroke {
        width: width.max(1.0),
        line_cap: LineCap::Butt,
        ..Stroke::default()
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
        let Some(rect) = skia_rect(rect) else {
            return;
        };
        let skia = skia_paint(paint.color, false);
        match paint.style {
            PaintStyle::Fill => {
                self.pixmap
                    .fill_rect(rect, &skia, Transform::identity(), self.clip.as_ref());
            }
            PaintStyle::Stroke => {
                let path = PathBuilder::from_rect(rect);
                self.pixmap.stroke_path(
                    &path,
                    &skia,
                    &butt_stroke(paint.stroke_width),
                    Transform::identity(),
                    self.clip.as_ref(),
                );
            }
        }
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), paint: &Paint) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0, from.1);
        builder.line_to(to.0, to.1);
        let Some(path) = builder.finish() else {
            return;
        };
        self.pixmap.stroke_path(
            &path,
            &skia_paint(paint.color, false),
            &butt_stroke(paint.stroke_width),
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    fn draw_circle(&mut self, center: (f32, f32), radius: f32, paint: &Paint) {
        let Some(path) = PathBuilder::from_circle(center.0, center.1, radius) else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &skia_paint(paint.color, true),
            FillRule::Winding,
            Transform::identity(),
            self.clip.as_ref(),
        );
    }

    fn draw_image(&mut self, image: &RgbaImage, dst: RectF, alpha: u8) {
        if dst.is_empty() {
            return;
        }
        let Some(source) = pixmap_from_image(image) else {
            return;
        };
        let scale_x = dst.width() / source.width() as f32;
        let scale_y = dst.height() / source.height() as f32;
        let paint = PixmapPaint {
            opacity: alpha as f32 / 255.0,
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            Transform::from_row(scale_x, 0.0, 0.0, scale_y, dst.left, dst.top),
            self.clip.as_ref(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_round_trip() {
        let color = Color::parse_hex("#60000000").unwrap();
        assert_eq!(color.a, 0x60);
        assert_eq!(String::from(color), "#60000000");
        assert_eq!(Color::parse_hex("#FF0000"), Some(Color::from_argb(0xFFFF0000)));
        assert_eq!(Color::parse_hex("red"), None);
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        assert!(PixelCanvas::new(0, 10).is_none());
        assert!(PixelCanvas::from_image(RgbaImage::new(10, 0)).is_none());
    }

    #[test]
    fn test_fill_rect_covers_whole_pixels() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.draw_rect(RectF::new(2.0, 3.0, 5.0, 4.0), &Paint::fill(Color::WHITE));

        let image = canvas.to_image();
        assert_eq!(image.get_pixel(2, 3).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(4, 3).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(5, 3).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(2, 4).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_translucent_fill_over_black() {
        let mut canvas =
            PixelCanvas::from_image(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]))).unwrap();
        canvas.draw_rect(
            RectF::new(0.0, 0.0, 1.0, 1.0),
            &Paint::fill(Color::WHITE.with_alpha(128)),
        );
        let Rgba([r, _, _, a]) = *canvas.to_image().get_pixel(0, 0);
        assert!((127..=129).contains(&r), "blended red {}", r);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_drawing_outside_is_clipped() {
        let mut canvas = PixelCanvas::new(4, 4).unwrap();
        canvas.draw_rect(RectF::new(-10.0, -10.0, 20.0, 20.0), &Paint::fill(Color::BLACK));
        canvas.draw_circle((100.0, 100.0), 5.0, &Paint::fill(Color::BLACK));
        canvas.draw_line((-5.0, -5.0), (50.0, 30.0), &Paint::stroke(Color::BLACK, 2.0));
        assert_eq!(canvas.to_image().get_pixel(3, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_clip_limits_later_draws() {
        let mut canvas = PixelCanvas::new(10, 10).unwrap();
        canvas.clip_to(RectF::new(2.0, 2.0, 6.0, 6.0));
        canvas.draw_rect(RectF::new(0.0, 0.0, 10.0, 10.0), &Paint::fill(Color::WHITE));

        let image = canvas.to_image();
        assert_eq!(image.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(7, 4).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_image_is_scaled_into_destination() {
        let mut canvas = PixelCanvas::new(8, 8).unwrap();
        let source = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        canvas.draw_image(&source, RectF::new(2.0, 2.0, 6.0, 6.0), 255);

        let image = canvas.to_image();
        let inside = image.get_pixel(3, 3);
        assert!(inside[2] >= 250 && inside[0] == 0, "scaled pixel {:?}", inside);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(7, 7).0, [0, 0, 0, 0]);
    }
}
