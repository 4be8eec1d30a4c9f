// SPDX-License-Identifier: GPL-3.0-only

//! Luminance extraction from planar YUV frames
//!
//! Copies the Y, U and V planes of a frame into one contiguous buffer in
//! that order. Decoders only look at the leading Y plane; the chroma bytes
//! are kept so the buffer matches the full planar layout.

use crate::app::frame_processor::types::LuminanceImage;
use crate::backends::camera::types::PixelFrame;
use crate::errors::FrameError;
use tracing::trace;

/// Build a [`LuminanceImage`] from the first three planes of a frame
pub fn extract_luminance(frame: &PixelFrame) -> Result<LuminanceImage, FrameError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(FrameError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        });
    }

    let [y_plane, u_plane, v_plane, ..] = frame.planes() else {
        return Err(FrameError::MissingPlanes {
            found: frame.planes().len(),
        });
    };

    let y_size = y_plane.remaining();
    let u_size = u_plane.remaining();
    let v_size = v_plane.remaining();

    let mut yuv = Vec::with_capacity(y_size + u_size + v_size);
    yuv.extend_from_slice(&y_plane.as_slice()[..y_size]);
    yuv.extend_from_slice(&u_plane.as_slice()[..u_size]);
    yuv.extend_from_slice(&v_plane.as_slice()[..v_size]);

    trace!(
        width = frame.width,
        height = frame.height,
        rotation = frame.rotation.degrees(),
        y_size,
        u_size,
        v_size,
        "Extracted luminance buffer"
    );

    // A zero stride means the backend packed rows tightly
    let row_stride = match y_plane.row_stride {
        0 => frame.width as usize,
        stride => stride,
    };

    Ok(LuminanceImage::new(
        yuv,
        frame.width,
        frame.height,
        row_stride,
        y_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{Plane, SensorRotation};

    fn yuv_frame(width: u32, height: u32, y: Vec<u8>, u: Vec<u8>, v: Vec<u8>) -> PixelFrame {
        let chroma_stride = (width as usize).div_ceil(2);
        PixelFrame::new(
            width,
            height,
            SensorRotation::None,
            vec![
                Plane::packed(y, width as usize),
                Plane::packed(u, chroma_stride),
                Plane::packed(v, chroma_stride),
            ],
        )
    }

    #[test]
    fn test_planes_are_concatenated_in_order() {
        let y: Vec<u8> = (0..16).collect();
        let frame = yuv_frame(4, 4, y.clone(), vec![100; 4], vec![200; 4]);

        let image = extract_luminance(&frame).unwrap();
        assert_eq!(image.len(), 16 + 4 + 4);
        assert_eq!(&image.as_bytes()[..16], y.as_slice());
        assert_eq!(&image.as_bytes()[16..20], &[100; 4]);
        assert_eq!(&image.as_bytes()[20..24], &[200; 4]);
        assert_eq!(image.luma_len, 16);
    }

    #[test]
    fn test_padded_planes_keep_all_remaining_bytes() {
        // Backends may hand out planes longer than the visible rows
        let frame = yuv_frame(2, 2, vec![1; 6], vec![2; 3], vec![3; 1]);
        let image = extract_luminance(&frame).unwrap();
        assert_eq!(image.len(), 10);
    }

    #[test]
    fn test_missing_planes_is_error() {
        let frame = PixelFrame::new(
            2,
            2,
            SensorRotation::None,
            vec![Plane::packed(vec![0u8; 4], 2)],
        );
        assert_eq!(
            extract_luminance(&frame).unwrap_err(),
            FrameError::MissingPlanes { found: 1 }
        );
    }

    #[test]
    fn test_zero_dimension_is_error() {
        let frame = yuv_frame(0, 4, vec![], vec![], vec![]);
        assert!(matches!(
            extract_luminance(&frame),
            Err(FrameError::InvalidDimensions { .. })
        ));
    }
}
