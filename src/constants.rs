// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Delay before the viewfinder repaints its framing region again
pub const ANIMATION_DELAY: Duration = Duration::from_millis(15);

/// One full sweep of the laser line from top to bottom
pub const LASER_PERIOD: Duration = Duration::from_millis(2000);

/// Opacity for the newest candidate points
pub const CURRENT_POINT_OPACITY: u8 = 0xA0;

/// Opacity of the decoded result image drawn into the framing rectangle
pub const RESULT_BITMAP_OPACITY: u8 = 0xA0;

/// Candidate point buffer capacity before it is trimmed back to half
pub const MAX_RESULT_POINTS: usize = 20;

/// Radius of a freshly observed candidate point (pixels)
pub const POINT_SIZE: f32 = 6.0;

/// Horizontal inset of the laser bar and the travel reserved at the bottom
pub const LASER_INSET: i32 = 10;

/// Height of the laser bar (pixels)
pub const LASER_HEIGHT: i32 = 2;

/// Framing rectangle side as a fraction (numerator, denominator) of the overlay
pub const FRAMING_RATIO: (i32, i32) = (3, 4);

/// Default longest side the decoder works on; larger frames are subsampled
pub const DEFAULT_DECODE_MAX_DIMENSION: u32 = 640;

/// Frame interval of the still-image capture source (~30 fps)
pub const CAPTURE_INTERVAL: Duration = Duration::from_millis(33);

/// Application directory name under the user config dir
pub const APP_DIR_NAME: &str = "codescan";

/// Config file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";
