// SPDX-License-Identifier: MPL-2.0

//! Backend layer: frame capture and user feedback
//!
//! - [`camera`]: frame types, the image-backed frame source and the analysis executor
//! - [`feedback`]: beep/vibrate acknowledgement of a successful scan

pub mod camera;
pub mod feedback;
