// SPDX-License-Identifier: MPL-2.0

//! Frame capture and hand-off to analysis
//!
//! ```text
//! ┌──────────────────────┐
//! │  ImageSource (loop)  │  ← produces PixelFrames on a capture thread
//! └──────────┬───────────┘
//!            │ FrameSubmitter::submit (keep-latest)
//!            ▼
//! ┌──────────────────────┐
//! │   AnalysisExecutor   │  ← single analysis thread
//! └──────────────────────┘
//! ```

pub mod frame_loop;
pub mod image_source;
pub mod types;

pub use frame_loop::{AnalysisExecutor, CaptureLoopController, FrameSubmitter, LoopAction};
pub use image_source::{ImageSource, frame_from_image};
pub use types::*;
