// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanning core

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed pixel frame
    Frame(FrameError),
    /// Decoder failure surfaced outside the analysis gate
    Decode(DecodeError),
    /// Configuration errors
    Config(String),
    /// Image loading or encoding errors
    Image(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Pixel frame contract violations detected while extracting luminance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Planar YUV needs Y, U and V planes
    MissingPlanes { found: usize },
}

/// Decoder failures
///
/// All of these are absorbed by the analysis gate and turned into
/// [`DecodeOutcome::NoResult`](crate::app::frame_processor::DecodeOutcome).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No barcode in the image (the common case)
    NotFound,
    /// A symbol was located but its error correction failed
    Checksum,
    /// A symbol was located but its content could not be parsed
    Format(String),
    /// Frame data is shorter than its declared geometry
    OutOfBounds { needed: usize, available: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Image(msg) => write!(f, "Image error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {}x{}", width, height)
            }
            FrameError::MissingPlanes { found } => {
                write!(f, "Expected 3 YUV planes, found {}", found)
            }
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotFound => write!(f, "No barcode found"),
            DecodeError::Checksum => write!(f, "Barcode checksum failed"),
            DecodeError::Format(msg) => write!(f, "Barcode format error: {}", msg),
            DecodeError::OutOfBounds { needed, available } => write!(
                f,
                "Frame data out of bounds: needed {} bytes, have {}",
                needed, available
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}
impl std::error::Error for DecodeError {}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
