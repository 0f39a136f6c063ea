// src/error.rs

use crate::landmarks::LandmarkKind;
use thiserror::Error;

/// Per-frame evaluation failure. Recoverable: the frame is treated as having
/// no detection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PostureError {
    #[error("invalid landmark set: {missing:?} is missing or not finite")]
    InvalidLandmarkSet { missing: LandmarkKind },
}

/// Capture device failure. Fatal to the session loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device {device} unavailable: {reason}")]
    Unavailable { device: i32, reason: String },
}
