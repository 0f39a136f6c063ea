// src/pipeline/frame_context.rs
//
// Everything known about one frame after detection and evaluation. The
// overlay and the metrics both read from it.

use crate::landmarks::LandmarkSet;
use crate::posture::PostureStatus;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_id: u64,
    pub captured_at: Instant,
    pub landmarks: Option<LandmarkSet>,
    pub status: PostureStatus,
    /// The pose model failed on this frame.
    pub detection_failed: bool,
    /// A body was reported but required landmarks were unusable.
    pub invalid_landmarks: bool,
}

impl FrameContext {
    pub fn new(frame_id: u64, captured_at: Instant) -> Self {
        Self {
            frame_id,
            captured_at,
            landmarks: None,
            status: PostureStatus::NoDetection,
            detection_failed: false,
            invalid_landmarks: false,
        }
    }
}
