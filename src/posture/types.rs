// src/posture/types.rs
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PostureStatus {
    /// No body (or no usable landmark set) this frame.
    NoDetection,
    ShouldersUneven,
    HeadTilted,
    /// Posture acceptable but not yet held long enough.
    Pending,
    Correct,
}

impl PostureStatus {
    pub const ALL: [PostureStatus; 5] = [
        PostureStatus::NoDetection,
        PostureStatus::ShouldersUneven,
        PostureStatus::HeadTilted,
        PostureStatus::Pending,
        PostureStatus::Correct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostureStatus::NoDetection => "NO_DETECTION",
            PostureStatus::ShouldersUneven => "SHOULDERS_UNEVEN",
            PostureStatus::HeadTilted => "HEAD_TILTED",
            PostureStatus::Pending => "PENDING",
            PostureStatus::Correct => "CORRECT",
        }
    }
}

impl fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timer carried across frames by the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorState {
    last_good_posture_start: Instant,
}

impl EvaluatorState {
    pub fn new(now: Instant) -> Self {
        Self {
            last_good_posture_start: now,
        }
    }

    pub fn last_good_posture_start(&self) -> Instant {
        self.last_good_posture_start
    }

    /// Restarts the hold timer. Never moves it backward.
    pub fn reset(&mut self, now: Instant) {
        if now > self.last_good_posture_start {
            self.last_good_posture_start = now;
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_good_posture_start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureThresholds {
    pub shoulder_level_tolerance: f32,
    pub hold_duration: Duration,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            shoulder_level_tolerance: 0.05,
            hold_duration: Duration::from_secs(5),
        }
    }
}

impl From<&crate::types::PostureConfig> for PostureThresholds {
    fn from(config: &crate::types::PostureConfig) -> Self {
        Self {
            shoulder_level_tolerance: config.shoulder_level_tolerance,
            hold_duration: config.hold_duration(),
        }
    }
}
