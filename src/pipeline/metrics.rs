// src/pipeline/metrics.rs
//
// Per-session counters. In-memory only; summarized to the log on exit.

use super::frame_context::FrameContext;
use crate::posture::PostureStatus;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub total_frames: u64,
    pub frames_with_body: u64,
    pub invalid_landmark_sets: u64,
    pub detection_failures: u64,
    pub status_transitions: u64,
    status_frames: [u64; PostureStatus::ALL.len()],
    last_status: Option<PostureStatus>,
    correct_since: Option<Instant>,
    longest_correct: Duration,
    started_at: Instant,
}

impl SessionMetrics {
    pub fn new(started_at: Instant) -> Self {
        Self {
            total_frames: 0,
            frames_with_body: 0,
            invalid_landmark_sets: 0,
            detection_failures: 0,
            status_transitions: 0,
            status_frames: [0; PostureStatus::ALL.len()],
            last_status: None,
            correct_since: None,
            longest_correct: Duration::ZERO,
            started_at,
        }
    }

    pub fn record(&mut self, ctx: &FrameContext) {
        self.total_frames += 1;
        if ctx.landmarks.is_some() {
            self.frames_with_body += 1;
        }
        if ctx.invalid_landmarks {
            self.invalid_landmark_sets += 1;
        }
        if ctx.detection_failed {
            self.detection_failures += 1;
        }

        let status = ctx.status;
        self.status_frames[status_slot(status)] += 1;

        if self.last_status.is_some_and(|last| last != status) {
            self.status_transitions += 1;
        }
        self.last_status = Some(status);

        if status == PostureStatus::Correct {
            let since = *self.correct_since.get_or_insert(ctx.captured_at);
            let streak = ctx.captured_at.saturating_duration_since(since);
            self.longest_correct = self.longest_correct.max(streak);
        } else {
            self.correct_since = None;
        }
    }

    pub fn frames_with(&self, status: PostureStatus) -> u64 {
        self.status_frames[status_slot(status)]
    }

    pub fn fps(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self, now: Instant) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            frames_with_body: self.frames_with_body,
            invalid_landmark_sets: self.invalid_landmark_sets,
            detection_failures: self.detection_failures,
            status_transitions: self.status_transitions,
            frames_by_status: PostureStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), self.frames_with(*s)))
                .collect(),
            longest_correct_secs: self.longest_correct.as_secs_f64(),
            fps: self.fps(now),
            elapsed_secs: now.saturating_duration_since(self.started_at).as_secs_f64(),
        }
    }
}

fn status_slot(status: PostureStatus) -> usize {
    PostureStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(0)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_body: u64,
    pub invalid_landmark_sets: u64,
    pub detection_failures: u64,
    pub status_transitions: u64,
    pub frames_by_status: BTreeMap<String, u64>,
    pub longest_correct_secs: f64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
