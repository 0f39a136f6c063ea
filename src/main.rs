// src/main.rs

mod camera;
mod config;
mod display;
mod error;
mod landmarks;
mod overlay;
mod pipeline;
mod pose_detection;
mod posture;
mod preprocessing;
mod types;

use anyhow::{Context, Result};
use camera::Camera;
use display::Display;
use pipeline::{FrameContext, MetricsSummary, SessionMetrics};
use pose_detection::PoseDetector;
use posture::{PostureEvaluator, PostureStatus, PostureThresholds};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;

fn main() -> Result<()> {
    let config = Config::load_or_default(config::DEFAULT_CONFIG_PATH)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "posture_detection={},ort=warn",
            config.logging.level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🧍 Posture Detection Starting");
    if std::path::Path::new(config::DEFAULT_CONFIG_PATH).exists() {
        info!("✓ Configuration loaded from {}", config::DEFAULT_CONFIG_PATH);
    } else {
        info!("✓ Using built-in configuration");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Ctrl-C handler not installed: {}", e);
    }

    match run_session(&config, &running) {
        Ok(summary) => {
            log_summary(&summary);
            info!("👋 Session ended");
            Ok(())
        }
        Err(e) => {
            error!("Session aborted: {:#}", e);
            Err(e)
        }
    }
}

/// Capture → detect → evaluate → render until the quit key, Ctrl-C, or a
/// capture failure. Camera and window are released when this returns.
fn run_session(config: &Config, running: &AtomicBool) -> Result<MetricsSummary> {
    let mut camera = Camera::open(config.camera.device_index)?;
    let mut detector = PoseDetector::new(&config.model)?;
    let display = Display::open(&config.display.window_title)?;
    info!("✓ Window '{}' ready (press 'q' to quit)", config.display.window_title);

    let thresholds = PostureThresholds::from(&config.posture);
    let mut evaluator = PostureEvaluator::new(thresholds, Instant::now());
    info!(
        "Posture thresholds: shoulder tolerance={:.3}, hold={:.1}s",
        evaluator.thresholds().shoulder_level_tolerance,
        evaluator.thresholds().hold_duration.as_secs_f64()
    );

    let mut metrics = SessionMetrics::new(Instant::now());
    let mut frame_id: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let mut frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log_summary(&metrics.summary(Instant::now()));
                return Err(e).context("Camera stopped delivering frames");
            }
        };
        frame_id += 1;

        let mut ctx = FrameContext::new(frame_id, frame.captured_at);

        match detector.detect(&frame.rgb, frame.width, frame.height) {
            Ok(landmarks) => ctx.landmarks = landmarks,
            Err(e) => {
                debug!("Pose detection failed on frame {}: {}", frame_id, e);
                ctx.detection_failed = true;
            }
        }

        ctx.status = match evaluator.try_update(ctx.landmarks.as_ref(), ctx.captured_at) {
            Ok(status) => status,
            Err(e) => {
                debug!("Frame {}: {}", frame_id, e);
                ctx.invalid_landmarks = true;
                PostureStatus::NoDetection
            }
        };

        if config.display.draw_skeleton {
            if let Some(landmarks) = &ctx.landmarks {
                overlay::draw_skeleton(&mut frame.image, landmarks)?;
            }
        }
        overlay::draw_status(&mut frame.image, ctx.status)?;
        display.show(&frame.image)?;

        metrics.record(&ctx);

        if frame_id % 150 == 0 {
            debug!(
                "Frame {} | Status: {} | Good posture for {:.1}s | {:.1} FPS",
                ctx.frame_id,
                ctx.status,
                evaluator
                    .state()
                    .elapsed(ctx.captured_at)
                    .as_secs_f64(),
                metrics.fps(ctx.captured_at)
            );
        }

        if display.should_quit()? {
            info!("Quit key pressed");
            break;
        }
    }

    if !running.load(Ordering::SeqCst) {
        info!("Interrupted, shutting down");
    }

    Ok(metrics.summary(Instant::now()))
}

fn log_summary(summary: &MetricsSummary) {
    info!("\n========================================");
    info!("  Frames: {}", summary.total_frames);
    info!(
        "  Frames with body: {} ({:.1}%)",
        summary.frames_with_body,
        100.0 * summary.frames_with_body as f64 / summary.total_frames.max(1) as f64
    );
    info!("  Posture changes: {}", summary.status_transitions);
    info!(
        "  ✅ Longest correct streak: {:.1}s",
        summary.longest_correct_secs
    );
    if summary.invalid_landmark_sets > 0 || summary.detection_failures > 0 {
        warn!(
            "  ⚠️  Skipped frames: {} invalid landmark sets, {} detection failures",
            summary.invalid_landmark_sets, summary.detection_failures
        );
    }
    info!("  Processing Speed: {:.1} FPS", summary.fps);
    match serde_json::to_string(summary) {
        Ok(json) => info!("  Metrics: {}", json),
        Err(e) => debug!("Could not serialize metrics: {}", e),
    }
    info!("========================================");
}
