// src/overlay.rs

use crate::landmarks::{Landmark, LandmarkSet};
use crate::posture::PostureStatus;
use anyhow::Result;
use opencv::{core, imgproc, prelude::*};

const RED: [f64; 3] = [0.0, 0.0, 255.0];
const GREEN: [f64; 3] = [0.0, 255.0, 0.0];

const LANDMARK_COLOR: [f64; 3] = [0.0, 0.0, 255.0];
const CONNECTION_COLOR: [f64; 3] = [255.0, 255.0, 255.0];

/// Landmarks the model is less sure about than this are not drawn.
const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Text drawn for a status. Colors are BGR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusOverlay {
    pub text: &'static str,
    pub color: [f64; 3],
    pub origin: (i32, i32),
}

/// `Pending` and `NoDetection` show nothing.
pub fn status_overlay(status: PostureStatus) -> Option<StatusOverlay> {
    match status {
        PostureStatus::ShouldersUneven => Some(StatusOverlay {
            text: "Erro: Ombros em abducao!",
            color: RED,
            origin: (10, 30),
        }),
        PostureStatus::HeadTilted => Some(StatusOverlay {
            text: "Erro: Cabeca inclinada!",
            color: RED,
            origin: (10, 60),
        }),
        PostureStatus::Correct => Some(StatusOverlay {
            text: "Postura Correta!",
            color: GREEN,
            origin: (10, 30),
        }),
        PostureStatus::Pending | PostureStatus::NoDetection => None,
    }
}

fn drawable(lm: &Landmark) -> bool {
    lm.is_finite() && lm.visibility >= VISIBILITY_THRESHOLD
}

fn scalar(bgr: [f64; 3]) -> core::Scalar {
    core::Scalar::new(bgr[0], bgr[1], bgr[2], 0.0)
}

/// Normalized landmark → pixel position, clamped to the frame.
fn to_pixel(x: f32, y: f32, width: i32, height: i32) -> core::Point {
    let px = (x * width as f32).round() as i32;
    let py = (y * height as f32).round() as i32;
    core::Point::new(px.clamp(0, width - 1), py.clamp(0, height - 1))
}

pub fn draw_skeleton(frame: &mut Mat, landmarks: &LandmarkSet) -> Result<()> {
    let width = frame.cols();
    let height = frame.rows();
    if width <= 0 || height <= 0 {
        return Ok(());
    }

    for (a, b) in landmarks.connections() {
        if !drawable(a) || !drawable(b) {
            continue;
        }
        imgproc::line(
            frame,
            to_pixel(a.x, a.y, width, height),
            to_pixel(b.x, b.y, width, height),
            scalar(CONNECTION_COLOR),
            2,
            imgproc::LINE_AA,
            0,
        )?;
    }

    for lm in landmarks.iter().filter(|lm| drawable(lm)) {
        imgproc::circle(
            frame,
            to_pixel(lm.x, lm.y, width, height),
            3,
            scalar(LANDMARK_COLOR),
            -1,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}

pub fn draw_status(frame: &mut Mat, status: PostureStatus) -> Result<()> {
    let Some(overlay) = status_overlay(status) else {
        return Ok(());
    };

    imgproc::put_text(
        frame,
        overlay.text,
        core::Point::new(overlay.origin.0, overlay.origin.1),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.8,
        scalar(overlay.color),
        2,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_red() {
        let shoulders = status_overlay(PostureStatus::ShouldersUneven).unwrap();
        assert_eq!(shoulders.text, "Erro: Ombros em abducao!");
        assert_eq!(shoulders.color, RED);
        assert_eq!(shoulders.origin, (10, 30));

        let head = status_overlay(PostureStatus::HeadTilted).unwrap();
        assert_eq!(head.text, "Erro: Cabeca inclinada!");
        assert_eq!(head.color, RED);
        assert_eq!(head.origin, (10, 60));
    }

    #[test]
    fn test_correct_is_green() {
        let correct = status_overlay(PostureStatus::Correct).unwrap();
        assert_eq!(correct.text, "Postura Correta!");
        assert_eq!(correct.color, GREEN);
    }

    #[test]
    fn test_silent_statuses() {
        assert!(status_overlay(PostureStatus::Pending).is_none());
        assert!(status_overlay(PostureStatus::NoDetection).is_none());
    }

    #[test]
    fn test_low_visibility_not_drawn() {
        let mut lm = Landmark::new(0.5, 0.5);
        assert!(drawable(&lm));
        lm.visibility = 0.2;
        assert!(!drawable(&lm));
        assert!(!drawable(&Landmark::new(f32::NAN, 0.5)));
    }

    #[test]
    fn test_to_pixel_clamps() {
        assert_eq!(to_pixel(0.5, 0.5, 640, 480), core::Point::new(320, 240));
        assert_eq!(to_pixel(1.2, -0.1, 640, 480), core::Point::new(639, 0));
    }
}
