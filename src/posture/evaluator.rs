// src/posture/evaluator.rs
//
// Per-frame posture rule:
//   shoulders level  := |left.y - right.y| < tolerance
//   head straight    := nose.y < left.y && nose.y < right.y
// Uneven shoulders win over a tilted head. Either one restarts the hold
// timer; good posture becomes CORRECT only once held strictly longer than
// the hold duration.

use super::types::{EvaluatorState, PostureStatus, PostureThresholds};
use crate::error::PostureError;
use crate::landmarks::{Landmark, LandmarkKind, LandmarkSet};
use std::time::Instant;
use tracing::info;

/// Evaluates one frame. `None` landmarks yield `NoDetection` and leave the
/// timer alone; so does an invalid set, which is reported as an error.
pub fn evaluate(
    landmarks: Option<&LandmarkSet>,
    now: Instant,
    state: &mut EvaluatorState,
    thresholds: &PostureThresholds,
) -> Result<PostureStatus, PostureError> {
    let Some(landmarks) = landmarks else {
        return Ok(PostureStatus::NoDetection);
    };

    let left_shoulder = required(landmarks, LandmarkKind::LeftShoulder)?;
    let right_shoulder = required(landmarks, LandmarkKind::RightShoulder)?;
    let nose = required(landmarks, LandmarkKind::Nose)?;

    let shoulder_diff = (left_shoulder.y - right_shoulder.y).abs();
    let shoulders_level = shoulder_diff < thresholds.shoulder_level_tolerance;
    let head_straight = nose.y < left_shoulder.y && nose.y < right_shoulder.y;

    let status = if !shoulders_level {
        state.reset(now);
        PostureStatus::ShouldersUneven
    } else if !head_straight {
        state.reset(now);
        PostureStatus::HeadTilted
    } else if state.elapsed(now) > thresholds.hold_duration {
        PostureStatus::Correct
    } else {
        PostureStatus::Pending
    };

    Ok(status)
}

fn required(landmarks: &LandmarkSet, kind: LandmarkKind) -> Result<&Landmark, PostureError> {
    landmarks
        .get(kind)
        .filter(|lm| lm.is_finite())
        .ok_or(PostureError::InvalidLandmarkSet { missing: kind })
}

/// Owns the thresholds and timer for one session and logs status changes.
pub struct PostureEvaluator {
    thresholds: PostureThresholds,
    state: EvaluatorState,
    last_status: Option<PostureStatus>,
}

impl PostureEvaluator {
    pub fn new(thresholds: PostureThresholds, now: Instant) -> Self {
        Self {
            thresholds,
            state: EvaluatorState::new(now),
            last_status: None,
        }
    }

    /// Evaluates one frame. An invalid landmark set is returned as an error
    /// for the caller to skip, and counts as `NoDetection` for transitions.
    pub fn try_update(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        now: Instant,
    ) -> Result<PostureStatus, PostureError> {
        let result = evaluate(landmarks, now, &mut self.state, &self.thresholds);
        let status = result.as_ref().copied().unwrap_or(PostureStatus::NoDetection);

        if self.last_status != Some(status) {
            info!(
                "Posture: {} → {}",
                self.last_status.map(|s| s.as_str()).unwrap_or("START"),
                status
            );
            self.last_status = Some(status);
        }

        result
    }

    pub fn state(&self) -> &EvaluatorState {
        &self.state
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    pub fn last_status(&self) -> Option<PostureStatus> {
        self.last_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::NUM_LANDMARKS;
    use proptest::prelude::*;
    use std::time::Duration;

    fn pose(nose_y: f32, left_y: f32, right_y: f32) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5); NUM_LANDMARKS];
        points[LandmarkKind::Nose.index()] = Landmark::new(0.5, nose_y);
        points[LandmarkKind::LeftShoulder.index()] = Landmark::new(0.65, left_y);
        points[LandmarkKind::RightShoulder.index()] = Landmark::new(0.35, right_y);
        LandmarkSet::from_points(points)
    }

    fn good() -> LandmarkSet {
        pose(0.3, 0.6, 0.61)
    }

    fn uneven() -> LandmarkSet {
        pose(0.3, 0.6, 0.7)
    }

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    fn eval(set: Option<&LandmarkSet>, now: Instant, state: &mut EvaluatorState) -> PostureStatus {
        evaluate(set, now, state, &PostureThresholds::default()).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);

        assert_eq!(eval(Some(&uneven()), t0, &mut state), PostureStatus::ShouldersUneven);
        assert_eq!(eval(Some(&good()), at(t0, 0.1), &mut state), PostureStatus::Pending);
        assert_eq!(eval(Some(&good()), at(t0, 5.05), &mut state), PostureStatus::Correct);
    }

    #[test]
    fn test_shoulder_diff_at_tolerance_is_uneven() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        // 0.25 and 0.75 are exact in binary, so the diff is exactly 0.5
        let thresholds = PostureThresholds {
            shoulder_level_tolerance: 0.5,
            ..Default::default()
        };
        let set = pose(0.1, 0.25, 0.75);
        assert_eq!(
            evaluate(Some(&set), t0, &mut state, &thresholds).unwrap(),
            PostureStatus::ShouldersUneven
        );

        let set = pose(0.1, 0.55, 0.6);
        let status = evaluate(Some(&set), t0, &mut state, &PostureThresholds::default()).unwrap();
        assert_eq!(status, PostureStatus::ShouldersUneven);
    }

    #[test]
    fn test_shoulders_take_precedence_over_head() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        // Uneven shoulders and nose below both shoulders
        let set = pose(0.9, 0.5, 0.7);
        assert_eq!(eval(Some(&set), t0, &mut state), PostureStatus::ShouldersUneven);
    }

    #[test]
    fn test_head_level_with_shoulder_is_tilted() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        let set = pose(0.6, 0.6, 0.62);
        assert_eq!(eval(Some(&set), t0, &mut state), PostureStatus::HeadTilted);
    }

    #[test]
    fn test_exactly_hold_duration_is_still_pending() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        assert_eq!(eval(Some(&good()), at(t0, 5.0), &mut state), PostureStatus::Pending);
        assert_eq!(eval(Some(&good()), at(t0, 5.001), &mut state), PostureStatus::Correct);
    }

    #[test]
    fn test_single_bad_frame_restarts_timer() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);

        assert_eq!(eval(Some(&good()), at(t0, 4.9), &mut state), PostureStatus::Pending);
        assert_eq!(
            eval(Some(&uneven()), at(t0, 4.95), &mut state),
            PostureStatus::ShouldersUneven
        );
        assert_eq!(eval(Some(&good()), at(t0, 5.5), &mut state), PostureStatus::Pending);
        assert_eq!(eval(Some(&good()), at(t0, 9.9), &mut state), PostureStatus::Pending);
        assert_eq!(eval(Some(&good()), at(t0, 9.96), &mut state), PostureStatus::Correct);
    }

    #[test]
    fn test_correct_persists_until_interrupted() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        for i in 51..120 {
            let now = at(t0, i as f64 * 0.1);
            assert_eq!(eval(Some(&good()), now, &mut state), PostureStatus::Correct);
        }
        let tilted = pose(0.7, 0.6, 0.6);
        assert_eq!(eval(Some(&tilted), at(t0, 12.0), &mut state), PostureStatus::HeadTilted);
        assert_eq!(eval(Some(&good()), at(t0, 12.1), &mut state), PostureStatus::Pending);
    }

    #[test]
    fn test_no_detection_leaves_timer_untouched() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        assert_eq!(eval(None, at(t0, 3.0), &mut state), PostureStatus::NoDetection);
        assert_eq!(state.last_good_posture_start(), t0);
        // Detection gaps do not interrupt the hold
        assert_eq!(eval(Some(&good()), at(t0, 5.5), &mut state), PostureStatus::Correct);
    }

    #[test]
    fn test_missing_landmark_is_invalid() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        let truncated = LandmarkSet::from_points(vec![Landmark::new(0.5, 0.3); 12]);

        let result = evaluate(
            Some(&truncated),
            at(t0, 1.0),
            &mut state,
            &PostureThresholds::default(),
        );
        assert_eq!(
            result,
            Err(PostureError::InvalidLandmarkSet {
                missing: LandmarkKind::RightShoulder
            })
        );
        assert_eq!(state.last_good_posture_start(), t0);
    }

    #[test]
    fn test_non_finite_landmark_is_invalid() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(t0);
        let set = pose(f32::NAN, 0.6, 0.6);
        let result = evaluate(Some(&set), t0, &mut state, &PostureThresholds::default());
        assert!(matches!(
            result,
            Err(PostureError::InvalidLandmarkSet {
                missing: LandmarkKind::Nose
            })
        ));
    }

    #[test]
    fn test_reset_never_moves_backward() {
        let t0 = Instant::now();
        let mut state = EvaluatorState::new(at(t0, 2.0));
        assert_eq!(eval(Some(&uneven()), at(t0, 1.0), &mut state), PostureStatus::ShouldersUneven);
        assert_eq!(state.last_good_posture_start(), at(t0, 2.0));
    }

    #[test]
    fn test_evaluator_reports_invalid_set_as_no_detection() {
        let t0 = Instant::now();
        let mut evaluator = PostureEvaluator::new(PostureThresholds::default(), t0);
        let truncated = LandmarkSet::from_points(Vec::new());

        assert!(evaluator.try_update(Some(&truncated), at(t0, 0.5)).is_err());
        assert_eq!(evaluator.state().last_good_posture_start(), t0);
        assert_eq!(evaluator.last_status(), Some(PostureStatus::NoDetection));
        assert_eq!(
            evaluator.try_update(Some(&good()), at(t0, 6.0)),
            Ok(PostureStatus::Correct)
        );
        assert_eq!(evaluator.last_status(), Some(PostureStatus::Correct));
    }

    #[test]
    fn test_custom_hold_duration() {
        let t0 = Instant::now();
        let thresholds = PostureThresholds {
            hold_duration: Duration::from_secs(1),
            ..Default::default()
        };
        let mut evaluator = PostureEvaluator::new(thresholds, t0);
        assert_eq!(evaluator.try_update(Some(&good()), at(t0, 0.9)), Ok(PostureStatus::Pending));
        assert_eq!(evaluator.try_update(Some(&good()), at(t0, 1.1)), Ok(PostureStatus::Correct));
    }

    #[derive(Debug, Clone)]
    enum Frame {
        Good,
        Uneven,
        Tilted,
        Missing,
    }

    fn frame_strategy() -> impl Strategy<Value = Frame> {
        prop_oneof![
            4 => Just(Frame::Good),
            1 => Just(Frame::Uneven),
            1 => Just(Frame::Tilted),
            1 => Just(Frame::Missing),
        ]
    }

    proptest! {
        #[test]
        fn prop_uneven_shoulders_always_reported(
            left in 0.0f32..1.0,
            right in 0.0f32..1.0,
            nose in 0.0f32..1.0,
        ) {
            prop_assume!((left - right).abs() >= 0.05);
            let t0 = Instant::now();
            let mut state = EvaluatorState::new(t0);
            let set = pose(nose, left, right);
            prop_assert_eq!(eval(Some(&set), t0, &mut state), PostureStatus::ShouldersUneven);
        }

        #[test]
        fn prop_low_head_with_level_shoulders_is_tilted(
            left in 0.0f32..1.0,
            delta in -0.049f32..0.049,
            below in 0.0f32..0.5,
        ) {
            let right = left + delta;
            prop_assume!((left - right).abs() < 0.05);
            let nose = left.min(right) + below;
            let t0 = Instant::now();
            let mut state = EvaluatorState::new(t0);
            let set = pose(nose, left, right);
            prop_assert_eq!(eval(Some(&set), t0, &mut state), PostureStatus::HeadTilted);
        }

        #[test]
        fn prop_timer_non_decreasing_and_debounced(
            frames in prop::collection::vec((frame_strategy(), 1u64..800), 1..200),
        ) {
            let t0 = Instant::now();
            let mut state = EvaluatorState::new(t0);
            let mut now = t0;
            let mut last_reset = t0;

            for (frame, step_ms) in frames {
                now += Duration::from_millis(step_ms);
                let before = state.last_good_posture_start();
                let set = match frame {
                    Frame::Good => Some(good()),
                    Frame::Uneven => Some(uneven()),
                    Frame::Tilted => Some(pose(0.8, 0.6, 0.6)),
                    Frame::Missing => None,
                };
                let status = eval(set.as_ref(), now, &mut state);

                prop_assert!(state.last_good_posture_start() >= before);
                if matches!(status, PostureStatus::ShouldersUneven | PostureStatus::HeadTilted) {
                    last_reset = now;
                    prop_assert_eq!(state.last_good_posture_start(), now);
                }
                if matches!(frame, Frame::Good) {
                    let held = now - last_reset;
                    let expected = if held > Duration::from_secs(5) {
                        PostureStatus::Correct
                    } else {
                        PostureStatus::Pending
                    };
                    prop_assert_eq!(status, expected);
                }
            }
        }
    }
}
