// src/pose_detection.rs

use crate::landmarks::{Landmark, LandmarkSet, NUM_LANDMARKS};
use crate::preprocessing;
use crate::types::ModelConfig;
use anyhow::{Context, Result};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use tracing::{debug, info};

/// Values per landmark in the model output: x, y, z, visibility, presence.
const LANDMARK_STRIDE: usize = 5;

pub struct PoseDetector {
    session: Session,
    input_name: String,
    input_size: usize,
    presence_threshold: f32,
}

impl PoseDetector {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        info!("Loading pose landmark model: {}", config.path);

        let mut builder = Session::builder()?;
        if config.use_cuda {
            info!("Enabling CUDA execution provider");
            builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(0)
                .build()])?;
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.path)
            .with_context(|| format!("Failed to load pose model {}", config.path))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .context("Pose model declares no inputs")?;

        info!(
            "✓ Pose detector initialized (input '{}', {}x{})",
            input_name, config.input_size, config.input_size
        );

        Ok(Self {
            session,
            input_name,
            input_size: config.input_size,
            presence_threshold: config.presence_threshold,
        })
    }

    /// Landmarks of the single body in an RGB frame, or `None` when the
    /// model reports no person.
    pub fn detect(&mut self, rgb: &[u8], width: usize, height: usize) -> Result<Option<LandmarkSet>> {
        let input = preprocessing::preprocess(rgb, width, height, self.input_size)?;
        let (landmarks, presence) = self.infer(&input)?;

        let detection = parse_landmarks(
            &landmarks,
            presence,
            self.input_size as f32,
            self.presence_threshold,
        );

        debug!(
            "Pose presence {:.2} → {}",
            presence.unwrap_or(1.0),
            if detection.is_some() { "body" } else { "none" }
        );
        Ok(detection)
    }

    fn infer(&mut self, input: &[f32]) -> Result<(Vec<f32>, Option<f32>)> {
        let shape = [1, self.input_size, self.input_size, 3];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.to_vec().into_boxed_slice()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_value])?;

        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
        let landmarks = data.to_vec();

        // Second output, when present, is the pose-presence flag
        let presence = if outputs.len() > 1 {
            let (_, flag) = outputs[1].try_extract_tensor::<f32>()?;
            flag.first().copied()
        } else {
            None
        };

        Ok((landmarks, presence))
    }
}

/// Turns raw model output into a normalized landmark set.
///
/// `raw` holds `LANDMARK_STRIDE` values per landmark in input-pixel units;
/// only the first `NUM_LANDMARKS` are body points (the rest are auxiliary
/// ROI points). A truncated tensor yields a short set and is left to the
/// evaluator to reject.
pub fn parse_landmarks(
    raw: &[f32],
    presence: Option<f32>,
    input_size: f32,
    presence_threshold: f32,
) -> Option<LandmarkSet> {
    if let Some(score) = presence {
        let score = if (0.0..=1.0).contains(&score) {
            score
        } else {
            sigmoid(score)
        };
        if score < presence_threshold {
            return None;
        }
    }

    if raw.len() < LANDMARK_STRIDE {
        return None;
    }

    let points = raw
        .chunks_exact(LANDMARK_STRIDE)
        .take(NUM_LANDMARKS)
        .map(|v| Landmark {
            x: v[0] / input_size,
            y: v[1] / input_size,
            z: v[2] / input_size,
            visibility: sigmoid(v[3]),
        })
        .collect();

    Some(LandmarkSet::from_points(points))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
