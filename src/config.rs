use crate::types::{
    CameraConfig, Config, DisplayConfig, LoggingConfig, ModelConfig, PostureConfig,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid config in {}", path))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to the built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.posture.shoulder_level_tolerance > 0.0) {
            anyhow::bail!(
                "posture.shoulder_level_tolerance must be positive, got {}",
                self.posture.shoulder_level_tolerance
            );
        }
        if !(self.posture.hold_duration_secs >= 0.0) || !self.posture.hold_duration_secs.is_finite()
        {
            anyhow::bail!(
                "posture.hold_duration_secs must be a finite non-negative number, got {}",
                self.posture.hold_duration_secs
            );
        }
        if self.model.input_size == 0 {
            anyhow::bail!("model.input_size must be non-zero");
        }
        Ok(())
    }
}

impl PostureConfig {
    pub fn hold_duration(&self) -> Duration {
        Duration::from_secs_f64(self.hold_duration_secs)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { device_index: 0 }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/pose_landmark.onnx".to_string(),
            input_size: 256,
            num_threads: 1,
            use_cuda: false,
            presence_threshold: 0.5,
        }
    }
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            shoulder_level_tolerance: 0.05,
            hold_duration_secs: 5.0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: "Deteccao de Postura".to_string(),
            draw_skeleton: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.camera.device_index, 0);
        assert_eq!(config.posture.shoulder_level_tolerance, 0.05);
        assert_eq!(config.posture.hold_duration(), Duration::from_secs(5));
        assert_eq!(config.display.window_title, "Deteccao de Postura");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("posture:\n  hold_duration_secs: 3.0\n").unwrap();
        assert_eq!(config.posture.hold_duration_secs, 3.0);
        assert_eq!(config.posture.shoulder_level_tolerance, 0.05);
        assert_eq!(config.model.input_size, 256);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_yaml("posture:\n  slouch_threshold: 0.1\n").is_err());
    }

    #[test]
    fn test_non_positive_tolerance_rejected() {
        assert!(Config::from_yaml("posture:\n  shoulder_level_tolerance: 0.0\n").is_err());
        assert!(Config::from_yaml("posture:\n  hold_duration_secs: -1.0\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("definitely/not/here.yaml").unwrap();
        assert_eq!(config.model.path, "models/pose_landmark.onnx");
    }
}
