//! Pipeline configuration: mask strategy, similarity thresholds, smoothing,
//! and the remote fallback policy.
//!
//! Every field has a default. A TOML file may override any subset:
//!
//! ```toml
//! [mask]
//! strategy = "geometric"
//!
//! [mask.thresholds]
//! hue = 30.0
//!
//! [generation]
//! disable_remote_after_failure = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file malformed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {field} = {value}")]
    Invalid { field: &'static str, value: String },
}

/// Top-level configuration for the analysis and recoloring pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mask: MaskConfig,
    pub generation: GenerationConfig,
}

impl PipelineConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.mask.thresholds;
        for (field, value) in [
            ("mask.thresholds.hue", t.hue),
            ("mask.thresholds.saturation", t.saturation),
            ("mask.thresholds.lightness", t.lightness),
            ("mask.thresholds.max_lightness", t.max_lightness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid { field, value: value.to_string() });
            }
        }
        if self.mask.smoothing.radius > 32 {
            return Err(ConfigError::Invalid {
                field: "mask.smoothing.radius",
                value: self.mask.smoothing.radius.to_string(),
            });
        }
        Ok(())
    }
}

/// Which hair-region estimator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Ellipse above the forehead with the face carved out along the hairline.
    Geometric,
    /// Pixels inside the region that resemble the sampled hair color.
    ColorGeometry,
}

/// Hair bounding region, as multiples of face height (vertical) and face
/// width (horizontal) measured from the forehead and temples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub above_forehead: f32,
    pub below_forehead: f32,
    pub beyond_temples: f32,
}

impl RegionBounds {
    pub const GEOMETRIC: Self = Self { above_forehead: 0.8, below_forehead: 0.05, beyond_temples: 0.3 };
    pub const PRECISE: Self = Self { above_forehead: 1.0, below_forehead: 0.1, beyond_temples: 0.4 };
}

/// HSL similarity limits for the color strategy. Hue in degrees,
/// saturation and lightness on 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    /// Pixels at or above this lightness are never hair.
    pub max_lightness: f32,
    /// Compare hues around the wheel (355° is 10° from 5°) instead of by
    /// plain difference.
    pub circular_hue: bool,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self { hue: 40.0, saturation: 40.0, lightness: 40.0, max_lightness: 70.0, circular_hue: false }
    }
}

/// Dilation of the color+geometry mask. The geometric mask is never
/// dilated; its hairline is already the intended edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    pub iterations: u32,
    /// Neighborhood half-width k; the window is (2k+1)².
    pub radius: u32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { enabled: true, iterations: 3, radius: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    pub strategy: MaskStrategy,
    /// Overrides the strategy's default region when set.
    pub region: Option<RegionBounds>,
    pub thresholds: SimilarityThresholds,
    /// Upward offset of the hairline Bézier control points, in pixels.
    pub hairline_lift_px: f32,
    pub smoothing: SmoothingConfig,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            strategy: MaskStrategy::ColorGeometry,
            region: None,
            thresholds: SimilarityThresholds::default(),
            hairline_lift_px: 20.0,
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl MaskConfig {
    /// The purely geometric estimator.
    pub fn geometric() -> Self {
        Self {
            strategy: MaskStrategy::Geometric,
            smoothing: SmoothingConfig { enabled: false, ..SmoothingConfig::default() },
            ..Self::default()
        }
    }

    /// Whether the raw mask is dilated before use.
    pub fn smooths(&self) -> bool {
        self.smoothing.enabled && self.strategy == MaskStrategy::ColorGeometry
    }

    pub fn region_bounds(&self) -> RegionBounds {
        self.region.unwrap_or(match self.strategy {
            MaskStrategy::Geometric => RegionBounds::GEOMETRIC,
            MaskStrategy::ColorGeometry => RegionBounds::PRECISE,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// After one remote failure, render the rest of the batch locally.
    pub disable_remote_after_failure: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { disable_remote_after_failure: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.mask.strategy, MaskStrategy::ColorGeometry);
        assert_eq!(c.mask.region_bounds(), RegionBounds::PRECISE);
        assert_eq!(c.mask.thresholds.hue, 40.0);
        assert_eq!(c.mask.smoothing.iterations, 3);
        assert_eq!(c.mask.smoothing.radius, 3);
        assert!(c.generation.disable_remote_after_failure);
    }

    #[test]
    fn test_geometric_preset() {
        let m = MaskConfig::geometric();
        assert_eq!(m.region_bounds(), RegionBounds::GEOMETRIC);
        assert!(!m.smooths());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let c = PipelineConfig::from_toml_str(
            r#"
            [mask]
            strategy = "geometric"

            [mask.thresholds]
            hue = 30.0

            [generation]
            disable_remote_after_failure = false
            "#,
        )
        .unwrap();
        assert_eq!(c.mask.strategy, MaskStrategy::Geometric);
        assert_eq!(c.mask.thresholds.hue, 30.0);
        assert_eq!(c.mask.thresholds.saturation, 40.0);
        assert!(!c.mask.smooths());
        assert!(!c.generation.disable_remote_after_failure);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let err = PipelineConfig::from_toml_str("[mask.thresholds]\nlightness = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "mask.thresholds.lightness", .. }));
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let err = PipelineConfig::from_toml_str("[mask]\nstrategy = \"neural\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
