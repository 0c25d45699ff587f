//! seasonal-core — Personal color diagnosis and hair recoloring.
//!
//! Samples facial colors at face-mesh landmarks, scores them against the
//! four seasonal palettes, estimates the hair region, and recolors it
//! while preserving the original shading.

pub mod classifier;
pub mod color;
pub mod compositor;
pub mod config;
pub mod landmarks;
pub mod mask;
pub mod morphology;
pub mod remote;
pub mod sampling;
pub mod season;
pub mod session;

pub use classifier::{diagnose, ColorSample, Diagnosis, SeasonScores};
pub use color::{Hsl, Rgb, Tone};
pub use compositor::{apply_color, CompositeError};
pub use config::{ConfigError, MaskConfig, MaskStrategy, PipelineConfig};
pub use landmarks::{FaceLandmarks, LandmarkDetector, LandmarkPoint, PrecomputedLandmarks};
pub use mask::{estimate_hair_mask, HairMask};
pub use remote::{EditGateway, EditRequest, EditedImage, GatewayError};
pub use season::{Season, SeasonInfo};
pub use session::{AnalysisOutcome, GeneratedResult, GenerationMode, Provenance, SessionError, SessionState};
