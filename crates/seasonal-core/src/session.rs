//! Single-owner session: one portrait, its analysis, and the append-only
//! history of generated hair colors.

use crate::classifier::{diagnose, ColorSample, Diagnosis};
use crate::color::{HexColorError, Rgb};
use crate::compositor::{apply_color, CompositeError};
use crate::config::PipelineConfig;
use crate::landmarks::{DetectorError, FaceLandmarks, InvalidLandmarksError, LandmarkDetector};
use crate::mask::{estimate_hair_mask, HairMask};
use crate::remote::{EditGateway, EditRequest, EditedImage, GatewayError};
use crate::sampling::sample_colors;
use crate::season::{recommended_hair_colors, HairRecommendation};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("an analysis or generation is already in progress")]
    Busy,
    #[error("no analyzed portrait in this session")]
    NotAnalyzed,
    #[error("landmark detection failed: {0}")]
    Detector(#[from] DetectorError),
    #[error("invalid landmarks: {0}")]
    Landmarks(#[from] InvalidLandmarksError),
    #[error("compositing failed: {0}")]
    Composite(#[from] CompositeError),
    #[error("palette color invalid: {0}")]
    Palette(#[from] HexColorError),
    /// A fatal remote failure that aborted the batch.
    #[error("batch aborted: {0}")]
    Gateway(GatewayError),
}

/// Result of [`SessionState::analyze`].
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Diagnosed(Diagnosis),
    /// The detector found no face. Not an error; the session keeps no analysis.
    FaceNotFound,
}

/// How a batch renders its candidate colors.
#[derive(Debug, Clone, Copy)]
pub enum GenerationMode<'a> {
    Local,
    Remote { gateway: &'a dyn EditGateway, credential: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Local,
    Remote,
}

#[derive(Debug, Clone)]
pub enum ResultImage {
    Local(RgbaImage),
    Remote(EditedImage),
}

impl ResultImage {
    /// Decoded pixels regardless of where the image came from.
    pub fn to_rgba(&self) -> Result<RgbaImage, image::ImageError> {
        match self {
            ResultImage::Local(img) => Ok(img.clone()),
            ResultImage::Remote(edited) => edited.decode(),
        }
    }
}

/// One rendered hair color.
#[derive(Debug, Clone)]
pub struct GeneratedResult {
    pub id: Uuid,
    pub color_name: String,
    pub color_label: String,
    pub hex: String,
    pub image: ResultImage,
    pub provenance: Provenance,
    /// Why a remote attempt fell back to local rendering, if it did.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedResult {
    fn new(
        color_name: &str,
        color_label: &str,
        hex: &str,
        image: ResultImage,
        error: Option<String>,
    ) -> Self {
        let provenance = match image {
            ResultImage::Local(_) => Provenance::Local,
            ResultImage::Remote(_) => Provenance::Remote,
        };
        Self {
            id: Uuid::new_v4(),
            color_name: color_name.to_string(),
            color_label: color_label.to_string(),
            hex: hex.to_string(),
            image,
            provenance,
            error,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
struct Portrait {
    image: RgbaImage,
    landmarks: FaceLandmarks,
    sample: ColorSample,
    diagnosis: Diagnosis,
}

/// Everything one user session owns.
///
/// The in-flight flag stays set if a pipeline stage panics, so a session
/// left half-updated refuses further work until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct SessionState {
    config: PipelineConfig,
    portrait: Option<Portrait>,
    history: Vec<GeneratedResult>,
    in_flight: bool,
}

impl SessionState {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.portrait.as_ref().map(|p| &p.diagnosis)
    }

    pub fn sample(&self) -> Option<&ColorSample> {
        self.portrait.as_ref().map(|p| &p.sample)
    }

    pub fn source_image(&self) -> Option<&RgbaImage> {
        self.portrait.as_ref().map(|p| &p.image)
    }

    pub fn history(&self) -> &[GeneratedResult] {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Detect, sample, and classify a new portrait.
    ///
    /// On success the previous analysis is replaced wholesale; on a face
    /// miss it is cleared. Errors leave the session as it was. History is
    /// never touched.
    pub fn analyze(
        &mut self,
        image: RgbaImage,
        detector: &mut dyn LandmarkDetector,
    ) -> Result<AnalysisOutcome, SessionError> {
        self.begin()?;
        let result = Self::run_analysis(image, detector);
        self.in_flight = false;

        match result? {
            Some(portrait) => {
                let diagnosis = portrait.diagnosis.clone();
                tracing::info!(
                    season = %diagnosis.season,
                    spring = diagnosis.scores.spring,
                    summer = diagnosis.scores.summer,
                    autumn = diagnosis.scores.autumn,
                    winter = diagnosis.scores.winter,
                    "portrait analyzed"
                );
                self.portrait = Some(portrait);
                Ok(AnalysisOutcome::Diagnosed(diagnosis))
            }
            None => {
                tracing::info!("no face detected");
                self.portrait = None;
                Ok(AnalysisOutcome::FaceNotFound)
            }
        }
    }

    fn run_analysis(
        image: RgbaImage,
        detector: &mut dyn LandmarkDetector,
    ) -> Result<Option<Portrait>, SessionError> {
        let Some(landmarks) = detector.detect(&image)? else {
            return Ok(None);
        };
        let sample = sample_colors(&image, &landmarks)?;
        let diagnosis = diagnose(&sample);
        Ok(Some(Portrait { image, landmarks, sample, diagnosis }))
    }

    /// Render the three recommended hair colors for the diagnosed season.
    ///
    /// Candidates run strictly one after another. A non-fatal remote
    /// failure falls back to local rendering for that color; a fatal one
    /// aborts the batch with nothing appended. Returns the newly appended
    /// results, in candidate order.
    pub fn generate_batch(&mut self, mode: GenerationMode<'_>) -> Result<&[GeneratedResult], SessionError> {
        self.begin()?;
        let result = self.run_batch(mode);
        self.in_flight = false;

        let batch = result?;
        let start = self.history.len();
        self.history.extend(batch);
        Ok(&self.history[start..])
    }

    fn run_batch(&self, mode: GenerationMode<'_>) -> Result<Vec<GeneratedResult>, SessionError> {
        let portrait = self.portrait.as_ref().ok_or(SessionError::NotAnalyzed)?;
        let season = portrait.diagnosis.season;
        let candidates = recommended_hair_colors(season);
        tracing::info!(%season, candidates = candidates.len(), "generating hair color batch");

        let mut remote = match mode {
            GenerationMode::Local => None,
            GenerationMode::Remote { gateway, credential } => Some((gateway, credential)),
        };
        // Estimated on first local render, then reused for the batch.
        let mut mask: Option<HairMask> = None;
        let mut results = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let mut fallback_reason = None;

            if let Some((gateway, credential)) = remote {
                match self.request_remote(portrait, gateway, credential, candidate) {
                    Ok(edited) => {
                        tracing::info!(color = candidate.prompt_label, gateway = gateway.name(), "remote edit succeeded");
                        results.push(GeneratedResult::new(
                            candidate.name,
                            candidate.prompt_label,
                            candidate.hex,
                            ResultImage::Remote(edited),
                            None,
                        ));
                        continue;
                    }
                    Err(e) if e.is_fatal() => {
                        tracing::warn!(error = %e, color = candidate.prompt_label, "remote edit rejected, aborting batch");
                        return Err(SessionError::Gateway(e));
                    }
                    Err(e) => {
                        match &e {
                            GatewayError::Parse { .. } => tracing::warn!(
                                error = %e,
                                color = candidate.prompt_label,
                                "remote response held no image, rendering locally"
                            ),
                            _ => tracing::warn!(
                                error = %e,
                                color = candidate.prompt_label,
                                "remote edit unreachable, rendering locally"
                            ),
                        }
                        if self.config.generation.disable_remote_after_failure {
                            remote = None;
                        }
                        fallback_reason = Some(e.to_string());
                    }
                }
            }

            let hair_mask = match mask.take() {
                Some(m) => m,
                None => self.estimate_mask(portrait)?,
            };
            let recolored = apply_color(&portrait.image, &hair_mask, Rgb::from_hex(candidate.hex)?)?;
            mask = Some(hair_mask);
            results.push(GeneratedResult::new(
                candidate.name,
                candidate.prompt_label,
                candidate.hex,
                ResultImage::Local(recolored),
                fallback_reason,
            ));
        }

        Ok(results)
    }

    fn request_remote(
        &self,
        portrait: &Portrait,
        gateway: &dyn EditGateway,
        credential: &str,
        candidate: &HairRecommendation,
    ) -> Result<EditedImage, GatewayError> {
        let request = EditRequest::from_rgba(
            &portrait.image,
            candidate.prompt_description,
            candidate.prompt_label,
            credential,
        )
        .map_err(|e| GatewayError::Transport(format!("could not encode portrait: {e}")))?;
        gateway.request_edit(&request)
    }

    /// Recolor the hair locally with an arbitrary color and append the result.
    pub fn recolor(&mut self, color: Rgb) -> Result<&GeneratedResult, SessionError> {
        self.begin()?;
        let result = self.render_local(color);
        self.in_flight = false;

        let image = result?;
        let hex = color.to_hex();
        self.history.push(GeneratedResult::new(&hex, &hex, &hex, ResultImage::Local(image), None));
        let last = self.history.len() - 1;
        Ok(&self.history[last])
    }

    fn render_local(&self, color: Rgb) -> Result<RgbaImage, SessionError> {
        let portrait = self.portrait.as_ref().ok_or(SessionError::NotAnalyzed)?;
        let mask = self.estimate_mask(portrait)?;
        Ok(apply_color(&portrait.image, &mask, color)?)
    }

    /// The hair mask for the current portrait under the session's config.
    pub fn hair_mask(&self) -> Result<HairMask, SessionError> {
        let portrait = self.portrait.as_ref().ok_or(SessionError::NotAnalyzed)?;
        self.estimate_mask(portrait)
    }

    fn estimate_mask(&self, portrait: &Portrait) -> Result<HairMask, SessionError> {
        Ok(estimate_hair_mask(
            &portrait.image,
            &portrait.landmarks,
            portrait.sample.hair,
            &self.config.mask,
        )?)
    }

    /// Drop the portrait, its analysis, and all generated results.
    pub fn reset(&mut self) {
        self.portrait = None;
        self.history.clear();
        self.in_flight = false;
        tracing::debug!("session reset");
    }

    fn begin(&mut self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.in_flight = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::landmarks::{synthetic_face, PrecomputedLandmarks};
    use crate::remote::{encode_png, ScriptedGateway};
    use crate::season::Season;
    use image::Rgba;

    const HAIR: Rgba<u8> = Rgba([60, 40, 30, 255]);
    const SKIN: Rgba<u8> = Rgba([200, 140, 110, 255]);

    // Dark warm hair above y = 70, warm skin below. The lip sample lands on
    // skin, so this diagnoses as spring.
    fn portrait() -> RgbaImage {
        RgbaImage::from_fn(200, 200, |_, y| if y < 70 { HAIR } else { SKIN })
    }

    fn detector() -> PrecomputedLandmarks {
        PrecomputedLandmarks::new(vec![synthetic_face()])
    }

    fn analyzed(config: PipelineConfig) -> SessionState {
        let mut session = SessionState::new(config);
        let outcome = session.analyze(portrait(), &mut detector()).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::Diagnosed(_)));
        session
    }

    fn remote_image() -> EditedImage {
        let bytes = encode_png(&RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]))).unwrap();
        EditedImage { bytes, mime_type: "image/png".into() }
    }

    fn transport() -> GatewayError {
        GatewayError::Transport("connection refused".into())
    }

    #[test]
    fn test_analyze_diagnoses_portrait() {
        let session = analyzed(PipelineConfig::default());
        let d = session.diagnosis().unwrap();
        assert_eq!(d.season, Season::Spring);
        assert_eq!(session.sample().unwrap().hair, Rgb::new(60, 40, 30));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_face_not_found_is_outcome() {
        let mut session = analyzed(PipelineConfig::default());
        let outcome = session.analyze(portrait(), &mut PrecomputedLandmarks::none()).unwrap();
        assert!(matches!(outcome, AnalysisOutcome::FaceNotFound));
        assert!(session.diagnosis().is_none());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_invalid_landmarks_keep_previous_analysis() {
        let mut session = analyzed(PipelineConfig::default());
        session.recolor(Rgb::new(200, 0, 0)).unwrap();

        let mut bad = PrecomputedLandmarks::new(vec![FaceLandmarks::new(vec![])]);
        let err = session.analyze(portrait(), &mut bad).unwrap_err();
        assert!(matches!(err, SessionError::Landmarks(_)));
        assert!(session.diagnosis().is_some());
        assert_eq!(session.history().len(), 1);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_busy_session_rejects_work() {
        let mut session = analyzed(PipelineConfig::default());
        session.in_flight = true;
        assert!(matches!(session.analyze(portrait(), &mut detector()), Err(SessionError::Busy)));
        assert!(matches!(session.generate_batch(GenerationMode::Local), Err(SessionError::Busy)));
        session.reset();
        assert!(!session.is_busy());
    }

    #[test]
    fn test_generate_before_analyze() {
        let mut session = SessionState::default();
        let err = session.generate_batch(GenerationMode::Local).unwrap_err();
        assert!(matches!(err, SessionError::NotAnalyzed));
    }

    #[test]
    fn test_local_batch_appends_in_order() {
        let mut session = analyzed(PipelineConfig::default());
        let batch = session.generate_batch(GenerationMode::Local).unwrap();
        let labels: Vec<_> = batch.iter().map(|r| r.color_label.as_str()).collect();
        assert_eq!(labels, ["honey blonde", "light caramel", "golden brown"]);
        assert!(batch.iter().all(|r| r.provenance == Provenance::Local && r.error.is_none()));

        // Hair pixels changed, skin below the hair region did not.
        let first = batch[0].image.to_rgba().unwrap();
        assert_ne!(*first.get_pixel(100, 50), HAIR);
        assert_eq!(*first.get_pixel(100, 190), SKIN);

        session.generate_batch(GenerationMode::Local).unwrap();
        assert_eq!(session.history().len(), 6);
    }

    #[test]
    fn test_remote_batch_uses_gateway() {
        let mut session = analyzed(PipelineConfig::default());
        let gateway = ScriptedGateway::new(vec![Ok(remote_image()), Ok(remote_image()), Ok(remote_image())]);
        let batch = session
            .generate_batch(GenerationMode::Remote { gateway: &gateway, credential: "pw" })
            .unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|r| r.provenance == Provenance::Remote));
        assert_eq!(gateway.calls(), ["honey blonde", "light caramel", "golden brown"]);
    }

    #[test]
    fn test_transport_failure_disables_remote_for_batch() {
        let mut session = analyzed(PipelineConfig::default());
        let gateway = ScriptedGateway::new(vec![Err(transport()), Ok(remote_image()), Ok(remote_image())]);
        let batch = session
            .generate_batch(GenerationMode::Remote { gateway: &gateway, credential: "pw" })
            .unwrap();
        assert!(batch.iter().all(|r| r.provenance == Provenance::Local));
        assert!(batch[0].error.as_deref().unwrap().contains("connection refused"));
        assert!(batch[1].error.is_none());
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn test_parse_failure_falls_back_per_color_when_configured() {
        let config = PipelineConfig {
            generation: GenerationConfig { disable_remote_after_failure: false },
            ..PipelineConfig::default()
        };
        let mut session = analyzed(config);
        let parse = GatewayError::Parse { reason: "no image".into(), snippet: "I cannot".into() };
        let gateway = ScriptedGateway::new(vec![Ok(remote_image()), Err(parse), Ok(remote_image())]);
        let batch = session
            .generate_batch(GenerationMode::Remote { gateway: &gateway, credential: "pw" })
            .unwrap();
        let provenance: Vec<_> = batch.iter().map(|r| r.provenance).collect();
        assert_eq!(provenance, [Provenance::Remote, Provenance::Local, Provenance::Remote]);
        assert_eq!(gateway.calls().len(), 3);
    }

    #[test]
    fn test_credential_failure_aborts_batch() {
        let mut session = analyzed(PipelineConfig::default());
        session.generate_batch(GenerationMode::Local).unwrap();
        let gateway = ScriptedGateway::new(vec![
            Ok(remote_image()),
            Err(GatewayError::Credential("Invalid access password.".into())),
        ]);
        let err = session
            .generate_batch(GenerationMode::Remote { gateway: &gateway, credential: "wrong" })
            .unwrap_err();
        assert!(matches!(err, SessionError::Gateway(GatewayError::Credential(_))));
        assert_eq!(session.history().len(), 3);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_recolor_and_reset() {
        let mut session = analyzed(PipelineConfig::default());
        let result = session.recolor(Rgb::new(0x1C, 0x1C, 0x1C)).unwrap();
        assert_eq!(result.hex, "#1C1C1C");
        assert_eq!(result.provenance, Provenance::Local);
        assert_eq!(session.history().len(), 1);

        session.reset();
        assert!(session.history().is_empty());
        assert!(session.diagnosis().is_none());
        assert!(matches!(session.hair_mask(), Err(SessionError::NotAnalyzed)));
    }

    #[test]
    fn test_hair_mask_covers_hair_only() {
        let session = analyzed(PipelineConfig::default());
        let mask = session.hair_mask().unwrap();
        assert!(mask.alpha_at(100, 50) > 0);
        assert_eq!(mask.alpha_at(100, 150), 0);
    }
}
