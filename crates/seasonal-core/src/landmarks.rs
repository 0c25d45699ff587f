//! Face-mesh landmarks and the detector boundary.
//!
//! Landmarks are produced by an external face-mesh model and are treated
//! as read-only input, valid for the single image they were computed from.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// --- Face-mesh indices used by sampling and mask estimation ---
pub const NOSE_TIP: usize = 1;
pub const FOREHEAD_CENTER: usize = 10;
pub const LIP_CENTER: usize = 13;
pub const LEFT_FOREHEAD: usize = 103;
pub const CHIN: usize = 152;
pub const LEFT_TEMPLE: usize = 234;
pub const RIGHT_FOREHEAD: usize = 332;
pub const RIGHT_TEMPLE: usize = 454;
pub const LEFT_IRIS: usize = 468;
pub const RIGHT_IRIS: usize = 473;

/// Normalized image coordinate, (0, 0) top-left, (1, 1) bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel position in an image of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// One detected face's landmark set, indexed by face-mesh numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fetch a landmark that geometry depends on, rejecting missing or
    /// non-finite points.
    pub fn require(&self, index: usize) -> Result<LandmarkPoint, InvalidLandmarksError> {
        let p = self
            .get(index)
            .ok_or(InvalidLandmarksError::Missing { index, available: self.len() })?;
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(InvalidLandmarksError::NonFinite { index });
        }
        Ok(p)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidLandmarksError {
    #[error("landmark {index} missing (set has {available} points)")]
    Missing { index: usize, available: usize },
    #[error("landmark {index} has non-finite coordinates")]
    NonFinite { index: usize },
    #[error("degenerate face geometry: width {width:.1}px, height {height:.1}px")]
    DegenerateFace { width: f32, height: f32 },
    #[error("image has zero size")]
    EmptyImage,
}

/// Face bounding metrics in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub forehead: (f32, f32),
    pub chin: (f32, f32),
    pub left_temple: (f32, f32),
    pub right_temple: (f32, f32),
    pub left_forehead: (f32, f32),
    pub right_forehead: (f32, f32),
    /// |rightTemple.x − leftTemple.x| × width
    pub face_width: f32,
    /// |forehead.y − chin.y| × height
    pub face_height: f32,
}

impl FaceGeometry {
    pub fn from_landmarks(
        landmarks: &FaceLandmarks,
        width: u32,
        height: u32,
    ) -> Result<Self, InvalidLandmarksError> {
        if width == 0 || height == 0 {
            return Err(InvalidLandmarksError::EmptyImage);
        }

        let px = |index: usize| -> Result<(f32, f32), InvalidLandmarksError> {
            Ok(landmarks.require(index)?.to_pixel(width, height))
        };

        let forehead = px(FOREHEAD_CENTER)?;
        let chin = px(CHIN)?;
        let left_temple = px(LEFT_TEMPLE)?;
        let right_temple = px(RIGHT_TEMPLE)?;
        let left_forehead = px(LEFT_FOREHEAD)?;
        let right_forehead = px(RIGHT_FOREHEAD)?;

        let face_width = (right_temple.0 - left_temple.0).abs();
        let face_height = (forehead.1 - chin.1).abs();

        // Sub-pixel faces are as unusable as zero-size ones.
        if face_width < 1.0 || face_height < 1.0 {
            return Err(InvalidLandmarksError::DegenerateFace { width: face_width, height: face_height });
        }

        Ok(Self {
            forehead,
            chin,
            left_temple,
            right_temple,
            left_forehead,
            right_forehead,
            face_width,
            face_height,
        })
    }

    /// Mean of face width and height, used to scale sampling radii.
    pub fn face_size(&self) -> f32 {
        (self.face_width + self.face_height) / 2.0
    }
}

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("landmark file not found: {0}")]
    NotFound(String),
    #[error("landmark file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("landmark file malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Face landmark detector boundary.
///
/// `Ok(None)` means no face was found. That is a normal outcome, not an error.
pub trait LandmarkDetector {
    fn detect(&mut self, image: &RgbaImage) -> Result<Option<FaceLandmarks>, DetectorError>;
}

/// Landmarks computed ahead of time (e.g. by a browser face-mesh model)
/// and replayed for the next image.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedLandmarks {
    faces: Vec<FaceLandmarks>,
}

impl PrecomputedLandmarks {
    pub fn new(faces: Vec<FaceLandmarks>) -> Self {
        Self { faces }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Load a JSON file holding either one landmark array or an array of faces.
    pub fn load(path: &Path) -> Result<Self, DetectorError> {
        if !path.exists() {
            return Err(DetectorError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, DetectorError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LandmarkFile {
            Faces(Vec<FaceLandmarks>),
            Single(FaceLandmarks),
        }

        let faces = match serde_json::from_str::<LandmarkFile>(text)? {
            LandmarkFile::Faces(faces) => faces,
            LandmarkFile::Single(face) => vec![face],
        };
        tracing::debug!(faces = faces.len(), "loaded precomputed landmarks");
        Ok(Self { faces })
    }
}

impl LandmarkDetector for PrecomputedLandmarks {
    fn detect(&mut self, _image: &RgbaImage) -> Result<Option<FaceLandmarks>, DetectorError> {
        Ok(self.faces.first().cloned())
    }
}

/// Synthetic landmark set for tests: a frontal face centered in the frame.
#[cfg(test)]
pub(crate) fn synthetic_face() -> FaceLandmarks {
    let mut points = vec![LandmarkPoint::new(0.5, 0.5); 478];
    points[NOSE_TIP] = LandmarkPoint::new(0.5, 0.55);
    points[FOREHEAD_CENTER] = LandmarkPoint::new(0.5, 0.4);
    points[LIP_CENTER] = LandmarkPoint::new(0.5, 0.7);
    points[LEFT_FOREHEAD] = LandmarkPoint::new(0.4, 0.42);
    points[CHIN] = LandmarkPoint::new(0.5, 0.8);
    points[LEFT_TEMPLE] = LandmarkPoint::new(0.35, 0.5);
    points[RIGHT_FOREHEAD] = LandmarkPoint::new(0.6, 0.42);
    points[RIGHT_TEMPLE] = LandmarkPoint::new(0.65, 0.5);
    points[LEFT_IRIS] = LandmarkPoint::new(0.43, 0.5);
    points[RIGHT_IRIS] = LandmarkPoint::new(0.57, 0.5);
    FaceLandmarks::new(points)
}
