//! Remote image-edit boundary.
//!
//! A gateway takes the whole portrait plus a color instruction and returns
//! an edited image, replacing the local mask + compositor path for that
//! color. Implementations live in `seasonal-gateway`; the session only
//! sees this trait.

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fmt::Debug;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network failure or an upstream error status.
    #[error("remote transport failed: {0}")]
    Transport(String),
    /// The response arrived but held no recognizable image.
    #[error("remote response held no image: {reason} (response began: {snippet:?})")]
    Parse { reason: String, snippet: String },
    /// The access credential was rejected.
    #[error("remote credential rejected: {0}")]
    Credential(String),
    #[error("remote call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl GatewayError {
    /// Fatal errors abort the whole batch; everything else falls back to
    /// local rendering.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Credential(_))
    }
}

/// One edit request: the encoded portrait and what to do with it.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Encoded image bytes (PNG or JPEG).
    pub image: Vec<u8>,
    pub mime_type: String,
    /// Free-text edit instruction, e.g. "warm honey blonde with golden highlights".
    pub instruction: String,
    /// Short color label, e.g. "honey blonde".
    pub color_label: String,
    pub credential: String,
}

impl EditRequest {
    /// Build a request from a decoded image, encoding it as PNG.
    pub fn from_rgba(
        image: &RgbaImage,
        instruction: impl Into<String>,
        color_label: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self, image::ImageError> {
        Ok(Self {
            image: encode_png(image)?,
            mime_type: "image/png".to_string(),
            instruction: instruction.into(),
            color_label: color_label.into(),
            credential: credential.into(),
        })
    }
}

/// An edited image as returned by a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl EditedImage {
    pub fn decode(&self) -> Result<RgbaImage, image::ImageError> {
        Ok(image::load_from_memory(&self.bytes)?.to_rgba8())
    }
}

/// Remote edit provider.
pub trait EditGateway: Send + Sync + Debug {
    fn request_edit(&self, request: &EditRequest) -> Result<EditedImage, GatewayError>;

    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Gateway double that replays a fixed script of outcomes and records
/// every request it sees.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedGateway {
    script: std::sync::Mutex<std::collections::VecDeque<Result<EditedImage, GatewayError>>>,
    pub(crate) seen: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedGateway {
    pub(crate) fn new(script: Vec<Result<EditedImage, GatewayError>>) -> Self {
        Self { script: std::sync::Mutex::new(script.into()), seen: Default::default() }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl EditGateway for ScriptedGateway {
    fn request_edit(&self, request: &EditRequest) -> Result<EditedImage, GatewayError> {
        self.seen.lock().unwrap().push(request.color_label.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".into())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
