//! Direct client for the Gemini `generateContent` endpoint.

use crate::data_url::strip_image_prefix;
use crate::extract::extract_image;
use crate::http::{post_json, Reply};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use seasonal_core::{EditGateway, EditRequest, EditedImage, GatewayError};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_HAIR_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_FASHION_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    hair_model: String,
    fashion_model: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("hair_model", &self.hair_model)
            .field("fashion_model", &self.fashion_model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            hair_model: DEFAULT_HAIR_MODEL.to_string(),
            fashion_model: DEFAULT_FASHION_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, hair: impl Into<String>, fashion: impl Into<String>) -> Self {
        self.hair_model = hair.into();
        self.fashion_model = fashion.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Recolor the hair in an image given as a data URL or bare base64.
    pub fn edit_hair(&self, image: &str, color: &str, description: &str) -> Result<EditedImage, GatewayError> {
        let payload = hair_payload(strip_image_prefix(image), color, description);
        self.generate(&self.hair_model, &payload)
    }

    /// Recolor the clothing, leaving the hair untouched.
    pub fn edit_fashion(&self, image: &str, target_color: &str) -> Result<EditedImage, GatewayError> {
        let payload = fashion_payload(strip_image_prefix(image), target_color);
        self.generate(&self.fashion_model, &payload)
    }

    fn generate(&self, model: &str, payload: &Value) -> Result<EditedImage, GatewayError> {
        let url = format!("{}/{model}:generateContent", self.base_url);
        tracing::info!(model, "requesting image edit");
        let reply = post_json(&url, &[("X-goog-api-key", self.api_key.as_str())], payload, self.timeout)?;
        parse_reply(reply)
    }
}

impl EditGateway for GeminiClient {
    fn request_edit(&self, request: &EditRequest) -> Result<EditedImage, GatewayError> {
        let payload = hair_payload(&STANDARD.encode(&request.image), &request.color_label, &request.instruction);
        // The inline part declares the request's own MIME type.
        let payload = with_mime_type(payload, &request.mime_type);
        self.generate(&self.hair_model, &payload)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

pub fn hair_prompt(color: &str, description: &str) -> String {
    format!(
        "Change the hair color of the person in this image to {color} ({description}). \
         Keep the exact same hairstyle, hair texture, lighting, facial features, skin tone, \
         clothing, and background. Do not modify anything except the hair color. \
         Return the edited image."
    )
}

pub fn fashion_prompt(target_color: &str) -> String {
    format!(
        "Change ONLY the color of the clothes/outfit of the person in this image to {target_color}. \
         IMPORTANT: The person's current hair color is CRITICAL. DO NOT CHANGE THE HAIR COLOR. \
         Keep the exact same hairstyle, hair color, facial features, face shape, and background. \
         Do not modify anything except the clothing color. Preserve the original composition completely."
    )
}

fn request_body(prompt: String, image_base64: &str) -> Value {
    let safety: Vec<Value> = SAFETY_CATEGORIES
        .iter()
        .map(|category| json!({"category": category, "threshold": "BLOCK_NONE"}))
        .collect();
    json!({
        "contents": [{
            "parts": [
                {"text": prompt},
                {"inline_data": {"mime_type": "image/jpeg", "data": image_base64}}
            ]
        }],
        "generationConfig": {"temperature": 0.1},
        "safetySettings": safety
    })
}

pub fn hair_payload(image_base64: &str, color: &str, description: &str) -> Value {
    request_body(hair_prompt(color, description), image_base64)
}

pub fn fashion_payload(image_base64: &str, target_color: &str) -> Value {
    request_body(fashion_prompt(target_color), image_base64)
}

fn with_mime_type(mut payload: Value, mime_type: &str) -> Value {
    if let Some(inline) = payload.pointer_mut("/contents/0/parts/1/inline_data/mime_type") {
        *inline = Value::String(mime_type.to_string());
    }
    payload
}

/// Classify an upstream reply and extract the image from a success.
fn parse_reply(reply: Reply) -> Result<EditedImage, GatewayError> {
    if !reply.is_success() {
        let snippet: String = reply.body.chars().take(200).collect();
        return Err(match reply.status {
            401 | 403 => GatewayError::Credential(format!("upstream rejected API key ({}): {snippet}", reply.status)),
            status => GatewayError::Transport(format!("upstream returned {status}: {snippet}")),
        });
    }
    let value: Value = serde_json::from_str(&reply.body).map_err(|e| GatewayError::Parse {
        reason: format!("response was not JSON: {e}"),
        snippet: reply.body.chars().take(100).collect(),
    })?;
    extract_image(&value)
}
