//! Pull an edited image out of an upstream response.
//!
//! Generative APIs return images in several shapes depending on model and
//! prompt. Each shape has its own extractor; they run in a fixed order and
//! the first that yields a decodable image wins. A payload only counts if
//! it is valid base64 and the bytes sniff as a known image format, so a
//! text refusal can never be mistaken for an image.

use crate::data_url::strip_image_prefix;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use seasonal_core::{EditedImage, GatewayError};
use serde_json::Value;

const SNIPPET_CHARS: usize = 100;

type Extractor = fn(&Value) -> Option<EditedImage>;

const EXTRACTORS: &[(&str, Extractor)] = &[
    ("inline_data", from_inline_part),
    ("image_url", from_image_url_field),
    ("text_base64", from_text_base64),
    ("text_json", from_text_json),
];

/// Find the image in a response, or report what came back instead.
pub fn extract_image(response: &Value) -> Result<EditedImage, GatewayError> {
    for (name, extractor) in EXTRACTORS {
        if let Some(image) = extractor(response) {
            tracing::debug!(extractor = name, bytes = image.bytes.len(), mime = %image.mime_type, "image extracted");
            return Ok(image);
        }
    }

    let reason = match block_reason(response) {
        Some(reason) => format!("response blocked: {reason}"),
        None => "no image found in response".to_string(),
    };
    Err(GatewayError::Parse { reason, snippet: snippet(response) })
}

/// Every `candidates[*].content.parts[*]` entry.
fn parts(response: &Value) -> impl Iterator<Item = &Value> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|c| c.pointer("/content/parts").and_then(Value::as_array))
        .flatten()
}

fn text_parts(response: &Value) -> impl Iterator<Item = &str> {
    parts(response).filter_map(|p| p.get("text").and_then(Value::as_str))
}

fn from_inline_part(response: &Value) -> Option<EditedImage> {
    parts(response).find_map(|part| {
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
        decode_image(inline.get("data")?.as_str()?)
    })
}

fn from_image_url_field(response: &Value) -> Option<EditedImage> {
    decode_image(response.get("imageUrl")?.as_str()?)
}

fn from_text_base64(response: &Value) -> Option<EditedImage> {
    text_parts(response).find_map(decode_image)
}

fn from_text_json(response: &Value) -> Option<EditedImage> {
    text_parts(response).find_map(|text| {
        let doc: Value = serde_json::from_str(strip_fences(text).trim()).ok()?;
        ["image", "imageUrl", "data"]
            .iter()
            .find_map(|key| doc.get(key).and_then(Value::as_str).and_then(decode_image))
    })
}

/// Decode a possibly decorated base64 payload and confirm it is an image.
fn decode_image(raw: &str) -> Option<EditedImage> {
    let cleaned: String = strip_fences(raw).chars().filter(|c| !c.is_whitespace()).collect();
    let payload = strip_image_prefix(&cleaned);
    if payload.is_empty() {
        return None;
    }
    let bytes = STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let format = image::guess_format(&bytes).ok()?;
    Some(EditedImage { bytes, mime_type: format.to_mime_type().to_string() })
}

/// Remove markdown code fences (```` ``` ```` with an optional language tag).
fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        out.push_str(&rest[..start]);
        rest = &rest[start + 3..];
        let tag_len = rest.find(|c: char| !c.is_alphanumeric()).unwrap_or(rest.len());
        rest = &rest[tag_len..];
    }
    out.push_str(rest);
    out
}

fn block_reason(response: &Value) -> Option<&str> {
    response.pointer("/promptFeedback/blockReason").and_then(Value::as_str)
}

/// The first text the model produced, or the raw response, shortened.
fn snippet(response: &Value) -> String {
    let text = match text_parts(response).next() {
        Some(t) => t.trim().to_string(),
        None => response.to_string(),
    };
    text.chars().take(SNIPPET_CHARS).collect()
}
