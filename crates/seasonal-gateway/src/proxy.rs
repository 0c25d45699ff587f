//! Client for a `seasonald` proxy.

use crate::data_url::DataUrl;
use crate::extract::extract_image;
use crate::http::{post_json, Reply};
use crate::wire::{EditResponse, ErrorKind, FashionEditRequest, HairEditRequest, VerifyRequest, VerifyResponse};
use seasonal_core::{EditGateway, EditRequest, EditedImage, GatewayError};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    timeout: Duration,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Check an access password. `Ok` carries whether the proxy has an
    /// upstream API key configured.
    pub fn verify_password(&self, password: &str) -> Result<VerifyResponse, GatewayError> {
        let body = VerifyRequest { access_password: password.to_string() };
        let reply = post_json(&self.url("/api/verify-password"), &[], &body, self.timeout)?;
        if !reply.is_success() {
            return Err(classify_failure(&reply, self.timeout));
        }
        serde_json::from_str(&reply.body).map_err(|e| GatewayError::Parse {
            reason: format!("verify response malformed: {e}"),
            snippet: reply.body.chars().take(100).collect(),
        })
    }

    pub fn edit_fashion(&self, image: &[u8], mime_type: &str, target_color: &str, password: &str) -> Result<EditedImage, GatewayError> {
        let body = FashionEditRequest {
            image: DataUrl::encode(mime_type, image),
            target_color: target_color.to_string(),
            access_password: password.to_string(),
        };
        let reply = post_json(&self.url("/api/generate-fashion"), &[], &body, self.timeout)?;
        image_from_reply(&reply, self.timeout)
    }
}

impl EditGateway for ProxyClient {
    fn request_edit(&self, request: &EditRequest) -> Result<EditedImage, GatewayError> {
        let body = HairEditRequest {
            image: DataUrl::encode(&request.mime_type, &request.image),
            prompt: request.instruction.clone(),
            color: request.color_label.clone(),
            access_password: request.credential.clone(),
        };
        let reply = post_json(&self.url("/api/generate-hair"), &[], &body, self.timeout)?;
        image_from_reply(&reply, self.timeout)
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}

fn image_from_reply(reply: &Reply, timeout: Duration) -> Result<EditedImage, GatewayError> {
    if !reply.is_success() {
        return Err(classify_failure(reply, timeout));
    }
    let value: serde_json::Value = serde_json::from_str(&reply.body).map_err(|e| GatewayError::Parse {
        reason: format!("proxy response malformed: {e}"),
        snippet: reply.body.chars().take(100).collect(),
    })?;
    extract_image(&value)
}

/// Map a non-2xx proxy reply onto the gateway error taxonomy.
fn classify_failure(reply: &Reply, timeout: Duration) -> GatewayError {
    let parsed: Option<EditResponse> = serde_json::from_str(&reply.body).ok();
    let message = parsed
        .as_ref()
        .and_then(|r| r.error.clone())
        .unwrap_or_else(|| reply.body.chars().take(200).collect());

    match (reply.status, parsed.and_then(|r| r.error_kind)) {
        (401, _) | (_, Some(ErrorKind::Credential)) => GatewayError::Credential(message),
        (_, Some(ErrorKind::Parse)) => GatewayError::Parse { reason: message, snippet: String::new() },
        (_, Some(ErrorKind::Timeout)) | (504, None) => GatewayError::Timeout { elapsed_ms: timeout.as_millis() as u64 },
        (status, _) => GatewayError::Transport(format!("proxy returned {status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, body: impl serde::Serialize) -> Reply {
        Reply { status, body: serde_json::to_string(&body).unwrap() }
    }

    #[test]
    fn test_unauthorized_is_credential() {
        let r = reply(401, EditResponse { success: false, image_url: None, error: Some("Invalid access password.".into()), error_kind: None });
        assert_eq!(classify_failure(&r, DEFAULT_TIMEOUT), GatewayError::Credential("Invalid access password.".into()));
    }

    #[test]
    fn test_parse_kind_is_parse() {
        let r = reply(500, EditResponse::failure(ErrorKind::Parse, "Failed to generate image. Model response: I can't"));
        assert!(matches!(classify_failure(&r, DEFAULT_TIMEOUT), GatewayError::Parse { .. }));
    }

    #[test]
    fn test_other_failures_are_transport() {
        let r = reply(500, EditResponse::failure(ErrorKind::Configuration, "Server configuration error: GOOGLE_API_KEY not set."));
        assert!(matches!(classify_failure(&r, DEFAULT_TIMEOUT), GatewayError::Transport(m) if m.contains("GOOGLE_API_KEY")));

        // A proxy without errorKind degrades to transport.
        let r = reply(500, serde_json::json!({"success": false, "error": "Google API Error: 429"}));
        assert!(matches!(classify_failure(&r, DEFAULT_TIMEOUT), GatewayError::Transport(_)));

        let r = Reply { status: 502, body: "<html>bad gateway</html>".into() };
        assert_eq!(classify_failure(&r, DEFAULT_TIMEOUT), GatewayError::Transport("proxy returned 502: <html>bad gateway</html>".into()));
    }

    #[test]
    fn test_timeout_reports_configured_duration() {
        let r = reply(500, EditResponse::failure(ErrorKind::Timeout, "upstream timed out"));
        assert_eq!(classify_failure(&r, Duration::from_secs(90)), GatewayError::Timeout { elapsed_ms: 90_000 });

        let r = Reply { status: 504, body: "gateway timeout".into() };
        assert_eq!(classify_failure(&r, Duration::from_millis(1500)), GatewayError::Timeout { elapsed_ms: 1500 });
    }

    #[test]
    fn test_success_without_image_is_parse() {
        let r = reply(200, serde_json::json!({"success": true}));
        assert!(matches!(image_from_reply(&r, DEFAULT_TIMEOUT), Err(GatewayError::Parse { .. })));
    }

    #[test]
    fn test_success_with_image() {
        let png = seasonal_core::remote::encode_png(&image::RgbaImage::new(1, 1)).unwrap();
        let r = reply(200, EditResponse::ok(DataUrl::encode("image/png", &png)));
        let img = image_from_reply(&r, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(img.bytes, png);
    }

    #[test]
    fn test_url_join() {
        let c = ProxyClient::new("http://localhost:8787/");
        assert_eq!(c.url("/api/generate-hair"), "http://localhost:8787/api/generate-hair");
    }
}
