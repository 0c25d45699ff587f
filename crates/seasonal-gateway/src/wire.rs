//! JSON bodies exchanged between clients and the `seasonald` proxy.

use serde::{Deserialize, Serialize};

/// `POST /api/generate-hair`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairEditRequest {
    /// Portrait as a data URL.
    pub image: String,
    /// Free-text description of the target color.
    pub prompt: String,
    /// Short color label.
    pub color: String,
    #[serde(default)]
    pub access_password: String,
}

/// `POST /api/generate-fashion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FashionEditRequest {
    pub image: String,
    pub target_color: String,
    #[serde(default)]
    pub access_password: String,
}

/// `POST /api/verify-password`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub access_password: String,
}

/// Failure category carried alongside `error`, so clients can tell a
/// refused or imageless response apart from an unreachable upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The request body could not be read.
    Request,
    Credential,
    Configuration,
    Parse,
    Upstream,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl EditResponse {
    pub fn ok(image_url: String) -> Self {
        Self { success: true, image_url: Some(image_url), error: None, error_kind: None }
    }

    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self { success: false, image_url: None, error: Some(error.into()), error_kind: Some(kind) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_api_configured: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hair_request_field_names() {
        let req = HairEditRequest {
            image: "data:image/png;base64,AAAA".into(),
            prompt: "warm honey blonde".into(),
            color: "honey blonde".into(),
            access_password: "pw".into(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["accessPassword"], "pw");
        assert_eq!(v["color"], "honey blonde");
    }

    #[test]
    fn test_fashion_request_accepts_missing_password() {
        let req: FashionEditRequest =
            serde_json::from_value(json!({"image": "x", "targetColor": "navy"})).unwrap();
        assert_eq!(req.target_color, "navy");
        assert_eq!(req.access_password, "");
    }

    #[test]
    fn test_failure_response_shape() {
        let v = serde_json::to_value(EditResponse::failure(ErrorKind::Parse, "no image")).unwrap();
        assert_eq!(v, json!({"success": false, "error": "no image", "errorKind": "parse"}));
    }

    #[test]
    fn test_verify_response_from_plain_proxy() {
        // Responses without errorKind still parse.
        let r: VerifyResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Password verified.",
            "googleApiConfigured": false
        }))
        .unwrap();
        assert_eq!(r.google_api_configured, Some(false));
        assert!(r.error.is_none());
    }
}
