use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use seasonal_core::{EditedImage, GatewayError};
use seasonal_gateway::{
    AccessPolicy, DataUrl, EditResponse, ErrorKind, FashionEditRequest, GeminiClient, HairEditRequest,
    VerifyRequest, VerifyResponse,
};
use std::sync::Arc;

/// The generative backend behind the proxy.
pub trait Upstream: Send + Sync + 'static {
    fn edit_hair(&self, image: &str, color: &str, description: &str) -> Result<EditedImage, GatewayError>;
    fn edit_fashion(&self, image: &str, target_color: &str) -> Result<EditedImage, GatewayError>;
}

impl Upstream for GeminiClient {
    fn edit_hair(&self, image: &str, color: &str, description: &str) -> Result<EditedImage, GatewayError> {
        GeminiClient::edit_hair(self, image, color, description)
    }

    fn edit_fashion(&self, image: &str, target_color: &str) -> Result<EditedImage, GatewayError> {
        GeminiClient::edit_fashion(self, image, target_color)
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub policy: AccessPolicy,
    /// `None` when no upstream API key is configured.
    pub upstream: Option<Arc<dyn Upstream>>,
}

type Reply<T> = (StatusCode, Json<T>);

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/verify-password", post(verify_password))
        .route("/api/generate-hair", post(generate_hair))
        .route("/api/generate-fashion", post(generate_fashion))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn verify_password(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Reply<VerifyResponse> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => {
            let body = VerifyResponse { success: false, message: None, error: Some(e.body_text()), google_api_configured: None };
            return (StatusCode::BAD_REQUEST, Json(body));
        }
    };

    match state.policy.check(&req.access_password) {
        Ok(()) => {
            tracing::info!("access password verified");
            let body = VerifyResponse {
                success: true,
                message: Some("Password verified.".to_string()),
                error: None,
                google_api_configured: Some(state.upstream.is_some()),
            };
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::warn!(error = %e, "password verification failed");
            let body = VerifyResponse { success: false, message: None, error: Some(e.to_string()), google_api_configured: None };
            (status(e.status()), Json(body))
        }
    }
}

async fn generate_hair(
    State(state): State<AppState>,
    payload: Result<Json<HairEditRequest>, JsonRejection>,
) -> Reply<EditResponse> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };
    tracing::info!(color = %req.color, "hair edit requested");
    let password = req.access_password.clone();
    run_edit(&state, &password, move |upstream| upstream.edit_hair(&req.image, &req.color, &req.prompt)).await
}

async fn generate_fashion(
    State(state): State<AppState>,
    payload: Result<Json<FashionEditRequest>, JsonRejection>,
) -> Reply<EditResponse> {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };
    tracing::info!(target_color = %req.target_color, "fashion edit requested");
    let password = req.access_password.clone();
    run_edit(&state, &password, move |upstream| upstream.edit_fashion(&req.image, &req.target_color)).await
}

/// Authenticate, then run the blocking upstream call off the async runtime.
async fn run_edit<F>(state: &AppState, password: &str, op: F) -> Reply<EditResponse>
where
    F: FnOnce(&dyn Upstream) -> Result<EditedImage, GatewayError> + Send + 'static,
{
    if let Err(e) = state.policy.check(password) {
        tracing::warn!(error = %e, "edit request refused");
        let kind = if e.status() == 401 { ErrorKind::Credential } else { ErrorKind::Configuration };
        return (status(e.status()), Json(EditResponse::failure(kind, e.to_string())));
    }

    let Some(upstream) = state.upstream.clone() else {
        tracing::error!("edit requested but no upstream API key is configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(EditResponse::failure(ErrorKind::Configuration, "Server configuration error: GOOGLE_API_KEY not set.")),
        );
    };

    let outcome = match tokio::task::spawn_blocking(move || op(upstream.as_ref())).await {
        Ok(outcome) => outcome,
        Err(e) => Err(GatewayError::Transport(format!("upstream task failed: {e}"))),
    };

    match outcome {
        Ok(image) => {
            tracing::info!(bytes = image.bytes.len(), mime = %image.mime_type, "edit succeeded");
            (StatusCode::OK, Json(EditResponse::ok(DataUrl::encode(&image.mime_type, &image.bytes))))
        }
        Err(e) => {
            let kind = match &e {
                GatewayError::Parse { snippet, .. } => {
                    tracing::warn!(error = %e, snippet = %snippet, "upstream returned no image");
                    ErrorKind::Parse
                }
                GatewayError::Timeout { .. } => {
                    tracing::warn!(error = %e, "upstream timed out");
                    ErrorKind::Timeout
                }
                GatewayError::Credential(_) => {
                    tracing::error!(error = %e, "upstream rejected the configured API key");
                    ErrorKind::Configuration
                }
                GatewayError::Transport(_) => {
                    tracing::warn!(error = %e, "upstream call failed");
                    ErrorKind::Upstream
                }
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(EditResponse::failure(kind, e.to_string())))
        }
    }
}

fn bad_request(e: JsonRejection) -> Reply<EditResponse> {
    tracing::warn!(error = %e, "malformed request body");
    (StatusCode::BAD_REQUEST, Json(EditResponse::failure(ErrorKind::Request, e.body_text())))
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
