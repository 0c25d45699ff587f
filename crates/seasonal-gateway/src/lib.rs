//! seasonal-gateway — Remote image-edit clients.
//!
//! Speaks the generative-image API directly ([`GeminiClient`]) or through
//! the `seasonald` proxy ([`ProxyClient`]). Both implement
//! [`seasonal_core::EditGateway`].

pub mod auth;
pub mod data_url;
pub mod extract;
pub mod gemini;
mod http;
pub mod proxy;
pub mod wire;

pub use auth::{AccessPolicy, AuthError};
pub use data_url::{DataUrl, DataUrlError};
pub use extract::extract_image;
pub use gemini::GeminiClient;
pub use proxy::ProxyClient;
pub use wire::{EditResponse, ErrorKind, FashionEditRequest, HairEditRequest, VerifyRequest, VerifyResponse};
