//! `data:<mime>;base64,<payload>` encoding and decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("data URL is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// `None` when the input was a bare base64 payload.
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl DataUrl {
    pub fn encode(mime_type: &str, data: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", STANDARD.encode(data))
    }

    /// Parse a data URL. A bare base64 payload without the `data:` header
    /// is accepted too.
    pub fn parse(input: &str) -> Result<Self, DataUrlError> {
        let input = input.trim();
        let (mime_type, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or(DataUrlError::NotBase64)?;
                let mime = header.strip_suffix(";base64").ok_or(DataUrlError::NotBase64)?;
                (Some(mime.to_string()).filter(|m| !m.is_empty()), payload)
            }
            None => (None, input),
        };
        Ok(Self { mime_type, data: STANDARD.decode(payload)? })
    }
}

/// Strip a leading `data:image/<type>;base64,` header, if any.
pub fn strip_image_prefix(input: &str) -> &str {
    input
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .filter(|(subtype, _)| subtype.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .map(|(_, payload)| payload)
        .unwrap_or(input)
}
