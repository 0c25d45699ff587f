//! Blocking JSON POST shared by the upstream and proxy clients.

use seasonal_core::GatewayError;
use serde::Serialize;
use std::io::Read;
use std::time::Duration;

/// Largest response body read into memory.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Status code and body of a completed exchange, error statuses included.
#[derive(Debug)]
pub(crate) struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST a JSON body. Only transport-level failures become errors; HTTP
/// error statuses come back as a [`Reply`] for the caller to classify.
pub(crate) fn post_json(
    url: &str,
    headers: &[(&str, &str)],
    body: &impl Serialize,
    timeout: Duration,
) -> Result<Reply, GatewayError> {
    let mut request = ureq::post(url).timeout(timeout);
    for (name, value) in headers {
        request = request.set(name, value);
    }

    let response = match request.send_json(body) {
        Ok(resp) => resp,
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(ureq::Error::Transport(t)) => {
            let msg = t.to_string();
            return Err(if msg.contains("timeout") || msg.contains("timed out") {
                GatewayError::Timeout { elapsed_ms: timeout.as_millis() as u64 }
            } else {
                GatewayError::Transport(msg)
            });
        }
    };

    let status = response.status();
    let mut text = String::new();
    response
        .into_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut text)
        .map_err(|e| GatewayError::Transport(format!("reading response body: {e}")))?;

    tracing::debug!(url, status, bytes = text.len(), "upstream replied");
    Ok(Reply { status, body: text })
}
