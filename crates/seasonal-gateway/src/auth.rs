//! Shared-password access control for the proxy.

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Server configuration error: access password not set.")]
    NotConfigured,
    #[error("Invalid access password.")]
    Rejected,
}

impl AuthError {
    /// HTTP status the proxy answers with.
    pub fn status(&self) -> u16 {
        match self {
            AuthError::NotConfigured => 500,
            AuthError::Rejected => 401,
        }
    }
}

/// Holds only the SHA-256 digest of the configured password.
#[derive(Clone)]
pub struct AccessPolicy {
    digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy").field("configured", &self.is_configured()).finish()
    }
}

impl AccessPolicy {
    /// An empty password counts as unconfigured.
    pub fn new(password: Option<&str>) -> Self {
        Self { digest: password.filter(|p| !p.is_empty()).map(digest) }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn check(&self, candidate: &str) -> Result<(), AuthError> {
        let expected = self.digest.ok_or(AuthError::NotConfigured)?;
        let actual = digest(candidate);
        // Constant time over all 32 bytes.
        let diff = expected.iter().zip(actual.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff == 0 {
            Ok(())
        } else {
            Err(AuthError::Rejected)
        }
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}
