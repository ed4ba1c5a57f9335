use crate::error::ProxyError;
use actix_web::http::header::{self, HeaderMap};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

fn digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Shared-secret bearer check against the `Authorization` header.
/// Only the hash of `"Bearer " + secret` is kept.
#[derive(Clone)]
pub struct BearerAuth {
    expected_hash: [u8; 32],
}

impl BearerAuth {
    pub fn new(secret: &str) -> Self {
        BearerAuth {
            expected_hash: digest(format!("Bearer {}", secret).as_bytes()),
        }
    }

    /// Byte-exact, constant-time comparison of the raw header bytes.
    /// Scheme and secret are both case-sensitive.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ProxyError> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .map(|v| v.as_bytes())
            .unwrap_or(b"");
        let matched: bool = self.expected_hash[..].ct_eq(&digest(presented)[..]).into();
        if matched {
            Ok(())
        } else {
            Err(ProxyError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}
