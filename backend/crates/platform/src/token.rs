//! Signed bearer tokens
//!
//! Format: `base64url(subject ":" expires_at_ms) "." base64url(HMAC-SHA-256)`.
//! The MAC covers the encoded payload segment exactly as transmitted.

use crate::crypto::{constant_time_eq, from_base64url, hmac_sha256, to_base64url};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
}

/// Issue a token for `subject` valid until `expires_at_ms` (inclusive).
pub fn issue(secret: &[u8], subject: &str, expires_at_ms: i64) -> String {
    let payload = to_base64url(format!("{subject}:{expires_at_ms}").as_bytes());
    let signature = hmac_sha256(secret, &[payload.as_bytes()]);
    format!("{payload}.{}", to_base64url(&signature))
}

/// Verify a token and return its subject.
pub fn verify(secret: &[u8], token: &str, now_ms: i64) -> Result<String, TokenError> {
    let (payload, signature_b64) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;

    let signature = from_base64url(signature_b64).map_err(|_| TokenError::Malformed)?;
    let expected = hmac_sha256(secret, &[payload.as_bytes()]);
    if !constant_time_eq(&signature, &expected) {
        return Err(TokenError::BadSignature);
    }

    let decoded = from_base64url(payload).map_err(|_| TokenError::Malformed)?;
    let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;
    let (subject, expires_at) = decoded.rsplit_once(':').ok_or(TokenError::Malformed)?;
    let expires_at_ms: i64 = expires_at.parse().map_err(|_| TokenError::Malformed)?;

    if subject.is_empty() {
        return Err(TokenError::Malformed);
    }
    if now_ms > expires_at_ms {
        return Err(TokenError::Expired);
    }
    Ok(subject.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [9u8; 32];

    #[test]
    fn test_issue_and_verify() {
        let token = issue(&SECRET, "app:web", 10_000);
        assert_eq!(verify(&SECRET, &token, 10_000).unwrap(), "app:web");
    }

    #[test]
    fn test_expired_token() {
        let token = issue(&SECRET, "u1", 10_000);
        assert_eq!(verify(&SECRET, &token, 10_001), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue(&SECRET, "u1", 10_000);
        assert_eq!(
            verify(&[1u8; 32], &token, 0),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let token = issue(&SECRET, "u1", 10_000);
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", to_base64url(b"u2:10000"), signature);
        assert_eq!(verify(&SECRET, &forged, 0), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(verify(&SECRET, "no-dot", 0), Err(TokenError::Malformed));
        assert_eq!(verify(&SECRET, "a.!!!", 0), Err(TokenError::Malformed));
    }
}
