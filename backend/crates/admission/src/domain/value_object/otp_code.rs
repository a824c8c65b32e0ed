//! OTP Code Value Object
//!
//! A six-digit numeric one-time passcode. The plaintext only exists between
//! generation and hand-off to the notifier; storage holds a keyed digest.

use kernel::id::AccountId;
use platform::crypto::{hmac_sha256, random_below};
use std::fmt;

/// Number of digits in a code
pub const OTP_DIGITS: usize = 6;

const OTP_SPACE: u32 = 1_000_000;

#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a code uniformly from `000000..=999999` using the OS CSPRNG.
    pub fn generate() -> Self {
        Self(format!("{:0width$}", random_below(OTP_SPACE), width = OTP_DIGITS))
    }

    /// Parse user input. Surrounding whitespace is ignored; anything other
    /// than exactly six ASCII digits is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == OTP_DIGITS && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// HMAC-SHA-256(key, account id ‖ code). Binding the account id means a
    /// digest copied to another account never matches.
    pub fn digest(&self, key: &[u8], account_id: AccountId) -> [u8; 32] {
        hmac_sha256(key, &[&account_id.as_uuid().as_bytes()[..], self.0.as_bytes()])
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_six_digits() {
        for _ in 0..200 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(OtpCode::parse(" 482913 ").unwrap().as_str(), "482913");
        assert_eq!(OtpCode::parse("000001").unwrap().as_str(), "000001");
        assert!(OtpCode::parse("48291").is_none());
        assert!(OtpCode::parse("4829134").is_none());
        assert!(OtpCode::parse("48a913").is_none());
        assert!(OtpCode::parse("４８２９１３").is_none());
        assert!(OtpCode::parse("").is_none());
    }

    #[test]
    fn test_digest_binds_account() {
        let key = [3u8; 32];
        let code = OtpCode::parse("482913").unwrap();
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(code.digest(&key, a), code.digest(&key, a));
        assert_ne!(code.digest(&key, a), code.digest(&key, b));
        assert_ne!(code.digest(&key, a), code.digest(&[4u8; 32], a));
    }

    #[test]
    fn test_debug_redacts() {
        let code = OtpCode::parse("482913").unwrap();
        assert!(!format!("{code:?}").contains("482913"));
    }
}
