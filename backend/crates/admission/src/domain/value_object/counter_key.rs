//! Counter Keys
//!
//! Both rate limits live in one counter table, partitioned by scope.

use kernel::id::AccountId;
use platform::crypto::{hmac_sha256, to_hex};
use std::fmt;
use std::net::IpAddr;

/// Key used when the requester IP is unknown and the shared bucket applies
pub const UNKNOWN_IP_KEY: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterScope {
    /// Sign-up attempts per requester IP
    SignupIp,
    /// OTP issuances per account
    OtpAccount,
}

impl CounterScope {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SignupIp => "signup_ip",
            Self::OtpAccount => "otp_account",
        }
    }
}

impl fmt::Display for CounterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub scope: CounterScope,
    pub key: String,
}

impl CounterKey {
    /// Per-IP sign-up key. The raw address is never stored: the key is the
    /// hex HMAC of its canonical text form.
    pub fn signup_ip(ip: IpAddr, ip_hash_key: &[u8]) -> Self {
        let digest = hmac_sha256(ip_hash_key, &[ip.to_string().as_bytes()]);
        Self {
            scope: CounterScope::SignupIp,
            key: to_hex(&digest),
        }
    }

    /// Shared bucket for requests whose IP is unknown
    pub fn signup_unknown_ip() -> Self {
        Self {
            scope: CounterScope::SignupIp,
            key: UNKNOWN_IP_KEY.to_string(),
        }
    }

    pub fn otp_account(account_id: AccountId) -> Self {
        Self {
            scope: CounterScope::OtpAccount,
            key: account_id.to_string(),
        }
    }
}
