//! Application Configuration
//!
//! Configuration for the admission application layer. Built once at process
//! start and shared behind an `Arc`.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use platform::crypto::random_key;
use platform::rate_limit::RateLimitConfig;
use platform::transaction::RetryPolicy;

pub use crate::domain::value_object::outgoing_mail::MailTemplate;

/// Domains rejected at sign-up in addition to any configured extras
pub const DEFAULT_DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "guerrillamail.com",
    "sharklasers.com",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "yopmail.com",
    "trashmail.com",
    "getnada.com",
    "dispostable.com",
    "maildrop.cc",
    "throwawaymail.com",
];

/// What to do when a sign-up hook arrives without a usable requester IP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownIpPolicy {
    /// Reject with `FailedPrecondition`
    #[default]
    Deny,
    /// Count against one shared bucket keyed `unknown`
    SharedBucket,
}

impl UnknownIpPolicy {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::SharedBucket => "shared-bucket",
        }
    }
}

impl FromStr for UnknownIpPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deny" => Ok(Self::Deny),
            "shared-bucket" | "shared_bucket" => Ok(Self::SharedBucket),
            other => Err(format!("unknown policy `{other}` (expected deny or shared-bucket)")),
        }
    }
}

/// How long stale rows are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    /// OTP records, measured from creation
    pub otp_records: Duration,
    /// Counters, measured from window start
    pub counters: Duration,
    /// Interval between background purges
    pub purge_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            otp_records: Duration::from_secs(7 * 24 * 3600),
            counters: Duration::from_secs(7 * 24 * 3600),
            purge_interval: Duration::from_secs(3600),
        }
    }
}

/// Admission application configuration
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Sign-ups per requester IP
    pub signup_limit: RateLimitConfig,
    /// OTP issuances per account
    pub otp_limit: RateLimitConfig,
    /// Code lifetime
    pub otp_ttl: Duration,
    /// How many recent records verification looks at
    pub otp_lookup_limit: u32,
    /// Upper bound on one notifier call
    pub notifier_timeout: Duration,
    pub unknown_ip_policy: UnknownIpPolicy,
    /// Lowercase domains; subdomains match too
    pub disposable_domains: HashSet<String>,
    /// Application ids accepted in client attestations
    pub attestation_app_ids: HashSet<String>,
    /// Session token secret (32 bytes)
    pub session_secret: [u8; 32],
    /// Attestation token secret (32 bytes)
    pub attestation_secret: [u8; 32],
    /// Hook request signing secret (32 bytes)
    pub hook_secret: [u8; 32],
    /// OTP digest key (32 bytes)
    pub code_hash_key: [u8; 32],
    /// IP counter key (32 bytes)
    pub ip_hash_key: [u8; 32],
    pub otp_mail: MailTemplate,
    pub retention: RetentionConfig,
    /// Retry budget for store transaction conflicts
    pub store_retry: RetryPolicy,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            signup_limit: RateLimitConfig::new(3, 24 * 3600),
            otp_limit: RateLimitConfig::new(3, 3600),
            otp_ttl: Duration::from_secs(10 * 60),
            otp_lookup_limit: 10,
            notifier_timeout: Duration::from_secs(10),
            unknown_ip_policy: UnknownIpPolicy::Deny,
            disposable_domains: DEFAULT_DISPOSABLE_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            attestation_app_ids: HashSet::new(),
            session_secret: [0u8; 32],
            attestation_secret: [0u8; 32],
            hook_secret: [0u8; 32],
            code_hash_key: [0u8; 32],
            ip_hash_key: [0u8; 32],
            otp_mail: MailTemplate::default(),
            retention: RetentionConfig::default(),
            store_retry: RetryPolicy::default(),
        }
    }
}

impl AdmissionConfig {
    /// Create config with random secrets (for development and tests)
    pub fn with_random_secrets() -> Self {
        Self {
            session_secret: random_key(),
            attestation_secret: random_key(),
            hook_secret: random_key(),
            code_hash_key: random_key(),
            ip_hash_key: random_key(),
            ..Default::default()
        }
    }

    /// Create config for development: random secrets, `dev` app id accepted
    pub fn development() -> Self {
        Self {
            attestation_app_ids: ["dev".to_string()].into_iter().collect(),
            ..Self::with_random_secrets()
        }
    }

    /// Add extra denylisted domains (normalized to lowercase)
    pub fn extend_disposable_domains<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disposable_domains.extend(
            domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|d| !d.is_empty()),
        );
    }

    pub fn otp_ttl_ms(&self) -> i64 {
        self.otp_ttl.as_millis() as i64
    }

    /// Whole minutes shown in the mail (rounded up)
    pub fn otp_ttl_minutes(&self) -> u64 {
        self.otp_ttl.as_secs().div_ceil(60)
    }

    /// Counter retention, never shorter than the longest live window
    pub fn counter_retention(&self) -> Duration {
        self.retention
            .counters
            .max(self.signup_limit.window)
            .max(self.otp_limit.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdmissionConfig::default();
        assert_eq!(config.signup_limit.max_requests, 3);
        assert_eq!(config.signup_limit.window, Duration::from_secs(86_400));
        assert_eq!(config.otp_limit.max_requests, 3);
        assert_eq!(config.otp_limit.window, Duration::from_secs(3_600));
        assert_eq!(config.otp_ttl_ms(), 600_000);
        assert_eq!(config.otp_ttl_minutes(), 10);
        assert_eq!(config.otp_lookup_limit, 10);
        assert_eq!(config.unknown_ip_policy, UnknownIpPolicy::Deny);
        assert!(config.disposable_domains.contains("mailinator.com"));
        assert!(config.attestation_app_ids.is_empty());
    }

    #[test]
    fn test_random_secrets_are_distinct() {
        let config = AdmissionConfig::with_random_secrets();
        assert_ne!(config.session_secret, [0u8; 32]);
        assert_ne!(config.session_secret, config.attestation_secret);
        assert_ne!(config.code_hash_key, config.ip_hash_key);
        assert!(AdmissionConfig::development().attestation_app_ids.contains("dev"));
    }

    #[test]
    fn test_counter_retention_is_clamped() {
        let mut config = AdmissionConfig::default();
        config.retention.counters = Duration::from_secs(60);
        assert_eq!(config.counter_retention(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_extend_disposable_domains() {
        let mut config = AdmissionConfig::default();
        config.extend_disposable_domains([" Spam.Example ", "@junk.test", ""]);
        assert!(config.disposable_domains.contains("spam.example"));
        assert!(config.disposable_domains.contains("junk.test"));
        assert!(!config.disposable_domains.contains(""));
    }

    #[test]
    fn test_unknown_ip_policy_parse() {
        assert_eq!("deny".parse(), Ok(UnknownIpPolicy::Deny));
        assert_eq!("Shared-Bucket".parse(), Ok(UnknownIpPolicy::SharedBucket));
        assert!("allow".parse::<UnknownIpPolicy>().is_err());
        assert_eq!(UnknownIpPolicy::SharedBucket.code(), "shared-bucket");
    }
}
