//! OTP Record Entity

use kernel::id::{AccountId, OtpRecordId};
use platform::crypto::constant_time_eq;

/// One issued code. Only the keyed digest of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: OtpRecordId,
    pub account_id: AccountId,
    pub code_hash: [u8; 32],
    /// Last instant (inclusive) at which the code is accepted
    pub expires_at_ms: i64,
    pub used: bool,
    pub created_at_ms: i64,
}

impl OtpRecord {
    pub fn issue(account_id: AccountId, code_hash: [u8; 32], now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            id: OtpRecordId::new(),
            account_id,
            code_hash,
            expires_at_ms: now_ms + ttl_ms,
            used: false,
            created_at_ms: now_ms,
        }
    }

    /// Unused and `now <= expires_at`
    pub fn is_usable(&self, now_ms: i64) -> bool {
        !self.used && now_ms <= self.expires_at_ms
    }

    /// Usable and the digest matches (compared in constant time).
    pub fn matches(&self, code_hash: &[u8; 32], now_ms: i64) -> bool {
        // Compare first so timing does not depend on record state.
        let same = constant_time_eq(&self.code_hash, code_hash);
        same && self.is_usable(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: i64 = 10 * 60 * 1000;

    #[test]
    fn test_issue_sets_expiry() {
        let record = OtpRecord::issue(AccountId::new(), [1u8; 32], 1_000, TTL);
        assert_eq!(record.expires_at_ms, 1_000 + TTL);
        assert_eq!(record.created_at_ms, 1_000);
        assert!(!record.used);
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let record = OtpRecord::issue(AccountId::new(), [1u8; 32], 0, TTL);
        assert!(record.matches(&[1u8; 32], TTL - 1_000));
        assert!(record.matches(&[1u8; 32], TTL));
        assert!(!record.matches(&[1u8; 32], TTL + 1));
    }

    #[test]
    fn test_used_or_wrong_hash_never_matches() {
        let mut record = OtpRecord::issue(AccountId::new(), [1u8; 32], 0, TTL);
        assert!(!record.matches(&[2u8; 32], 0));
        record.used = true;
        assert!(!record.matches(&[1u8; 32], 0));
    }
}
