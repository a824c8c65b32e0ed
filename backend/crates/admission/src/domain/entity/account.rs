//! Account Entity
//!
//! The product-side record of an identity. Its id is the identity
//! provider's uid.

use kernel::id::{AccountId, TenantId};

use crate::domain::value_object::email::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: AccountId,
    /// Registered email (absent for identities without one, e.g. phone sign-up)
    pub email: Option<Email>,
    pub role: Option<String>,
    pub tier: Option<String>,
    /// Tenant created together with the account, if any
    pub tenant_id: Option<TenantId>,
    /// Flips false to true exactly once, on first successful verification
    pub active: bool,
    pub activated_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

impl Account {
    /// New account awaiting email verification
    pub fn pending(
        account_id: AccountId,
        email: Option<Email>,
        tenant_id: Option<TenantId>,
        now_ms: i64,
    ) -> Self {
        Self {
            account_id,
            email,
            role: None,
            tier: None,
            tenant_id,
            active: false,
            activated_at_ms: None,
            created_at_ms: now_ms,
        }
    }

    /// Mark active. Returns `false` (and changes nothing) if already active.
    pub fn activate(&mut self, now_ms: i64) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.activated_at_ms = Some(now_ms);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activate_once() {
        let mut account = Account::pending(AccountId::new(), None, None, 0);
        assert!(account.activate(100));
        assert!(account.active);
        assert_eq!(account.activated_at_ms, Some(100));

        assert!(!account.activate(200));
        assert_eq!(account.activated_at_ms, Some(100));
    }
}
