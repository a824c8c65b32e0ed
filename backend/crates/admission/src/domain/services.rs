//! Domain Services
//!
//! Pure policy functions shared by the use cases and the store adapters.

use std::collections::HashSet;

use platform::transaction::TxOutcome;

use crate::domain::entity::account::Account;
use crate::domain::value_object::email::Email;

/// True if the email's domain, or any parent domain, is denylisted.
pub fn is_disposable(email: &Email, denylist: &HashSet<String>) -> bool {
    email.domain_suffixes().any(|d| denylist.contains(d))
}

/// Writes committed by a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPlan {
    /// Account as it should look after commit
    pub account: Account,
    /// `false` when the account was already active and is left untouched
    pub newly_activated: bool,
}

/// Why an activation transaction rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationAbort {
    /// Record already used or expired (a concurrent verification won)
    CodeUnavailable,
    /// Account record vanished
    AccountMissing,
}

/// Result of the activation transaction, as reported by a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated(Account),
    AlreadyActive(Account),
    CodeUnavailable,
    AccountMissing,
}

impl ActivationOutcome {
    pub fn from_tx(outcome: TxOutcome<ActivationPlan, ActivationAbort>) -> Self {
        match outcome {
            TxOutcome::Commit(plan) if plan.newly_activated => Self::Activated(plan.account),
            TxOutcome::Commit(plan) => Self::AlreadyActive(plan.account),
            TxOutcome::Abort(ActivationAbort::CodeUnavailable) => Self::CodeUnavailable,
            TxOutcome::Abort(ActivationAbort::AccountMissing) => Self::AccountMissing,
        }
    }
}

/// Activation transaction body.
///
/// `code_consumed` is whether the conditional `used = false -> true` update
/// of the record hit a row. Tenant activation follows `plan.account.tenant_id`
/// when `newly_activated`.
pub fn plan_activation(
    code_consumed: bool,
    account: Option<Account>,
    now_ms: i64,
) -> TxOutcome<ActivationPlan, ActivationAbort> {
    if !code_consumed {
        return TxOutcome::Abort(ActivationAbort::CodeUnavailable);
    }
    let Some(mut account) = account else {
        return TxOutcome::Abort(ActivationAbort::AccountMissing);
    };
    let newly_activated = account.activate(now_ms);
    TxOutcome::Commit(ActivationPlan {
        account,
        newly_activated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::{AccountId, TenantId};

    fn denylist() -> HashSet<String> {
        ["mailinator.com".to_string()].into_iter().collect()
    }

    #[test]
    fn test_disposable_matches_parent_domains() {
        let list = denylist();
        assert!(is_disposable(&Email::new("user@mailinator.com").unwrap(), &list));
        assert!(is_disposable(&Email::new("user@eu.mailinator.com").unwrap(), &list));
        assert!(!is_disposable(&Email::new("user@notmailinator.com").unwrap(), &list));
        assert!(!is_disposable(&Email::new("user@example.com").unwrap(), &list));
    }

    #[test]
    fn test_plan_activates_pending_account() {
        let tenant_id = TenantId::new();
        let account = Account::pending(AccountId::new(), None, Some(tenant_id), 0);

        match plan_activation(true, Some(account), 500) {
            TxOutcome::Commit(plan) => {
                assert!(plan.newly_activated);
                assert!(plan.account.active);
                assert_eq!(plan.account.activated_at_ms, Some(500));
                assert_eq!(plan.account.tenant_id, Some(tenant_id));
            }
            TxOutcome::Abort(abort) => panic!("unexpected abort: {abort:?}"),
        }
    }

    #[test]
    fn test_plan_keeps_already_active_account() {
        let mut account = Account::pending(AccountId::new(), None, None, 0);
        account.activate(100);

        let outcome = ActivationOutcome::from_tx(plan_activation(true, Some(account.clone()), 900));
        assert_eq!(outcome, ActivationOutcome::AlreadyActive(account));
    }

    #[test]
    fn test_plan_aborts_without_code() {
        let account = Account::pending(AccountId::new(), None, None, 0);
        assert_eq!(
            plan_activation(false, Some(account), 0),
            TxOutcome::Abort(ActivationAbort::CodeUnavailable)
        );
        assert_eq!(
            plan_activation(true, None, 0),
            TxOutcome::Abort(ActivationAbort::AccountMissing)
        );
    }
}
