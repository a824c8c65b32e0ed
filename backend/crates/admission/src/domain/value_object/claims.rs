//! Identity Claims
//!
//! The claim set written to the identity provider after verification, and
//! the check applied to the claim set presented at sign-in.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::entity::account::Account;

/// Tier assumed when the account has none
pub const DEFAULT_TIER: &str = "free";

/// Claim name that marks an identity as blocked
pub const BLOCKED_CLAIM: &str = "blocked";

/// Complete claim set. Writing it replaces whatever the identity had before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub active: bool,
    pub tier: String,
}

impl Claims {
    /// Claims for an account that has just proven its email.
    pub fn for_verified(account: &Account) -> Self {
        Self {
            role: account.role.clone(),
            active: true,
            tier: account
                .tier
                .clone()
                .unwrap_or_else(|| DEFAULT_TIER.to_string()),
        }
    }
}

/// Only a boolean `true` blocks; `"true"`, `1` and absent do not.
pub fn is_blocked(claims: &Map<String, Value>) -> bool {
    matches!(claims.get(BLOCKED_CLAIM), Some(Value::Bool(true)))
}
