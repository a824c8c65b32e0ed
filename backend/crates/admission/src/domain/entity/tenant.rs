//! Tenant Entity

use serde::{Deserialize, Serialize};
use std::fmt;

use kernel::id::TenantId;

/// Tenant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum TenantStatus {
    /// Created at sign-up, owner not yet verified
    #[default]
    Pending = 0,

    /// Owner verified; terminal
    Active = 1,
}

impl TenantStatus {
    /// Get numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub tenant_id: TenantId,
    pub status: TenantStatus,
    pub created_at_ms: i64,
}

impl Tenant {
    pub fn pending(now_ms: i64) -> Self {
        Self {
            tenant_id: TenantId::new(),
            status: TenantStatus::Pending,
            created_at_ms: now_ms,
        }
    }

    /// Returns `false` if the tenant was already active.
    pub fn activate(&mut self) -> bool {
        if self.status == TenantStatus::Active {
            return false;
        }
        self.status = TenantStatus::Active;
        true
    }
}
