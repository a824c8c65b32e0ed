//! Repository Traits
//!
//! Interfaces for persistence and external collaborators. Implementations
//! are in the infrastructure layer.

use kernel::id::{AccountId, OtpRecordId, TenantId};
use platform::rate_limit::{RateLimitConfig, RateLimitResult};

use crate::domain::entity::{account::Account, otp_record::OtpRecord, tenant::Tenant};
use crate::domain::services::ActivationOutcome;
use crate::domain::value_object::claims::Claims;
use crate::domain::value_object::counter_key::CounterKey;
use crate::domain::value_object::outgoing_mail::OutgoingMail;
use crate::error::AdmissionResult;

/// Keyed fixed-window counter
#[trait_variant::make(AtomicCounter: Send)]
pub trait LocalAtomicCounter {
    /// Read, advance and write the counter as one atomic unit.
    /// A denial is reported as `allowed == false`, not as an error.
    async fn consume(
        &self,
        key: &CounterKey,
        limit: &RateLimitConfig,
        now_ms: i64,
    ) -> AdmissionResult<RateLimitResult>;
}

/// Account and tenant repository
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    async fn find_account(&self, account_id: AccountId) -> AdmissionResult<Option<Account>>;

    async fn find_tenant(&self, tenant_id: TenantId) -> AdmissionResult<Option<Tenant>>;

    /// Create an account and its tenant together
    async fn create_account(&self, account: &Account, tenant: Option<&Tenant>)
    -> AdmissionResult<()>;

    /// In one transaction: mark the OTP record used (only if it is still
    /// unused and unexpired at `now_ms`), activate the account and its
    /// tenant. Nothing is written unless the record was consumed.
    async fn activate(
        &self,
        account_id: AccountId,
        record_id: OtpRecordId,
        now_ms: i64,
    ) -> AdmissionResult<ActivationOutcome>;
}

/// OTP record repository
#[trait_variant::make(OtpRecordRepository: Send)]
pub trait LocalOtpRecordRepository {
    async fn insert_record(&self, record: &OtpRecord) -> AdmissionResult<()>;

    /// Most recent records for the account, newest first
    async fn find_recent_records(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> AdmissionResult<Vec<OtpRecord>>;
}

/// Retention repository
#[trait_variant::make(RetentionRepository: Send)]
pub trait LocalRetentionRepository {
    /// Delete OTP records created before the cutoff
    async fn purge_otp_records(&self, created_before_ms: i64) -> AdmissionResult<u64>;

    /// Delete counters whose window started before the cutoff
    async fn purge_counters(&self, window_started_before_ms: i64) -> AdmissionResult<u64>;
}

/// Mail delivery
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    async fn send(&self, mail: &OutgoingMail) -> AdmissionResult<()>;
}

/// Identity provider admin API
#[trait_variant::make(ClaimsIssuer: Send)]
pub trait LocalClaimsIssuer {
    /// Replace (not merge) the identity's custom claims
    async fn replace_claims(&self, account_id: AccountId, claims: &Claims) -> AdmissionResult<()>;
}

/// Everything the admission flow needs from one store
pub trait AdmissionStore:
    AtomicCounter
    + AccountRepository
    + OtpRecordRepository
    + RetentionRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> AdmissionStore for T where
    T: AtomicCounter
        + AccountRepository
        + OtpRecordRepository
        + RetentionRepository
        + Send
        + Sync
        + 'static
{
}
