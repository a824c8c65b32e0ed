//! In-Memory Repository
//!
//! Single-process store used by tests and local runs without a database.
//! One async mutex guards all state, so every operation is a serialized
//! transaction running the same bodies as the PostgreSQL adapter.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::{AccountId, OtpRecordId, TenantId};
use platform::rate_limit::{RateLimitConfig, RateLimitResult, WindowState, advance};
use platform::transaction::TxOutcome;
use tokio::sync::Mutex;

use crate::domain::entity::{account::Account, otp_record::OtpRecord, tenant::Tenant};
use crate::domain::repository::{
    AccountRepository, AtomicCounter, OtpRecordRepository, RetentionRepository,
};
use crate::domain::services::{ActivationOutcome, plan_activation};
use crate::domain::value_object::counter_key::CounterKey;
use crate::error::{AdmissionError, AdmissionResult};

#[derive(Debug, Default)]
struct MemoryState {
    counters: HashMap<CounterKey, WindowState>,
    accounts: HashMap<AccountId, Account>,
    tenants: HashMap<TenantId, Tenant>,
    otp_records: HashMap<OtpRecordId, OtpRecord>,
}

/// In-memory repository
#[derive(Debug, Clone, Default)]
pub struct MemoryAdmissionRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAdmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a counter
    pub async fn counter(&self, key: &CounterKey) -> Option<WindowState> {
        self.state.lock().await.counters.get(key).copied()
    }

    /// All records of an account, in no particular order
    pub async fn records_of(&self, account_id: AccountId) -> Vec<OtpRecord> {
        self.state
            .lock()
            .await
            .otp_records
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect()
    }
}

impl AtomicCounter for MemoryAdmissionRepository {
    async fn consume(
        &self,
        key: &CounterKey,
        limit: &RateLimitConfig,
        now_ms: i64,
    ) -> AdmissionResult<RateLimitResult> {
        let mut state = self.state.lock().await;
        let current = state.counters.get(key).copied();
        match advance(current, now_ms, limit) {
            TxOutcome::Commit(next) => {
                state.counters.insert(key.clone(), next);
                Ok(next.admitted(limit))
            }
            TxOutcome::Abort(denied) => Ok(denied),
        }
    }
}

impl AccountRepository for MemoryAdmissionRepository {
    async fn find_account(&self, account_id: AccountId) -> AdmissionResult<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AdmissionResult<Option<Tenant>> {
        Ok(self.state.lock().await.tenants.get(&tenant_id).cloned())
    }

    async fn create_account(
        &self,
        account: &Account,
        tenant: Option<&Tenant>,
    ) -> AdmissionResult<()> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&account.account_id) {
            return Err(AdmissionError::Internal(format!(
                "account {} already exists",
                account.account_id
            )));
        }
        if let Some(tenant) = tenant {
            state.tenants.insert(tenant.tenant_id, tenant.clone());
        }
        state.accounts.insert(account.account_id, account.clone());
        Ok(())
    }

    async fn activate(
        &self,
        account_id: AccountId,
        record_id: OtpRecordId,
        now_ms: i64,
    ) -> AdmissionResult<ActivationOutcome> {
        let mut state = self.state.lock().await;

        let code_consumed = state
            .otp_records
            .get(&record_id)
            .is_some_and(|r| r.account_id == account_id && r.is_usable(now_ms));
        let account = state.accounts.get(&account_id).cloned();

        let outcome = plan_activation(code_consumed, account, now_ms);
        if let TxOutcome::Commit(plan) = &outcome {
            if let Some(record) = state.otp_records.get_mut(&record_id) {
                record.used = true;
            }
            if plan.newly_activated {
                if let Some(tenant) = plan
                    .account
                    .tenant_id
                    .and_then(|id| state.tenants.get_mut(&id))
                {
                    tenant.activate();
                }
                state.accounts.insert(account_id, plan.account.clone());
            }
        }
        Ok(ActivationOutcome::from_tx(outcome))
    }
}

impl OtpRecordRepository for MemoryAdmissionRepository {
    async fn insert_record(&self, record: &OtpRecord) -> AdmissionResult<()> {
        self.state
            .lock()
            .await
            .otp_records
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn find_recent_records(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> AdmissionResult<Vec<OtpRecord>> {
        let mut records = self.records_of(account_id).await;
        records.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        records.truncate(limit as usize);
        Ok(records)
    }
}

impl RetentionRepository for MemoryAdmissionRepository {
    async fn purge_otp_records(&self, created_before_ms: i64) -> AdmissionResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.otp_records.len();
        state
            .otp_records
            .retain(|_, r| r.created_at_ms >= created_before_ms);
        Ok((before - state.otp_records.len()) as u64)
    }

    async fn purge_counters(&self, window_started_before_ms: i64) -> AdmissionResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.counters.len();
        state
            .counters
            .retain(|_, c| c.window_start_ms >= window_started_before_ms);
        Ok((before - state.counters.len()) as u64)
    }
}
