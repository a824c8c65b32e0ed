//! PostgreSQL Repository Implementations
//!
//! Every read-check-write runs in a `SERIALIZABLE` transaction with row
//! locks. Serialization failures, deadlocks and unique-key races are retried
//! by `retry_on_conflict`; everything else is returned as is.

use kernel::id::{AccountId, OtpRecordId, TenantId};
use platform::rate_limit::{RateLimitConfig, RateLimitResult, WindowState, advance};
use platform::transaction::{RetryPolicy, TxOutcome, retry_on_conflict};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entity::{
    account::Account,
    otp_record::OtpRecord,
    tenant::{Tenant, TenantStatus},
};
use crate::domain::repository::{
    AccountRepository, AtomicCounter, OtpRecordRepository, RetentionRepository,
};
use crate::domain::services::{ActivationOutcome, plan_activation};
use crate::domain::value_object::counter_key::CounterKey;
use crate::domain::value_object::email::Email;
use crate::error::{AdmissionError, AdmissionResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgAdmissionRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgAdmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self::with_retry(pool, RetryPolicy::default())
    }

    pub fn with_retry(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    async fn begin_serializable(&self) -> AdmissionResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn consume_once(
        &self,
        key: &CounterKey,
        limit: &RateLimitConfig,
        now_ms: i64,
    ) -> AdmissionResult<RateLimitResult> {
        let mut tx = self.begin_serializable().await?;

        let current = sqlx::query_as::<_, (i32, i64)>(
            r#"
            SELECT request_count, window_start_ms
            FROM rate_counters
            WHERE counter_scope = $1 AND counter_key = $2
            FOR UPDATE
            "#,
        )
        .bind(key.scope.code())
        .bind(&key.key)
        .fetch_optional(&mut *tx)
        .await?
        .map(|(count, window_start_ms)| WindowState {
            count: count.max(0) as u32,
            window_start_ms,
        });

        match advance(current, now_ms, limit) {
            TxOutcome::Commit(next) => {
                sqlx::query(
                    r#"
                    INSERT INTO rate_counters
                        (counter_scope, counter_key, request_count, window_start_ms)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (counter_scope, counter_key)
                    DO UPDATE SET
                        request_count = EXCLUDED.request_count,
                        window_start_ms = EXCLUDED.window_start_ms
                    "#,
                )
                .bind(key.scope.code())
                .bind(&key.key)
                .bind(next.count as i32)
                .bind(next.window_start_ms)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                Ok(next.admitted(limit))
            }
            TxOutcome::Abort(denied) => {
                tx.rollback().await?;
                Ok(denied)
            }
        }
    }

    async fn activate_once(
        &self,
        account_id: AccountId,
        record_id: OtpRecordId,
        now_ms: i64,
    ) -> AdmissionResult<ActivationOutcome> {
        let mut tx = self.begin_serializable().await?;

        // Conditional single-use transition: only one transaction can flip it.
        let code_consumed = sqlx::query(
            r#"
            UPDATE otp_records
            SET used = TRUE
            WHERE otp_record_id = $1
              AND account_id = $2
              AND used = FALSE
              AND expires_at_ms >= $3
            "#,
        )
        .bind(record_id.into_uuid())
        .bind(account_id.into_uuid())
        .bind(now_ms)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let account = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT account_id, email, account_role, account_tier, tenant_id,
                   active, activated_at_ms, created_at_ms
            FROM accounts
            WHERE account_id = $1
            FOR UPDATE
            "#,
        )
        .bind(account_id.into_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .map(AccountRow::into_account);

        let outcome = plan_activation(code_consumed, account, now_ms);
        match &outcome {
            TxOutcome::Commit(plan) => {
                if plan.newly_activated {
                    sqlx::query(
                        r#"
                        UPDATE accounts SET active = TRUE, activated_at_ms = $2
                        WHERE account_id = $1
                        "#,
                    )
                    .bind(account_id.into_uuid())
                    .bind(plan.account.activated_at_ms)
                    .execute(&mut *tx)
                    .await?;

                    if let Some(tenant_id) = plan.account.tenant_id {
                        sqlx::query(
                            r#"
                            UPDATE tenants SET tenant_status = $2
                            WHERE tenant_id = $1 AND tenant_status = $3
                            "#,
                        )
                        .bind(tenant_id.into_uuid())
                        .bind(TenantStatus::Active.id())
                        .bind(TenantStatus::Pending.id())
                        .execute(&mut *tx)
                        .await?;
                    }
                }
                tx.commit().await?;
            }
            TxOutcome::Abort(_) => {
                tx.rollback().await?;
            }
        }

        Ok(ActivationOutcome::from_tx(outcome))
    }
}

impl AtomicCounter for PgAdmissionRepository {
    async fn consume(
        &self,
        key: &CounterKey,
        limit: &RateLimitConfig,
        now_ms: i64,
    ) -> AdmissionResult<RateLimitResult> {
        let this = self;
        retry_on_conflict(&self.retry, move || this.consume_once(key, limit, now_ms)).await
    }
}

impl AccountRepository for PgAdmissionRepository {
    async fn find_account(&self, account_id: AccountId) -> AdmissionResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT account_id, email, account_role, account_tier, tenant_id,
                   active, activated_at_ms, created_at_ms
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_account))
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AdmissionResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, TenantRow>(
            "SELECT tenant_id, tenant_status, created_at_ms FROM tenants WHERE tenant_id = $1",
        )
        .bind(tenant_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TenantRow::into_tenant).transpose()
    }

    async fn create_account(
        &self,
        account: &Account,
        tenant: Option<&Tenant>,
    ) -> AdmissionResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(tenant) = tenant {
            sqlx::query(
                "INSERT INTO tenants (tenant_id, tenant_status, created_at_ms) VALUES ($1, $2, $3)",
            )
            .bind(tenant.tenant_id.into_uuid())
            .bind(tenant.status.id())
            .bind(tenant.created_at_ms)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id, email, account_role, account_tier, tenant_id,
                active, activated_at_ms, created_at_ms
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.account_id.into_uuid())
        .bind(account.email.as_ref().map(|e| e.as_str().to_string()))
        .bind(&account.role)
        .bind(&account.tier)
        .bind(account.tenant_id.map(TenantId::into_uuid))
        .bind(account.active)
        .bind(account.activated_at_ms)
        .bind(account.created_at_ms)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            account_id = %account.account_id,
            tenant_id = ?account.tenant_id,
            "Account created"
        );

        Ok(())
    }

    async fn activate(
        &self,
        account_id: AccountId,
        record_id: OtpRecordId,
        now_ms: i64,
    ) -> AdmissionResult<ActivationOutcome> {
        let this = self;
        retry_on_conflict(&self.retry, move || {
            this.activate_once(account_id, record_id, now_ms)
        })
        .await
    }
}

impl OtpRecordRepository for PgAdmissionRepository {
    async fn insert_record(&self, record: &OtpRecord) -> AdmissionResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_records (
                otp_record_id, account_id, code_hash, expires_at_ms, used, created_at_ms
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.into_uuid())
        .bind(record.account_id.into_uuid())
        .bind(&record.code_hash[..])
        .bind(record.expires_at_ms)
        .bind(record.used)
        .bind(record.created_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_recent_records(
        &self,
        account_id: AccountId,
        limit: u32,
    ) -> AdmissionResult<Vec<OtpRecord>> {
        let rows = sqlx::query_as::<_, OtpRecordRow>(
            r#"
            SELECT otp_record_id, account_id, code_hash, expires_at_ms, used, created_at_ms
            FROM otp_records
            WHERE account_id = $1
            ORDER BY created_at_ms DESC
            LIMIT $2
            "#,
        )
        .bind(account_id.into_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OtpRecordRow::into_record).collect()
    }
}

impl RetentionRepository for PgAdmissionRepository {
    async fn purge_otp_records(&self, created_before_ms: i64) -> AdmissionResult<u64> {
        let deleted = sqlx::query("DELETE FROM otp_records WHERE created_at_ms < $1")
            .bind(created_before_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn purge_counters(&self, window_started_before_ms: i64) -> AdmissionResult<u64> {
        let deleted = sqlx::query("DELETE FROM rate_counters WHERE window_start_ms < $1")
            .bind(window_started_before_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    email: Option<String>,
    account_role: Option<String>,
    account_tier: Option<String>,
    tenant_id: Option<Uuid>,
    active: bool,
    activated_at_ms: Option<i64>,
    created_at_ms: i64,
}

impl AccountRow {
    fn into_account(self) -> Account {
        Account {
            account_id: AccountId::from_uuid(self.account_id),
            email: self.email.map(Email::from_db),
            role: self.account_role,
            tier: self.account_tier,
            tenant_id: self.tenant_id.map(TenantId::from_uuid),
            active: self.active,
            activated_at_ms: self.activated_at_ms,
            created_at_ms: self.created_at_ms,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TenantRow {
    tenant_id: Uuid,
    tenant_status: i16,
    created_at_ms: i64,
}

impl TenantRow {
    fn into_tenant(self) -> AdmissionResult<Tenant> {
        let status = TenantStatus::from_id(self.tenant_status).ok_or_else(|| {
            AdmissionError::Internal(format!("unknown tenant status {}", self.tenant_status))
        })?;
        Ok(Tenant {
            tenant_id: TenantId::from_uuid(self.tenant_id),
            status,
            created_at_ms: self.created_at_ms,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OtpRecordRow {
    otp_record_id: Uuid,
    account_id: Uuid,
    code_hash: Vec<u8>,
    expires_at_ms: i64,
    used: bool,
    created_at_ms: i64,
}

impl OtpRecordRow {
    fn into_record(self) -> AdmissionResult<OtpRecord> {
        let code_hash: [u8; 32] = self.code_hash.as_slice().try_into().map_err(|_| {
            AdmissionError::Internal(format!(
                "otp record {} has a {}-byte hash",
                self.otp_record_id,
                self.code_hash.len()
            ))
        })?;
        Ok(OtpRecord {
            id: OtpRecordId::from_uuid(self.otp_record_id),
            account_id: AccountId::from_uuid(self.account_id),
            code_hash,
            expires_at_ms: self.expires_at_ms,
            used: self.used,
            created_at_ms: self.created_at_ms,
        })
    }
}

/// These run against a disposable database created per test from
/// `database/migrations`; `DATABASE_URL` must point at a PostgreSQL server.
/// Run with `cargo test -p admission -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task::JoinSet;

    const T0: i64 = 1_700_000_000_000;

    fn window() -> RateLimitConfig {
        RateLimitConfig::new(3, 600)
    }

    async fn seed(repo: &PgAdmissionRepository) -> (Account, Tenant) {
        let tenant = Tenant::pending(T0);
        let account = Account::pending(
            AccountId::new(),
            Some(Email::new("owner@example.com").unwrap()),
            Some(tenant.tenant_id),
            T0,
        );
        repo.create_account(&account, Some(&tenant)).await.unwrap();
        (account, tenant)
    }

    async fn plant(
        repo: &PgAdmissionRepository,
        account_id: AccountId,
        ttl_ms: i64,
    ) -> OtpRecord {
        let record = OtpRecord::issue(account_id, [7u8; 32], T0, ttl_ms);
        repo.insert_record(&record).await.unwrap();
        record
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_consume_counts_and_resets_window(pool: PgPool) {
        let repo = PgAdmissionRepository::new(pool);
        let key = CounterKey::signup_ip("203.0.113.9".parse().unwrap(), &[1u8; 32]);

        for remaining in [2, 1, 0] {
            let result = repo.consume(&key, &window(), T0).await.unwrap();
            assert!(result.allowed);
            assert_eq!(result.remaining, remaining);
        }
        assert!(!repo.consume(&key, &window(), T0 + 1).await.unwrap().allowed);

        let later = T0 + window().window_ms() + 1;
        assert!(repo.consume(&key, &window(), later).await.unwrap().allowed);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_concurrent_consume_admits_exactly_limit(pool: PgPool) {
        let repo = PgAdmissionRepository::with_retry(
            pool,
            RetryPolicy::new(50, Duration::from_millis(5)),
        );
        let key = CounterKey::otp_account(AccountId::new());

        let mut set = JoinSet::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let key = key.clone();
            set.spawn(async move { repo.consume(&key, &window(), T0).await });
        }

        let mut admitted = 0;
        while let Some(joined) = set.join_next().await {
            if joined.unwrap().unwrap().allowed {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_activate_marks_record_and_flips_account_and_tenant(pool: PgPool) {
        let repo = PgAdmissionRepository::new(pool);
        let (account, tenant) = seed(&repo).await;
        let record = plant(&repo, account.account_id, 600_000).await;

        let outcome = repo
            .activate(account.account_id, record.id, T0 + 1_000)
            .await
            .unwrap();
        assert!(matches!(outcome, ActivationOutcome::Activated(ref a) if a.active));

        let stored = repo.find_account(account.account_id).await.unwrap().unwrap();
        assert!(stored.active);
        assert_eq!(stored.activated_at_ms, Some(T0 + 1_000));
        let stored_tenant = repo.find_tenant(tenant.tenant_id).await.unwrap().unwrap();
        assert_eq!(stored_tenant.status, TenantStatus::Active);

        let records = repo.find_recent_records(account.account_id, 5).await.unwrap();
        assert!(records[0].used);

        let again = repo
            .activate(account.account_id, record.id, T0 + 2_000)
            .await
            .unwrap();
        assert_eq!(again, ActivationOutcome::CodeUnavailable);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_activate_with_expired_record_writes_nothing(pool: PgPool) {
        let repo = PgAdmissionRepository::new(pool);
        let (account, tenant) = seed(&repo).await;
        let record = plant(&repo, account.account_id, 1_000).await;

        let outcome = repo
            .activate(account.account_id, record.id, T0 + 5_000)
            .await
            .unwrap();
        assert_eq!(outcome, ActivationOutcome::CodeUnavailable);

        assert!(!repo.find_account(account.account_id).await.unwrap().unwrap().active);
        let stored_tenant = repo.find_tenant(tenant.tenant_id).await.unwrap().unwrap();
        assert_eq!(stored_tenant.status, TenantStatus::Pending);
        let records = repo.find_recent_records(account.account_id, 5).await.unwrap();
        assert!(!records[0].used);
    }

    #[sqlx::test(migrations = "../../../database/migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_concurrent_activations_consume_once(pool: PgPool) {
        let repo = PgAdmissionRepository::with_retry(
            pool,
            RetryPolicy::new(50, Duration::from_millis(5)),
        );
        let (account, _) = seed(&repo).await;
        let record = plant(&repo, account.account_id, 600_000).await;

        let mut set = JoinSet::new();
        for _ in 0..4 {
            let repo = repo.clone();
            set.spawn(async move {
                repo.activate(account.account_id, record.id, T0 + 1_000).await
            });
        }

        let mut activated = 0;
        let mut unavailable = 0;
        while let Some(joined) = set.join_next().await {
            match joined.unwrap().unwrap() {
                ActivationOutcome::Activated(_) => activated += 1,
                ActivationOutcome::CodeUnavailable => unavailable += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!((activated, unavailable), (1, 3));
    }
}
