//! Request OTP Use Case
//!
//! Issues a verification code to the caller's registered email.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::authenticate::Caller;
use crate::application::config::AdmissionConfig;
use crate::domain::entity::otp_record::OtpRecord;
use crate::domain::repository::{AccountRepository, AtomicCounter, Notifier, OtpRecordRepository};
use crate::domain::value_object::counter_key::CounterKey;
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::{AdmissionError, AdmissionResult};

/// Request OTP Use Case
pub struct RequestOtpUseCase<R, N>
where
    R: AtomicCounter + AccountRepository + OtpRecordRepository,
    N: Notifier,
{
    repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    config: Arc<AdmissionConfig>,
}

impl<R, N> RequestOtpUseCase<R, N>
where
    R: AtomicCounter + AccountRepository + OtpRecordRepository,
    N: Notifier,
{
    pub fn new(
        repo: Arc<R>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        config: Arc<AdmissionConfig>,
    ) -> Self {
        Self {
            repo,
            notifier,
            clock,
            config,
        }
    }

    pub async fn execute(&self, caller: &Caller) -> AdmissionResult<()> {
        let account_id = caller.account_id;

        let account = self
            .repo
            .find_account(account_id)
            .await?
            .ok_or(AdmissionError::AccountNotFound)?;
        let email = account.email.ok_or(AdmissionError::EmailNotRegistered)?;

        let now_ms = self.clock.now_ms();
        let result = self
            .repo
            .consume(
                &CounterKey::otp_account(account_id),
                &self.config.otp_limit,
                now_ms,
            )
            .await?;
        if !result.allowed {
            tracing::warn!(
                account_id = %account_id,
                reset_at_ms = result.reset_at_ms,
                "OTP rate limit reached"
            );
            return Err(AdmissionError::OtpRateLimited);
        }

        let code = OtpCode::generate();
        let record = OtpRecord::issue(
            account_id,
            code.digest(&self.config.code_hash_key, account_id),
            now_ms,
            self.config.otp_ttl_ms(),
        );
        // Persisted before sending: an undelivered record simply expires.
        self.repo.insert_record(&record).await?;

        let mail = self
            .config
            .otp_mail
            .render(&email, &code, self.config.otp_ttl_minutes());

        match tokio::time::timeout(self.config.notifier_timeout, self.notifier.send(&mail)).await {
            Ok(sent) => sent?,
            Err(_) => return Err(AdmissionError::NotifierTimeout),
        }

        tracing::info!(
            account_id = %account_id,
            otp_record_id = %record.id,
            remaining = result.remaining,
            "OTP issued"
        );

        Ok(())
    }
}
