//! Verify OTP Use Case
//!
//! Matches a submitted code, consumes it and activates the account and its
//! tenant in one transaction, then replaces the identity's claims.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::authenticate::Caller;
use crate::application::config::AdmissionConfig;
use crate::domain::repository::{AccountRepository, ClaimsIssuer, OtpRecordRepository};
use crate::domain::services::ActivationOutcome;
use crate::domain::value_object::claims::Claims;
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::{AdmissionError, AdmissionResult};

/// Message of the soft failure
pub const REJECTED_MESSAGE: &str = "invalid or expired";

/// Output of verification. A rejection is a normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOtpOutput {
    Verified,
    Rejected,
}

/// Verify OTP Use Case
pub struct VerifyOtpUseCase<R, I>
where
    R: AccountRepository + OtpRecordRepository,
    I: ClaimsIssuer,
{
    repo: Arc<R>,
    claims_issuer: Arc<I>,
    clock: Arc<dyn Clock>,
    config: Arc<AdmissionConfig>,
}

impl<R, I> VerifyOtpUseCase<R, I>
where
    R: AccountRepository + OtpRecordRepository,
    I: ClaimsIssuer,
{
    pub fn new(
        repo: Arc<R>,
        claims_issuer: Arc<I>,
        clock: Arc<dyn Clock>,
        config: Arc<AdmissionConfig>,
    ) -> Self {
        Self {
            repo,
            claims_issuer,
            clock,
            config,
        }
    }

    pub async fn execute(&self, caller: &Caller, code: &str) -> AdmissionResult<VerifyOtpOutput> {
        let account_id = caller.account_id;
        let code = OtpCode::parse(code).ok_or(AdmissionError::InvalidCode)?;

        let records = self
            .repo
            .find_recent_records(account_id, self.config.otp_lookup_limit)
            .await?;

        let now_ms = self.clock.now_ms();
        let digest = code.digest(&self.config.code_hash_key, account_id);
        let Some(record) = records.iter().find(|r| r.matches(&digest, now_ms)) else {
            tracing::info!(account_id = %account_id, "OTP rejected: no matching record");
            return Ok(VerifyOtpOutput::Rejected);
        };

        let account = match self.repo.activate(account_id, record.id, now_ms).await? {
            ActivationOutcome::Activated(account) => {
                tracing::info!(
                    account_id = %account_id,
                    tenant_id = ?account.tenant_id,
                    "Account activated"
                );
                account
            }
            ActivationOutcome::AlreadyActive(account) => {
                tracing::info!(account_id = %account_id, "OTP verified for active account");
                account
            }
            ActivationOutcome::CodeUnavailable => {
                tracing::info!(
                    account_id = %account_id,
                    otp_record_id = %record.id,
                    "OTP rejected: consumed concurrently"
                );
                return Ok(VerifyOtpOutput::Rejected);
            }
            ActivationOutcome::AccountMissing => return Err(AdmissionError::AccountNotFound),
        };

        let claims = Claims::for_verified(&account);
        self.claims_issuer
            .replace_claims(account_id, &claims)
            .await?;

        tracing::info!(account_id = %account_id, tier = %claims.tier, "Claims refreshed");

        Ok(VerifyOtpOutput::Verified)
    }
}
