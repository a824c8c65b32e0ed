//! Purge Stale Use Case
//!
//! Deletes OTP records and counters past their retention.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::AdmissionConfig;
use crate::domain::repository::RetentionRepository;
use crate::error::AdmissionResult;

/// Rows deleted by one purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub otp_records: u64,
    pub counters: u64,
}

/// Purge Stale Use Case
pub struct PurgeStaleUseCase<R>
where
    R: RetentionRepository,
{
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    config: Arc<AdmissionConfig>,
}

impl<R> PurgeStaleUseCase<R>
where
    R: RetentionRepository,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, config: Arc<AdmissionConfig>) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    pub async fn execute(&self) -> AdmissionResult<PurgeReport> {
        let now_ms = self.clock.now_ms();
        let otp_cutoff = now_ms - self.config.retention.otp_records.as_millis() as i64;
        let counter_cutoff = now_ms - self.config.counter_retention().as_millis() as i64;

        let report = PurgeReport {
            otp_records: self.repo.purge_otp_records(otp_cutoff).await?,
            counters: self.repo.purge_counters(counter_cutoff).await?,
        };

        tracing::info!(
            otp_records = report.otp_records,
            counters = report.counters,
            "Purged stale admission data"
        );

        Ok(report)
    }
}
