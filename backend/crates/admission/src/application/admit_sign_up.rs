//! Admit Sign-Up Use Case
//!
//! Runs before the identity provider creates an account: email policy
//! first, then the per-IP sign-up counter.

use std::net::IpAddr;
use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::{AdmissionConfig, UnknownIpPolicy};
use crate::domain::repository::AtomicCounter;
use crate::domain::services::is_disposable;
use crate::domain::value_object::counter_key::CounterKey;
use crate::domain::value_object::email::Email;
use crate::error::{AdmissionError, AdmissionResult};

/// Input for the before-create hook
#[derive(Debug, Clone)]
pub struct AdmitSignUpInput {
    pub email: String,
    /// Best-effort requester IP
    pub client_ip: Option<IpAddr>,
}

/// Admit Sign-Up Use Case
pub struct AdmitSignUpUseCase<C>
where
    C: AtomicCounter,
{
    counter: Arc<C>,
    clock: Arc<dyn Clock>,
    config: Arc<AdmissionConfig>,
}

impl<C> AdmitSignUpUseCase<C>
where
    C: AtomicCounter,
{
    pub fn new(counter: Arc<C>, clock: Arc<dyn Clock>, config: Arc<AdmissionConfig>) -> Self {
        Self {
            counter,
            clock,
            config,
        }
    }

    pub async fn execute(&self, input: AdmitSignUpInput) -> AdmissionResult<()> {
        let email = Email::new(input.email)
            .map_err(|e| AdmissionError::InvalidEmail(e.message().to_string()))?;

        // Policy denial never touches the counter.
        if is_disposable(&email, &self.config.disposable_domains) {
            return Err(AdmissionError::DisposableDomain);
        }

        let key = match (input.client_ip, self.config.unknown_ip_policy) {
            (Some(ip), _) => CounterKey::signup_ip(ip, &self.config.ip_hash_key),
            (None, UnknownIpPolicy::SharedBucket) => CounterKey::signup_unknown_ip(),
            (None, UnknownIpPolicy::Deny) => return Err(AdmissionError::ClientIpUnavailable),
        };

        let now_ms = self.clock.now_ms();
        let result = self
            .counter
            .consume(&key, &self.config.signup_limit, now_ms)
            .await?;

        if !result.allowed {
            tracing::warn!(
                counter_key = %key.key,
                reset_at_ms = result.reset_at_ms,
                "Sign-up rate limit reached"
            );
            return Err(AdmissionError::SignupRateLimited);
        }

        tracing::info!(
            domain = %email.domain(),
            remaining = result.remaining,
            "Sign-up admitted"
        );

        Ok(())
    }
}
