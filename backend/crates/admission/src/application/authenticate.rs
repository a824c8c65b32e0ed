//! Caller Authentication
//!
//! Client operations carry a session token and a client-attestation token;
//! identity-provider hooks carry an HMAC signature of the raw body.

use std::sync::Arc;

use kernel::id::AccountId;
use platform::clock::Clock;
use platform::crypto::{constant_time_eq, from_hex, hmac_sha256, to_hex};
use platform::token;

use crate::application::config::AdmissionConfig;
use crate::error::{AdmissionError, AdmissionResult};

/// Authenticated client, inserted into request extensions by the middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub account_id: AccountId,
}

/// Authenticate Caller Use Case
pub struct AuthenticateCallerUseCase {
    clock: Arc<dyn Clock>,
    config: Arc<AdmissionConfig>,
}

impl AuthenticateCallerUseCase {
    pub fn new(clock: Arc<dyn Clock>, config: Arc<AdmissionConfig>) -> Self {
        Self { clock, config }
    }

    /// Session is checked before attestation, so a caller without a
    /// session always sees `Unauthenticated`.
    pub fn execute(
        &self,
        session_token: Option<&str>,
        attestation_token: Option<&str>,
    ) -> AdmissionResult<Caller> {
        let now_ms = self.clock.now_ms();

        let session_token = session_token.ok_or(AdmissionError::SessionInvalid)?;
        let subject = token::verify(&self.config.session_secret, session_token, now_ms)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AdmissionError::SessionInvalid
            })?;
        let account_id: AccountId = subject
            .parse()
            .map_err(|_| AdmissionError::SessionInvalid)?;

        let attestation_token = attestation_token.ok_or(AdmissionError::AttestationMissing)?;
        let app_id = token::verify(&self.config.attestation_secret, attestation_token, now_ms)
            .map_err(|e| {
                tracing::debug!(error = %e, "Attestation token rejected");
                AdmissionError::AttestationInvalid
            })?;
        if !self.config.attestation_app_ids.contains(&app_id) {
            tracing::warn!(app_id = %app_id, "Attestation for unknown app");
            return Err(AdmissionError::AttestationInvalid);
        }

        Ok(Caller { account_id })
    }
}

/// Issue a session token for `account_id` (identity-provider side of the
/// contract; used by tooling and tests)
pub fn issue_session_token(
    config: &AdmissionConfig,
    account_id: AccountId,
    expires_at_ms: i64,
) -> String {
    token::issue(&config.session_secret, &account_id.to_string(), expires_at_ms)
}

/// Issue an attestation token for `app_id`
pub fn issue_attestation_token(
    config: &AdmissionConfig,
    app_id: &str,
    expires_at_ms: i64,
) -> String {
    token::issue(&config.attestation_secret, app_id, expires_at_ms)
}

/// Hex HMAC-SHA-256 of a hook body under the hook secret
pub fn sign_hook_body(config: &AdmissionConfig, body: &[u8]) -> String {
    to_hex(&hmac_sha256(&config.hook_secret, &[body]))
}

/// Check the `X-Hook-Signature` value against the raw body.
pub fn verify_hook_signature(
    config: &AdmissionConfig,
    body: &[u8],
    signature: Option<&str>,
) -> AdmissionResult<()> {
    let provided = signature
        .and_then(|s| from_hex(s.trim()).ok())
        .ok_or(AdmissionError::HookSignatureInvalid)?;
    let expected = hmac_sha256(&config.hook_secret, &[body]);
    if constant_time_eq(&provided, &expected) {
        Ok(())
    } else {
        Err(AdmissionError::HookSignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::clock::ManualClock;

    const NOW: i64 = 1_700_000_000_000;

    fn setup() -> (AuthenticateCallerUseCase, Arc<AdmissionConfig>) {
        let config = Arc::new(AdmissionConfig::development());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(NOW));
        (AuthenticateCallerUseCase::new(clock, config.clone()), config)
    }

    #[test]
    fn test_valid_caller() {
        let (use_case, config) = setup();
        let account_id = AccountId::new();
        let session = issue_session_token(&config, account_id, NOW + 60_000);
        let attestation = issue_attestation_token(&config, "dev", NOW + 60_000);

        let caller = use_case
            .execute(Some(&session), Some(&attestation))
            .unwrap();
        assert_eq!(caller.account_id, account_id);
    }

    #[test]
    fn test_missing_session_is_unauthenticated() {
        let (use_case, config) = setup();
        let attestation = issue_attestation_token(&config, "dev", NOW + 60_000);
        let result = use_case.execute(None, Some(&attestation));
        assert!(matches!(result, Err(AdmissionError::SessionInvalid)));

        let result = use_case.execute(None, None);
        assert!(matches!(result, Err(AdmissionError::SessionInvalid)));
    }

    #[test]
    fn test_expired_session_is_unauthenticated() {
        let (use_case, config) = setup();
        let session = issue_session_token(&config, AccountId::new(), NOW - 1);
        let attestation = issue_attestation_token(&config, "dev", NOW + 60_000);
        let result = use_case.execute(Some(&session), Some(&attestation));
        assert!(matches!(result, Err(AdmissionError::SessionInvalid)));
    }

    #[test]
    fn test_attestation_checks() {
        let (use_case, config) = setup();
        let session = issue_session_token(&config, AccountId::new(), NOW + 60_000);

        let result = use_case.execute(Some(&session), None);
        assert!(matches!(result, Err(AdmissionError::AttestationMissing)));

        let unknown_app = issue_attestation_token(&config, "scraper", NOW + 60_000);
        let result = use_case.execute(Some(&session), Some(&unknown_app));
        assert!(matches!(result, Err(AdmissionError::AttestationInvalid)));

        // Signed with the session secret instead of the attestation secret
        let wrong_secret = token::issue(&config.session_secret, "dev", NOW + 60_000);
        let result = use_case.execute(Some(&session), Some(&wrong_secret));
        assert!(matches!(result, Err(AdmissionError::AttestationInvalid)));
    }

    #[test]
    fn test_hook_signature() {
        let config = AdmissionConfig::development();
        let body = br#"{"email":"user@example.com"}"#;
        let signature = sign_hook_body(&config, body);

        assert!(verify_hook_signature(&config, body, Some(&signature)).is_ok());
        assert!(verify_hook_signature(&config, body, Some(&signature.to_uppercase())).is_ok());
        assert!(verify_hook_signature(&config, b"{}", Some(&signature)).is_err());
        assert!(verify_hook_signature(&config, body, Some("zz")).is_err());
        assert!(verify_hook_signature(&config, body, None).is_err());
    }
}
