//! Identity Provider Admin Client
//!
//! Replaces an identity's custom claims through the provider's admin API:
//! `PUT {base}/accounts/{account_id}/claims` with the full claim object.

use std::time::Duration;

use kernel::id::AccountId;

use crate::domain::repository::ClaimsIssuer;
use crate::domain::value_object::claims::Claims;
use crate::error::{AdmissionError, AdmissionResult};

/// HTTP claims issuer
#[derive(Debug, Clone)]
pub struct HttpClaimsIssuer {
    client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl HttpClaimsIssuer {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        }
    }

    fn claims_url(&self, account_id: AccountId) -> String {
        format!("{}/accounts/{}/claims", self.base_url, account_id)
    }
}

impl ClaimsIssuer for HttpClaimsIssuer {
    async fn replace_claims(&self, account_id: AccountId, claims: &Claims) -> AdmissionResult<()> {
        let resp = self
            .client
            .put(self.claims_url(account_id))
            .bearer_auth(&self.token)
            .json(claims)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AdmissionError::ClaimsRefreshFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdmissionError::ClaimsRefreshFailed(format!(
                "identity provider answered {status}"
            )));
        }

        tracing::info!(account_id = %account_id, "Claims replaced");
        Ok(())
    }
}

/// Claims issuer that only logs (local development)
#[derive(Debug, Clone, Default)]
pub struct LogClaimsIssuer;

impl ClaimsIssuer for LogClaimsIssuer {
    async fn replace_claims(&self, account_id: AccountId, claims: &Claims) -> AdmissionResult<()> {
        tracing::info!(
            account_id = %account_id,
            active = claims.active,
            tier = %claims.tier,
            "Identity admin API not configured, claims not pushed"
        );
        Ok(())
    }
}

/// Claims issuer chosen at startup
#[derive(Debug, Clone)]
pub enum IdentityClaims {
    Http(HttpClaimsIssuer),
    Log(LogClaimsIssuer),
}

impl ClaimsIssuer for IdentityClaims {
    async fn replace_claims(&self, account_id: AccountId, claims: &Claims) -> AdmissionResult<()> {
        match self {
            IdentityClaims::Http(http) => http.replace_claims(account_id, claims).await,
            IdentityClaims::Log(log) => log.replace_claims(account_id, claims).await,
        }
    }
}
