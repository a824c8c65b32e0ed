//! Caller Middleware
//!
//! Client routes require a session token (`Authorization: Bearer`) and a
//! client attestation (`X-Client-Attestation`). On success the `Caller` is
//! placed in the request extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::clock::Clock;

use crate::application::authenticate::AuthenticateCallerUseCase;
use crate::application::config::AdmissionConfig;
use crate::error::AdmissionError;

pub const ATTESTATION_HEADER: &str = "x-client-attestation";

/// Middleware state
#[derive(Clone)]
pub struct CallerAuthState {
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AdmissionConfig>,
}

/// Middleware that requires an authenticated, attested caller
pub async fn require_caller(
    State(state): State<CallerAuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AdmissionError> {
    let headers = req.headers();
    let session = bearer_token(headers);
    let attestation = header_str(headers, ATTESTATION_HEADER);

    let use_case = AuthenticateCallerUseCase::new(state.clock.clone(), state.config.clone());
    let caller = use_case.execute(session, attestation)?;

    tracing::debug!(account_id = %caller.account_id, "Caller authenticated");
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
