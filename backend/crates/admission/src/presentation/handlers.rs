//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use platform::client::resolve_hook_ip;
use platform::clock::Clock;
use serde::de::DeserializeOwned;

use crate::application::authenticate::{Caller, verify_hook_signature};
use crate::application::config::AdmissionConfig;
use crate::application::verify_otp::REJECTED_MESSAGE;
use crate::application::{
    AdmitSignUpInput, AdmitSignUpUseCase, CheckSignInUseCase, RequestOtpUseCase, VerifyOtpOutput,
    VerifyOtpUseCase,
};
use crate::domain::repository::{AdmissionStore, ClaimsIssuer, Notifier};
use crate::error::{AdmissionError, AdmissionResult};
use crate::presentation::dto::{
    AckResponse, AllowResponse, BeforeCreateRequest, BeforeSignInRequest, VerifyOtpRequest,
    VerifyOtpResponse,
};

pub const HOOK_SIGNATURE_HEADER: &str = "x-hook-signature";

/// Shared state for admission handlers
pub struct AdmissionAppState<R, N, I> {
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub claims_issuer: Arc<I>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AdmissionConfig>,
}

// Manual impl: every field is an Arc, so no bound on the type parameters.
impl<R, N, I> Clone for AdmissionAppState<R, N, I> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            claims_issuer: self.claims_issuer.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

/// POST /hooks/before-create
pub async fn before_create<R, N, I>(
    State(state): State<AdmissionAppState<R, N, I>>,
    headers: HeaderMap,
    body: Bytes,
) -> AdmissionResult<Json<AllowResponse>>
where
    R: AdmissionStore,
    N: Notifier + Sync + 'static,
    I: ClaimsIssuer + Sync + 'static,
{
    let req: BeforeCreateRequest = decode_hook(&state.config, &headers, &body)?;
    let client_ip = resolve_hook_ip(req.ip.as_deref(), &headers);

    let use_case = AdmitSignUpUseCase::new(
        state.repo.clone(),
        state.clock.clone(),
        state.config.clone(),
    );
    use_case
        .execute(AdmitSignUpInput {
            email: req.email,
            client_ip,
        })
        .await?;

    Ok(Json(AllowResponse { allow: true }))
}

/// POST /hooks/before-sign-in
pub async fn before_sign_in<R, N, I>(
    State(state): State<AdmissionAppState<R, N, I>>,
    headers: HeaderMap,
    body: Bytes,
) -> AdmissionResult<Json<AllowResponse>>
where
    R: AdmissionStore,
    N: Notifier + Sync + 'static,
    I: ClaimsIssuer + Sync + 'static,
{
    let req: BeforeSignInRequest = decode_hook(&state.config, &headers, &body)?;

    CheckSignInUseCase::new().execute(&req.uid, &req.claims)?;

    Ok(Json(AllowResponse { allow: true }))
}

/// POST /otp/request
pub async fn request_otp<R, N, I>(
    State(state): State<AdmissionAppState<R, N, I>>,
    Extension(caller): Extension<Caller>,
) -> AdmissionResult<Json<AckResponse>>
where
    R: AdmissionStore,
    N: Notifier + Sync + 'static,
    I: ClaimsIssuer + Sync + 'static,
{
    let use_case = RequestOtpUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    use_case.execute(&caller).await?;

    Ok(Json(AckResponse { ok: true }))
}

/// POST /otp/verify
pub async fn verify_otp<R, N, I>(
    State(state): State<AdmissionAppState<R, N, I>>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> AdmissionResult<Json<VerifyOtpResponse>>
where
    R: AdmissionStore,
    N: Notifier + Sync + 'static,
    I: ClaimsIssuer + Sync + 'static,
{
    let req: VerifyOtpRequest = decode_json(&body)?;

    let use_case = VerifyOtpUseCase::new(
        state.repo.clone(),
        state.claims_issuer.clone(),
        state.clock.clone(),
        state.config.clone(),
    );

    let response = match use_case.execute(&caller, &req.code).await? {
        VerifyOtpOutput::Verified => VerifyOtpResponse {
            ok: true,
            message: None,
        },
        VerifyOtpOutput::Rejected => VerifyOtpResponse {
            ok: false,
            message: Some(REJECTED_MESSAGE.to_string()),
        },
    };

    Ok(Json(response))
}

/// Signature first, so unsigned bodies are never parsed.
fn decode_hook<T: DeserializeOwned>(
    config: &AdmissionConfig,
    headers: &HeaderMap,
    body: &[u8],
) -> AdmissionResult<T> {
    let signature = headers
        .get(HOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    verify_hook_signature(config, body, signature)?;
    decode_json(body)
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> AdmissionResult<T> {
    serde_json::from_slice(body).map_err(|e| AdmissionError::MalformedRequest(e.to_string()))
}
