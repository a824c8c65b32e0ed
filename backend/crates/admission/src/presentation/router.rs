//! Admission Router

use std::sync::Arc;

use axum::{Router, middleware, routing::post};
use platform::clock::{Clock, SystemClock};

use crate::application::config::AdmissionConfig;
use crate::domain::repository::{AdmissionStore, ClaimsIssuer, Notifier};
use crate::infra::identity::IdentityClaims;
use crate::infra::mailer::MailNotifier;
use crate::infra::postgres::PgAdmissionRepository;
use crate::presentation::handlers::{self, AdmissionAppState};
use crate::presentation::middleware::{CallerAuthState, require_caller};

/// Create the admission router with PostgreSQL repository
pub fn admission_router(
    repo: PgAdmissionRepository,
    notifier: MailNotifier,
    claims_issuer: IdentityClaims,
    config: AdmissionConfig,
) -> Router {
    admission_router_generic(repo, notifier, claims_issuer, Arc::new(SystemClock), config)
}

/// Create a generic admission router for any store and collaborators
pub fn admission_router_generic<R, N, I>(
    repo: R,
    notifier: N,
    claims_issuer: I,
    clock: Arc<dyn Clock>,
    config: AdmissionConfig,
) -> Router
where
    R: AdmissionStore,
    N: Notifier + Sync + 'static,
    I: ClaimsIssuer + Sync + 'static,
{
    let config = Arc::new(config);
    let auth_state = CallerAuthState {
        clock: clock.clone(),
        config: config.clone(),
    };
    let state = AdmissionAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(notifier),
        claims_issuer: Arc::new(claims_issuer),
        clock,
        config,
    };

    let client_routes = Router::new()
        .route("/otp/request", post(handlers::request_otp::<R, N, I>))
        .route("/otp/verify", post(handlers::verify_otp::<R, N, I>))
        .route_layer(middleware::from_fn_with_state(auth_state, require_caller));

    Router::new()
        .route("/hooks/before-create", post(handlers::before_create::<R, N, I>))
        .route("/hooks/before-sign-in", post(handlers::before_sign_in::<R, N, I>))
        .merge(client_routes)
        .with_state(state)
}
