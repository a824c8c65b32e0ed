//! Admission Backend Module
//!
//! Sign-up admission and email OTP verification.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store and collaborator traits
//! - `application/` - Use cases and configuration
//! - `infra/` - PostgreSQL and in-memory stores, mail relay, identity admin client
//! - `presentation/` - HTTP handlers, caller middleware and router
//!
//! ## Security Model
//! - Per-IP and per-account counters are read-check-write transactions
//! - Requester IPs are stored only as keyed hashes
//! - OTP codes are stored only as keyed hashes and are single-use
//! - Account and tenant activation commit together or not at all

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{AdmissionConfig, UnknownIpPolicy};
pub use application::purge_stale::{PurgeReport, PurgeStaleUseCase};
pub use error::{AdmissionError, AdmissionResult};
pub use infra::identity::{HttpClaimsIssuer, IdentityClaims, LogClaimsIssuer};
pub use infra::mailer::{HttpMailRelay, LogNotifier, MailNotifier, MailSender};
pub use infra::memory::MemoryAdmissionRepository;
pub use infra::postgres::PgAdmissionRepository;
pub use presentation::router::{admission_router, admission_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
