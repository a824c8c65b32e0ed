//! Domain Layer
//!
//! Contains entities, value objects, pure policy functions and
//! repository traits.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{account::Account, otp_record::OtpRecord, tenant::Tenant};
pub use repository::{
    AccountRepository, AdmissionStore, AtomicCounter, ClaimsIssuer, Notifier, OtpRecordRepository,
    RetentionRepository,
};
