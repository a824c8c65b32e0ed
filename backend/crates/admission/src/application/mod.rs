//! Application Layer
//!
//! Use cases and application services.

pub mod admit_sign_up;
pub mod authenticate;
pub mod check_sign_in;
pub mod config;
pub mod purge_stale;
pub mod request_otp;
pub mod verify_otp;

// Re-exports
pub use admit_sign_up::{AdmitSignUpInput, AdmitSignUpUseCase};
pub use authenticate::{AuthenticateCallerUseCase, Caller};
pub use check_sign_in::CheckSignInUseCase;
pub use config::{AdmissionConfig, UnknownIpPolicy};
pub use purge_stale::{PurgeReport, PurgeStaleUseCase};
pub use request_otp::RequestOtpUseCase;
pub use verify_otp::{VerifyOtpOutput, VerifyOtpUseCase};
