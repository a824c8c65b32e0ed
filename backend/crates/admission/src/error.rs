//! Admission Error Types
//!
//! This module provides admission-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::conversions::is_transaction_conflict;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::transaction::Retryable;
use thiserror::Error;

/// Admission-specific result type alias
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Admission-specific error variants
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Email or domain failed validation
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Submitted code is not six digits
    #[error("Verification code must be exactly 6 digits")]
    InvalidCode,

    /// Request body could not be decoded
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Email domain is on the disposable-domain denylist
    #[error("Email domain is not allowed")]
    DisposableDomain,

    /// Requester IP unknown and the unknown-IP policy is `deny`
    #[error("Client IP address is unavailable")]
    ClientIpUnavailable,

    /// Per-IP sign-up counter exhausted
    #[error("Too many sign-up attempts")]
    SignupRateLimited,

    /// Per-account OTP counter exhausted
    #[error("Too many verification codes requested")]
    OtpRateLimited,

    /// Session token missing, malformed, forged or expired
    #[error("Session not found or invalid")]
    SessionInvalid,

    /// Hook request not signed with the shared hook secret
    #[error("Hook signature missing or invalid")]
    HookSignatureInvalid,

    /// No client attestation presented
    #[error("Client attestation required")]
    AttestationMissing,

    /// Attestation forged, expired or for an unknown app
    #[error("Client attestation invalid")]
    AttestationInvalid,

    /// Caller has no account record
    #[error("Account not found")]
    AccountNotFound,

    /// Account exists but has no email to send the code to
    #[error("Account has no registered email")]
    EmailNotRegistered,

    /// `blocked` claim is set
    #[error("Account is blocked")]
    AccountBlocked,

    /// Mail relay did not answer in time
    #[error("Mail delivery timed out")]
    NotifierTimeout,

    /// Mail relay rejected or failed the send
    #[error("Mail delivery failed: {0}")]
    NotifierFailed(String),

    /// Identity provider refused the claims update
    #[error("Claims refresh failed: {0}")]
    ClaimsRefreshFailed(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdmissionError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdmissionError::InvalidEmail(_)
            | AdmissionError::InvalidCode
            | AdmissionError::MalformedRequest(_) => ErrorKind::InvalidArgument,
            AdmissionError::DisposableDomain => ErrorKind::PolicyViolation,
            AdmissionError::ClientIpUnavailable
            | AdmissionError::AttestationMissing
            | AdmissionError::AttestationInvalid
            | AdmissionError::AccountNotFound
            | AdmissionError::EmailNotRegistered => ErrorKind::FailedPrecondition,
            AdmissionError::SignupRateLimited | AdmissionError::OtpRateLimited => {
                ErrorKind::ResourceExhausted
            }
            AdmissionError::SessionInvalid | AdmissionError::HookSignatureInvalid => {
                ErrorKind::Unauthenticated
            }
            AdmissionError::AccountBlocked => ErrorKind::PermissionDenied,
            AdmissionError::NotifierTimeout => ErrorKind::DeadlineExceeded,
            AdmissionError::NotifierFailed(_) | AdmissionError::ClaimsRefreshFailed(_) => {
                ErrorKind::Unavailable
            }
            AdmissionError::Database(e) if is_transaction_conflict(e) => ErrorKind::Unavailable,
            AdmissionError::Database(_) | AdmissionError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to return to the caller. Upstream and database details
    /// stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AdmissionError::NotifierFailed(_) => "Mail delivery failed".to_string(),
            AdmissionError::ClaimsRefreshFailed(_) => "Claims refresh failed".to_string(),
            AdmissionError::Database(_) | AdmissionError::Internal(_) => {
                match self.kind() {
                    ErrorKind::Unavailable => "Service busy".to_string(),
                    _ => "Internal error".to_string(),
                }
            }
            _ => self.to_string(),
        }
    }

    fn action(&self) -> Option<&'static str> {
        match self {
            AdmissionError::SignupRateLimited => Some("Try again later"),
            AdmissionError::OtpRateLimited => Some("Wait before requesting another code"),
            AdmissionError::AttestationMissing | AdmissionError::AttestationInvalid => {
                Some("Use an official client")
            }
            AdmissionError::NotifierTimeout | AdmissionError::NotifierFailed(_) => {
                Some("Request a new code")
            }
            AdmissionError::SessionInvalid => Some("Sign in again"),
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self.action() {
            Some(action) => err.with_action(action),
            None => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AdmissionError::Database(e) => {
                tracing::error!(error = %e, "Admission database error");
            }
            AdmissionError::Internal(msg) => {
                tracing::error!(message = %msg, "Admission internal error");
            }
            AdmissionError::NotifierFailed(msg) => {
                tracing::error!(message = %msg, "Mail delivery failed");
            }
            AdmissionError::ClaimsRefreshFailed(msg) => {
                tracing::error!(message = %msg, "Claims refresh failed");
            }
            AdmissionError::NotifierTimeout => {
                tracing::error!("Mail delivery timed out");
            }
            AdmissionError::SignupRateLimited | AdmissionError::OtpRateLimited => {
                tracing::warn!(error = %self, "Rate limit exceeded");
            }
            AdmissionError::DisposableDomain => {
                tracing::warn!("Disposable email domain rejected");
            }
            AdmissionError::HookSignatureInvalid
            | AdmissionError::AttestationMissing
            | AdmissionError::AttestationInvalid => {
                tracing::warn!(error = %self, "Caller verification failed");
            }
            AdmissionError::AccountBlocked => {
                tracing::warn!("Sign-in attempt on blocked account");
            }
            _ => {
                tracing::debug!(error = %self, "Admission error");
            }
        }
    }
}

impl Retryable for AdmissionError {
    fn is_retryable(&self) -> bool {
        matches!(self, AdmissionError::Database(e) if is_transaction_conflict(e))
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(
            AdmissionError::InvalidEmail("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(AdmissionError::DisposableDomain.kind(), ErrorKind::PolicyViolation);
        assert_eq!(
            AdmissionError::ClientIpUnavailable.kind(),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(
            AdmissionError::SignupRateLimited.kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(AdmissionError::SessionInvalid.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            AdmissionError::AttestationMissing.kind(),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(AdmissionError::AccountBlocked.kind(), ErrorKind::PermissionDenied);
        assert_eq!(AdmissionError::NotifierTimeout.kind(), ErrorKind::DeadlineExceeded);
        assert_eq!(
            AdmissionError::NotifierFailed("relay 500".into()).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            AdmissionError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AdmissionError::OtpRateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AdmissionError::EmailNotRegistered.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            AdmissionError::NotifierTimeout.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AdmissionError::NotifierFailed("relay said: bad api key abc123".into());
        let app = err.to_app_error();
        assert!(!app.message().contains("abc123"));
        assert_eq!(app.action(), Some("Request a new code"));

        let err = AdmissionError::Internal("pool poisoned".into());
        assert_eq!(err.public_message(), "Internal error");
    }

    #[test]
    fn test_only_database_conflicts_are_retryable() {
        assert!(!AdmissionError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(!AdmissionError::SignupRateLimited.is_retryable());
    }
}
