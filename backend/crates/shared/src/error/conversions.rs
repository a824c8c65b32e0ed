//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from common error types to [`AppError`].

use super::app_error::AppError;
#[cfg(feature = "sqlx")]
use super::kind::ErrorKind;

// ============================================================================
// Standard library conversions
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => {
                AppError::deadline_exceeded("I/O operation timed out").with_source(err)
            }
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => {
                AppError::unavailable("Upstream connection failed").with_source(err)
            }
            _ => AppError::internal("I/O operation failed").with_source(err),
        }
    }
}

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::invalid_argument("Malformed JSON payload").with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// PostgreSQL error codes that mean "the transaction lost a race; run it again".
///
/// * `40001` serialization_failure
/// * `40P01` deadlock_detected
/// * `23505` unique_violation (two writers inserting the same lazily-created row)
#[cfg(feature = "sqlx")]
const RETRYABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "23505"];

/// Whether a database error is a transaction conflict that the transaction
/// runner should retry.
#[cfg(feature = "sqlx")]
pub fn is_transaction_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&&*code)),
        _ => false,
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::not_found("Record not found").with_source(err),
            sqlx::Error::PoolTimedOut => {
                AppError::unavailable("Database connection pool exhausted").with_source(err)
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let app_err = match db_err.code().as_deref() {
                    Some("40001") | Some("40P01") => {
                        AppError::unavailable("Transaction conflict, retry later")
                    }
                    Some("23505") => {
                        AppError::new(ErrorKind::FailedPrecondition, "Duplicate key value")
                    }
                    Some("23503") => AppError::failed_precondition("Referenced record missing"),
                    Some("53000") | Some("53100") | Some("53200") | Some("53300") => {
                        AppError::unavailable("Database resource exhausted")
                    }
                    Some("57000") | Some("57014") | Some("57P01") | Some("57P02")
                    | Some("57P03") => AppError::unavailable("Database unavailable"),
                    _ => AppError::internal("Database error"),
                };
                app_err.with_source(err)
            }
            sqlx::Error::Io(_) => {
                AppError::unavailable("Database connection error").with_source(err)
            }
            _ => AppError::internal("Database error").with_source(err),
        }
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
                "action": self.action(),
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::DeadlineExceeded);

        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert_eq!(app_err.kind(), ErrorKind::InvalidArgument);
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        assert!(!is_transaction_conflict(&sqlx::Error::RowNotFound));
        assert!(!is_transaction_conflict(&sqlx::Error::PoolTimedOut));
    }
}
