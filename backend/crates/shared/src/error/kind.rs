//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by every crate. Each kind has a
//! stable wire code (used by hook callers and clients) and an HTTP status.

use serde::Serialize;

/// エラー種別の列挙体
///
/// 呼び出し元（Identity Provider のフック、クライアント）が分岐に使う
/// エラー分類です。`code()` は外部に公開される安定した識別子です。
///
/// ## Notes
/// * `PolicyViolation` と `PermissionDenied` は同じ 403 ですが、コードで区別します
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::ResourceExhausted;
/// assert_eq!(kind.status_code(), 429);
/// assert_eq!(kind.code(), "resource-exhausted");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - 入力が不正（メール形式、コード形式など）
    InvalidArgument,
    /// 401 - セッションが無い、または無効
    Unauthenticated,
    /// 403 - アカウントがブロックされている
    PermissionDenied,
    /// 403 - 使い捨てドメインなどポリシー違反
    PolicyViolation,
    /// 404 - リソースが見つからない
    NotFound,
    /// 412 - 必要な状態が揃っていない（アテステーション無し、メール未登録など）
    FailedPrecondition,
    /// 429 - レート制限超過
    ResourceExhausted,
    /// 500 - サーバー内部エラー
    Internal,
    /// 503 - 外部依存（メール送信、ストア）が利用不可
    Unavailable,
    /// 504 - 外部依存がタイムアウト
    DeadlineExceeded,
}

impl ErrorKind {
    /// HTTP ステータスコードを取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::InvalidArgument.status_code(), 400);
    /// assert_eq!(ErrorKind::FailedPrecondition.status_code(), 412);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::PermissionDenied | ErrorKind::PolicyViolation => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::FailedPrecondition => 412,
            ErrorKind::ResourceExhausted => 429,
            ErrorKind::Internal => 500,
            ErrorKind::Unavailable => 503,
            ErrorKind::DeadlineExceeded => 504,
        }
    }

    /// 外部に公開する安定したエラーコード
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::PermissionDenied => "permission-denied",
            ErrorKind::PolicyViolation => "policy-violation",
            ErrorKind::NotFound => "not-found",
            ErrorKind::FailedPrecondition => "failed-precondition",
            ErrorKind::ResourceExhausted => "resource-exhausted",
            ErrorKind::Internal => "internal",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::DeadlineExceeded => "deadline-exceeded",
        }
    }

    /// サーバー側のエラーかどうかを判定
    ///
    /// 5xx系のエラーは `true` を返します。
    /// これらのエラーはログに記録すべきです。
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// クライアント側のエラーかどうかを判定
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::InvalidArgument.status_code(), 400);
        assert_eq!(ErrorKind::Unauthenticated.status_code(), 401);
        assert_eq!(ErrorKind::PermissionDenied.status_code(), 403);
        assert_eq!(ErrorKind::PolicyViolation.status_code(), 403);
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::FailedPrecondition.status_code(), 412);
        assert_eq!(ErrorKind::ResourceExhausted.status_code(), 429);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
        assert_eq!(ErrorKind::Unavailable.status_code(), 503);
        assert_eq!(ErrorKind::DeadlineExceeded.status_code(), 504);
    }

    #[test]
    fn test_codes_distinguish_same_status() {
        assert_ne!(
            ErrorKind::PermissionDenied.code(),
            ErrorKind::PolicyViolation.code()
        );
        assert_eq!(ErrorKind::PolicyViolation.to_string(), "policy-violation");
    }

    #[test]
    fn test_serialize_matches_code() {
        let json = serde_json::to_string(&ErrorKind::FailedPrecondition).unwrap();
        assert_eq!(json, r#""failed-precondition""#);
    }

    #[test]
    fn test_error_classes() {
        assert!(ErrorKind::Unavailable.is_server_error());
        assert!(!ErrorKind::ResourceExhausted.is_server_error());
        assert!(ErrorKind::ResourceExhausted.is_client_error());
        assert!(!ErrorKind::DeadlineExceeded.is_client_error());
    }
}
