//! Email Value Object
//!
//! Represents a syntactically valid, normalized email address.
//! Ownership of the mailbox is proven separately by the OTP flow.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Maximum local-part length (per RFC 5321)
const LOCAL_PART_MAX_LENGTH: usize = 64;

/// Maximum length of a single domain label (per RFC 1035)
const DOMAIN_LABEL_MAX_LENGTH: usize = 63;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new email with validation (trimmed and lowercased)
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::invalid_argument("Email cannot be empty"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::invalid_argument(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::invalid_argument("Invalid email format"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        // Exactly one @
        if domain.contains('@') {
            return false;
        }

        if local.is_empty() || local.len() > LOCAL_PART_MAX_LENGTH {
            return false;
        }

        // Printable ASCII only, no spaces
        if !local.chars().all(|c| c.is_ascii_graphic()) {
            return false;
        }

        if !domain.contains('.') {
            return false;
        }

        domain.split('.').all(Self::is_valid_label)
    }

    fn is_valid_label(label: &str) -> bool {
        !label.is_empty()
            && label.len() <= DOMAIN_LABEL_MAX_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }

    /// Domain part, e.g. `mail.example.com`
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or("")
    }

    /// The domain followed by each of its parent domains:
    /// `a.b.example.com`, `b.example.com`, `example.com`, `com`.
    pub fn domain_suffixes(&self) -> impl Iterator<Item = &str> {
        let domain = self.domain();
        std::iter::once(domain).chain(
            domain
                .char_indices()
                .filter(|&(_, c)| c == '.')
                .map(move |(i, _)| &domain[i + 1..]),
        )
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
        assert!(Email::new("  user@example.com\n").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("a@b@example.com").is_err());
        assert!(Email::new("user@example").is_err());
        assert!(Email::new("user@-example.com").is_err());
        assert!(Email::new("user@example.com.").is_err());
        assert!(Email::new("user@exa_mple.com").is_err());
    }

    #[test]
    fn test_email_rejects_malformed_domain_labels() {
        assert!(Email::new("user@example..com").is_err());
        assert!(Email::new("user@.example.com").is_err());
        assert!(Email::new("user@a.-b.com").is_err());
        assert!(Email::new("user@exa-.com").is_err());
        assert!(Email::new(format!("user@{}.com", "l".repeat(64))).is_err());
        assert!(Email::new(format!("user@{}.com", "l".repeat(63))).is_ok());
        assert!(Email::new("user@my-mail.example.com").is_ok());
    }

    #[test]
    fn test_email_rejects_unprintable_local_part() {
        assert!(Email::new("a b@example.com").is_err());
        assert!(Email::new("a\tb@example.com").is_err());
        assert!(Email::new("ü@example.com").is_err());
        assert!(Email::new("o'brien+x@example.com").is_ok());
    }

    #[test]
    fn test_email_length_limits() {
        let local = "a".repeat(65);
        assert!(Email::new(format!("{local}@example.com")).is_err());

        let domain = format!("{}.com", "d".repeat(250));
        assert!(Email::new(format!("u@{domain}")).is_err());
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("User@Example.COM").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_domain_suffixes() {
        let email = Email::new("x@a.mailinator.com").unwrap();
        let suffixes: Vec<&str> = email.domain_suffixes().collect();
        assert_eq!(suffixes, vec!["a.mailinator.com", "mailinator.com", "com"]);
    }
}
