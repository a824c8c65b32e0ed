//! Outgoing Mail
//!
//! Message handed to the notifier, plus the template that produces it.

use crate::domain::value_object::email::Email;
use crate::domain::value_object::otp_code::OtpCode;

#[derive(Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Email,
    pub subject: String,
    pub text: String,
}

impl std::fmt::Debug for OutgoingMail {
    // The body carries the plaintext code.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingMail")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Subject and body with `{code}` and `{minutes}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailTemplate {
    pub subject: String,
    pub body: String,
}

impl Default for MailTemplate {
    fn default() -> Self {
        Self {
            subject: "Your verification code".to_string(),
            body: "Your verification code is {code}. It expires in {minutes} minutes. \
                   If you did not request this code, you can ignore this email."
                .to_string(),
        }
    }
}

impl MailTemplate {
    pub fn render(&self, to: &Email, code: &OtpCode, minutes: u64) -> OutgoingMail {
        let fill = |s: &str| {
            s.replace("{code}", code.as_str())
                .replace("{minutes}", &minutes.to_string())
        };
        OutgoingMail {
            to: to.clone(),
            subject: fill(&self.subject),
            text: fill(&self.body),
        }
    }
}
