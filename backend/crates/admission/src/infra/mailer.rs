//! Mail Delivery
//!
//! `HttpMailRelay` posts to a transactional mail API (JSON body with sender,
//! recipients, subject and text content, authenticated by an `api-key`
//! header). `LogNotifier` only records that a mail would have been sent.

use std::time::Duration;

use serde::Serialize;

use crate::domain::repository::Notifier;
use crate::domain::value_object::outgoing_mail::OutgoingMail;
use crate::error::{AdmissionError, AdmissionResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody<'a> {
    sender: MailAddress<'a>,
    to: Vec<MailAddress<'a>>,
    subject: &'a str,
    text_content: &'a str,
}

/// Sender identity used in the `sender` field
#[derive(Debug, Clone)]
pub struct MailSender {
    pub email: String,
    pub name: Option<String>,
}

/// HTTP mail relay client
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: MailSender,
    timeout: Duration,
}

impl HttpMailRelay {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender: MailSender,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender,
            timeout,
        }
    }
}

impl Notifier for HttpMailRelay {
    async fn send(&self, mail: &OutgoingMail) -> AdmissionResult<()> {
        let body = SendMailBody {
            sender: MailAddress {
                email: &self.sender.email,
                name: self.sender.name.as_deref(),
            },
            to: vec![MailAddress {
                email: mail.to.as_str(),
                name: None,
            }],
            subject: &mail.subject,
            text_content: &mail.text,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdmissionError::NotifierTimeout
                } else {
                    AdmissionError::NotifierFailed(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AdmissionError::NotifierFailed(format!(
                "relay answered {status}: {detail}"
            )));
        }

        tracing::debug!(subject = %mail.subject, "Mail accepted by relay");
        Ok(())
    }
}

/// Notifier that logs instead of sending (local development)
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, mail: &OutgoingMail) -> AdmissionResult<()> {
        tracing::info!(
            recipient_domain = %mail.to.domain(),
            subject = %mail.subject,
            "Mail relay not configured, mail dropped"
        );
        Ok(())
    }
}

/// Notifier chosen at startup
#[derive(Debug, Clone)]
pub enum MailNotifier {
    Relay(HttpMailRelay),
    Log(LogNotifier),
}

impl Notifier for MailNotifier {
    async fn send(&self, mail: &OutgoingMail) -> AdmissionResult<()> {
        match self {
            MailNotifier::Relay(relay) => relay.send(mail).await,
            MailNotifier::Log(log) => log.send(mail).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::email::Email;

    #[test]
    fn test_body_shape() {
        let to = Email::new("user@example.com").unwrap();
        let body = SendMailBody {
            sender: MailAddress {
                email: "no-reply@example.org",
                name: Some("Example"),
            },
            to: vec![MailAddress {
                email: to.as_str(),
                name: None,
            }],
            subject: "Your verification code",
            text_content: "Your verification code is 123456.",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sender"]["name"], "Example");
        assert_eq!(json["to"][0]["email"], "user@example.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["textContent"], "Your verification code is 123456.");
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let mail = OutgoingMail {
            to: Email::new("user@example.com").unwrap(),
            subject: "s".to_string(),
            text: "t".to_string(),
        };
        assert!(MailNotifier::Log(LogNotifier).send(&mail).await.is_ok());
    }
}
