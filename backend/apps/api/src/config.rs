//! Environment configuration
//!
//! Reads `AdmissionConfig` and the collaborator endpoints from environment
//! variables. Debug builds fall back to development secrets and logging
//! collaborators; release builds require every secret and endpoint.

use std::env;
use std::net::SocketAddr;

use admission::{
    AdmissionConfig, HttpClaimsIssuer, HttpMailRelay, IdentityClaims, LogClaimsIssuer,
    LogNotifier, MailNotifier, MailSender, UnknownIpPolicy,
};
use anyhow::{Context, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:31113";

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(name: &str) -> anyhow::Result<String> {
    var(name).ok_or_else(|| anyhow!("{name} must be set"))
}

fn comma_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn decode_secret(name: &str, b64: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = general_purpose::STANDARD
        .decode(b64)
        .with_context(|| format!("{name} is not valid base64"))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| anyhow!("{name} must decode to 32 bytes, got {}", bytes.len()))
}

pub fn listen_addr() -> anyhow::Result<SocketAddr> {
    let raw = var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    raw.parse()
        .with_context(|| format!("LISTEN_ADDR `{raw}` is not a socket address"))
}

pub fn admission_config() -> anyhow::Result<AdmissionConfig> {
    let dev = cfg!(debug_assertions);
    let mut config = if dev {
        AdmissionConfig::development()
    } else {
        AdmissionConfig::default()
    };

    let secrets = [
        ("ADMISSION_SESSION_SECRET", &mut config.session_secret),
        ("ADMISSION_ATTESTATION_SECRET", &mut config.attestation_secret),
        ("ADMISSION_HOOK_SECRET", &mut config.hook_secret),
        ("ADMISSION_CODE_HASH_SECRET", &mut config.code_hash_key),
        ("ADMISSION_IP_HASH_SECRET", &mut config.ip_hash_key),
    ];
    for (name, slot) in secrets {
        match var(name) {
            Some(b64) => *slot = decode_secret(name, &b64)?,
            None if dev => tracing::warn!(secret = name, "Secret not set, using a random one"),
            None => bail!("{name} must be set in production"),
        }
    }

    if let Some(ids) = var("ATTESTATION_APP_IDS") {
        config.attestation_app_ids = comma_list(&ids).collect();
    }
    if config.attestation_app_ids.is_empty() {
        tracing::warn!("ATTESTATION_APP_IDS is empty, every client call will be rejected");
    }

    if let Some(domains) = var("DISPOSABLE_DOMAINS") {
        config.extend_disposable_domains(comma_list(&domains));
    }

    if let Some(policy) = var("UNKNOWN_IP_POLICY") {
        config.unknown_ip_policy = policy
            .parse::<UnknownIpPolicy>()
            .map_err(|e| anyhow!("UNKNOWN_IP_POLICY: {e}"))?;
    }

    Ok(config)
}

pub fn mail_notifier(config: &AdmissionConfig) -> anyhow::Result<MailNotifier> {
    match var("MAIL_RELAY_URL") {
        Some(url) => {
            let sender = MailSender {
                email: require("MAIL_SENDER")?,
                name: var("MAIL_SENDER_NAME"),
            };
            Ok(MailNotifier::Relay(HttpMailRelay::new(
                url,
                require("MAIL_RELAY_API_KEY")?,
                sender,
                config.notifier_timeout,
            )))
        }
        None if cfg!(debug_assertions) => {
            tracing::warn!("MAIL_RELAY_URL not set, codes will not be delivered");
            Ok(MailNotifier::Log(LogNotifier))
        }
        None => bail!("MAIL_RELAY_URL must be set in production"),
    }
}

pub fn claims_issuer(config: &AdmissionConfig) -> anyhow::Result<IdentityClaims> {
    match var("IDENTITY_ADMIN_URL") {
        Some(url) => Ok(IdentityClaims::Http(HttpClaimsIssuer::new(
            url,
            require("IDENTITY_ADMIN_TOKEN")?,
            config.notifier_timeout,
        ))),
        None if cfg!(debug_assertions) => {
            tracing::warn!("IDENTITY_ADMIN_URL not set, claims will not be pushed");
            Ok(IdentityClaims::Log(LogClaimsIssuer))
        }
        None => bail!("IDENTITY_ADMIN_URL must be set in production"),
    }
}
