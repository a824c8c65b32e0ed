//! Infrastructure Layer
//!
//! Store adapters and clients for the mail relay and identity provider.

pub mod identity;
pub mod mailer;
pub mod memory;
pub mod postgres;

pub use identity::{HttpClaimsIssuer, IdentityClaims, LogClaimsIssuer};
pub use mailer::{HttpMailRelay, LogNotifier, MailNotifier, MailSender};
pub use memory::MemoryAdmissionRepository;
pub use postgres::PgAdmissionRepository;
