//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, CSPRNG)
//! - Signed bearer tokens
//! - Clock abstraction
//! - Client IP extraction
//! - Fixed-window rate limiting and transaction retry

pub mod client;
pub mod clock;
pub mod crypto;
pub mod rate_limit;
pub mod token;
pub mod transaction;
