//! Value Object Module

pub mod claims;
pub mod counter_key;
pub mod email;
pub mod otp_code;
pub mod outgoing_mail;
