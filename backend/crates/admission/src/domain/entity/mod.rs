//! Entity Module

pub mod account;
pub mod otp_record;
pub mod tenant;
