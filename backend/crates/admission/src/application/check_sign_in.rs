//! Check Sign-In Use Case
//!
//! Runs before the identity provider completes a sign-in. Pure: reads only
//! the claims it is given.

use serde_json::{Map, Value};

use crate::domain::value_object::claims::is_blocked;
use crate::error::{AdmissionError, AdmissionResult};

/// Check Sign-In Use Case
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckSignInUseCase;

impl CheckSignInUseCase {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, uid: &str, claims: &Map<String, Value>) -> AdmissionResult<()> {
        if is_blocked(claims) {
            tracing::warn!(uid = %uid, "Blocked identity denied sign-in");
            return Err(AdmissionError::AccountBlocked);
        }
        Ok(())
    }
}
