//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request for POST /hooks/before-create
#[derive(Debug, Clone, Deserialize)]
pub struct BeforeCreateRequest {
    pub email: String,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Request for POST /hooks/before-sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct BeforeSignInRequest {
    pub uid: String,
    #[serde(default)]
    pub claims: Map<String, Value>,
}

/// Response for both hooks
#[derive(Debug, Clone, Serialize)]
pub struct AllowResponse {
    pub allow: bool,
}

/// Response for POST /otp/request
#[derive(Debug, Clone, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Request for POST /otp/verify
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub code: String,
}

/// Response for POST /otp/verify
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
