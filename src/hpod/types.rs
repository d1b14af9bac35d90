//! Request and response shapes for the H-POD `api/v2` endpoints.
//!
//! [`ApiCall`] describes one logical call; [`ApiResult`] is what the executor
//! hands back after reconciling the transport status with the `result.code`
//! embedded in the body.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AUTHENTICATE: &str = "authenticate";
pub const PRINT_INIT: &str = "print/init";
pub const DOC_PART: &str = "print/docpart";
pub const ATT_PART: &str = "print/attpart";
pub const COMMIT: &str = "print/commit";
pub const COMMITTED: &str = "print/committed";

/// Status code the service uses for success, at either layer.
pub const STATUS_OK: u16 = 200;
/// Status code the service uses to ask the caller to slow down.
pub const STATUS_THROTTLED: u16 = 429;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Payload of an [`ApiCall`]. Kept owned so a throttled call can be re-sent as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Json(String),
    Bytes(Vec<u8>),
}

/// One logical call against the service, relative to the `api/v2/` base.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Body,
}

impl ApiCall {
    pub fn get(path: &str, headers: HeaderMap) -> Self {
        Self {
            method: Method::Get,
            path: path.to_string(),
            headers,
            body: Body::Empty,
        }
    }

    pub fn post_json(path: &str, headers: HeaderMap, json: String) -> Self {
        Self {
            method: Method::Post,
            path: path.to_string(),
            headers,
            body: Body::Json(json),
        }
    }

    pub fn post_bytes(path: &str, headers: HeaderMap, bytes: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            path: path.to_string(),
            headers,
            body: Body::Bytes(bytes),
        }
    }
}

/// The single code space every caller branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveStatus {
    Success,
    Throttled,
    Failure(u16),
}

impl EffectiveStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            STATUS_OK => EffectiveStatus::Success,
            STATUS_THROTTLED => EffectiveStatus::Throttled,
            other => EffectiveStatus::Failure(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            EffectiveStatus::Success => STATUS_OK,
            EffectiveStatus::Throttled => STATUS_THROTTLED,
            EffectiveStatus::Failure(code) => code,
        }
    }
}

/// Normalized outcome of one call: the effective status plus the untouched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    pub status: EffectiveStatus,
    pub body: String,
}

impl ApiResult {
    /// Reconciles the transport status with an embedded `result.code`.
    ///
    /// The embedded code only counts when the transport reported 2xx and the
    /// body parses as JSON carrying that field; otherwise the transport status
    /// stands on its own.
    pub fn normalize(transport_status: u16, body: String) -> Self {
        let code = if (200..300).contains(&transport_status) {
            embedded_result_code(&body).unwrap_or(transport_status)
        } else {
            transport_status
        };
        Self {
            status: EffectiveStatus::from_code(code),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == EffectiveStatus::Success
    }

    pub fn code(&self) -> u16 {
        self.status.code()
    }
}

// `result.code` shows up both as "200" and as 200 depending on the endpoint.
fn embedded_result_code(body: &str) -> Option<u16> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let code = value.get("result")?.get("code")?;
    match code {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

/// Body of `POST authenticate`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub account_login: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_login", &self.account_login)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub job_guid: Uuid,
}
