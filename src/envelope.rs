//! Request/response envelope shared by every handler.
//!
//! A handler sees only the HTTP method, the headers and the raw body of a
//! request, and answers with a status code, a header map and a string body.
//! The server layer translates between this envelope and real HTTP.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const HEADER_ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const HEADER_ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const HEADER_ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const HEADER_MAX_AGE: &str = "Access-Control-Max-Age";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

const PREFLIGHT_MAX_AGE: &str = "86400";
const FALLBACK_ERROR_BODY: &str = r#"{"error":"Internal server error"}"#;

/// CORS allow-lists a handler advertises on preflight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_methods: &'static str,
    pub allow_headers: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRequest {
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

impl HandlerRequest {
    pub fn new(method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            http_method: method.into(),
            headers: BTreeMap::new(),
            body,
            is_base64_encoded: false,
        }
    }

    /// Decodes the body into `T`. A missing or blank body reads as `{}`.
    pub fn json_body<T: DeserializeOwned>(&self) -> AppResult<T> {
        let raw = match &self.body {
            Some(body) => body.as_str(),
            None => "",
        };

        let bytes = if self.is_base64_encoded {
            BASE64.decode(raw.trim()).map_err(|e| {
                tracing::debug!("Failed to base64-decode request body: {}", e);
                AppError::InvalidInput("Invalid request body".to_string())
            })?
        } else {
            raw.as_bytes().to_vec()
        };

        let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            AppError::InvalidInput("Invalid request body".to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl HandlerResponse {
    pub fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::with_json_headers(status_code, body),
            Err(e) => {
                tracing::error!("Failed to serialize response body: {}", e);
                Self::with_json_headers(500, FALLBACK_ERROR_BODY.to_string())
            }
        }
    }

    pub fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(200, value)
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &ErrorBody { error: message })
    }

    /// Empty 200 answer to a CORS preflight.
    pub fn preflight(cors: &CorsPolicy) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_ALLOW_ORIGIN.to_string(), "*".to_string());
        headers.insert(HEADER_ALLOW_METHODS.to_string(), cors.allow_methods.to_string());
        headers.insert(HEADER_ALLOW_HEADERS.to_string(), cors.allow_headers.to_string());
        headers.insert(HEADER_MAX_AGE.to_string(), PREFLIGHT_MAX_AGE.to_string());

        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    fn with_json_headers(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_ALLOW_ORIGIN.to_string(), "*".to_string());
        headers.insert(HEADER_CONTENT_TYPE.to_string(), "application/json".to_string());

        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
