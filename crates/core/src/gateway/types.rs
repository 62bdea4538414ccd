//! Values exchanged with the remote release service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Decoded body of a remote call.
///
/// The service answers with JSON most of the time, but some replies are bare
/// text. Bodies that do not decode as JSON are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Body decoded as JSON (object, array, string, boolean...).
    Json(Value),
    /// Body that could not be decoded.
    Text(String),
}

impl ApiResponse {
    /// Decode a response body, falling back to the raw text.
    pub fn decode(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body),
        }
    }

    /// Textual payload, whether it arrived as a JSON string or as raw text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(Value::String(s)) => Some(s),
            Self::Json(_) => None,
            Self::Text(s) => Some(s.trim()),
        }
    }

    /// JSON payload, if the body decoded.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// True when the body is the JSON literal `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Json(Value::Bool(true)))
    }

    /// Whether the body failed to decode.
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Identifier of a single hosted release link.
///
/// Listings carry codes either as JSON strings or numbers; both are kept in
/// their textual form since that is what restore requests send back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseCode(String);

impl ReleaseCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a code from a listing entry. Only strings and numbers qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ReleaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReleaseCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<u64> for ReleaseCode {
    fn from(code: u64) -> Self {
        Self(code.to_string())
    }
}

/// Name of a free-tier hosting account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(account: impl Into<String>) -> Self {
        Self(account.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(account: &str) -> Self {
        Self::new(account)
    }
}
