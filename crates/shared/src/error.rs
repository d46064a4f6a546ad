use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNameError {
    #[error("navigation parameter '{key}' is missing")]
    Missing { key: &'static str },
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },
    #[error("qualified name '{raw}' has no path segments")]
    NoSegments { raw: String },
    #[error("{kind} must not contain '{found}'")]
    InvalidCharacter { kind: &'static str, found: char },
}

/// Error body returned by the mission database REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub msg: String,
}

impl ApiError {
    pub fn new(code: u16, kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            code,
            kind: kind.into(),
            msg: msg.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind.is_empty() {
            write!(f, "{}: {}", self.code, self.msg)
        } else {
            write!(f, "{} {}: {}", self.code, self.kind, self.msg)
        }
    }
}
