//! Control-plane HTTP access.
//!
//! `client` owns the authenticated reqwest wrapper. This module holds the
//! response body type shared with the error taxonomy.

pub mod client;

pub use client::FactoryClient;

use serde_json::Value;

/// A response body, classified once so callers never guess.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Zero-length (or whitespace-only) body.
    Empty,
    /// Body that parsed as JSON.
    Json(Value),
    /// Body that is present but not JSON.
    Text(String),
}

impl ResponseBody {
    /// Classify raw response text.
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text.to_string()),
        }
    }

    /// Render for an operator: pretty JSON, raw text, or a marker.
    pub fn to_pretty(&self) -> String {
        match self {
            ResponseBody::Empty => "(empty body)".into(),
            ResponseBody::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ResponseBody::Text(text) => text.clone(),
        }
    }
}
