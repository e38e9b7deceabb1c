// src/models/cookie.rs

//! Exported browser cookie records.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One cookie as exported by a browser cookie extension.
///
/// Field names follow the export format so existing cookie dumps load
/// without conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,

    pub value: String,

    pub domain: String,

    pub path: String,

    #[serde(default)]
    pub secure: bool,

    /// Unix timestamp, fractional seconds allowed
    #[serde(
        rename = "expirationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<f64>,

    #[serde(rename = "httpOnly", default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,

    /// `lax`, `strict`, `no_restriction`, or `unspecified`
    #[serde(rename = "sameSite", default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl CookieRecord {
    /// Load all cookie records from a JSON array file.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
