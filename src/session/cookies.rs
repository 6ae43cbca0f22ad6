//! Session cookie normalization
//!
//! Callers hand over cookies exported by browser extensions, which use a
//! looser schema than browser engines accept (string same-site policies,
//! fractional `expirationDate` in place of `expires`). This module turns
//! such payloads into a normalized set, or rejects them as "no cookies"
//! without ever failing the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical same-site policies accepted by browser engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    /// Maps an exported cookie's policy string onto a canonical value,
    /// defaulting to the lenient policy when unrecognized.
    fn from_exported(raw: Option<&str>) -> Self {
        match raw {
            Some("no_restriction") | Some("None") => SameSite::None,
            Some("strict") | Some("Strict") => SameSite::Strict,
            _ => SameSite::Lax,
        }
    }
}

/// A cookie as exported by browser tooling
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    http_only: Option<bool>,
    #[serde(default)]
    secure: Option<bool>,
    #[serde(default)]
    same_site: Option<String>,
    #[serde(default)]
    expiration_date: Option<f64>,
    #[serde(default)]
    expires: Option<i64>,
}

/// A normalized cookie ready for injection into the browser context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl From<ExportedCookie> for SessionCookie {
    fn from(raw: ExportedCookie) -> Self {
        let same_site = SameSite::from_exported(raw.same_site.as_deref());
        // expirationDate carries fractional seconds; floor to whole epoch seconds
        let expires = raw
            .expiration_date
            .map(|seconds| seconds.floor() as i64)
            .or(raw.expires);

        Self {
            name: raw.name,
            value: raw.value,
            domain: raw.domain,
            path: raw.path.unwrap_or_else(|| "/".to_string()),
            http_only: raw.http_only.unwrap_or(false),
            secure: raw.secure.unwrap_or(true),
            same_site,
            expires,
        }
    }
}

/// Parses a caller-supplied cookie payload into normalized session cookies.
///
/// Accepts either a JSON array of cookie objects or the same array serialized
/// as a string. A payload that is not list-shaped, or any entry that fails
/// validation, is logged and treated as "no cookies", never as a fatal error.
pub fn parse_cookie_payload(payload: &Value) -> Option<Vec<SessionCookie>> {
    let parsed_string;
    let candidate = match payload {
        Value::String(raw) => {
            parsed_string = match serde_json::from_str::<Value>(raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to parse session cookie payload: {e}");
                    return None;
                }
            };
            &parsed_string
        }
        other => other,
    };

    let Value::Array(entries) = candidate else {
        tracing::warn!("Session cookie payload is not an array; skipping injection");
        return None;
    };

    let mut cookies = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ExportedCookie>(entry.clone()) {
            Ok(raw) => cookies.push(SessionCookie::from(raw)),
            Err(e) => {
                tracing::warn!("Malformed session cookie in payload: {e}");
                return None;
            }
        }
    }
    Some(cookies)
}
