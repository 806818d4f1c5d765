//! Recovery of the username and access credential from a brokered context.
//!
//! Brokers have stored these values in different places across versions, so
//! both are looked up through a fixed fallback chain. The first non-blank
//! value wins and is never replaced by a later fallback.

use std::fmt;

use crate::document::BrokeredDocument;
use crate::secret::Secret;
use crate::tainted::Tainted;

/// Primary username field at the document root.
pub const MODEL_USERNAME: &str = "modelUsername";

/// Fallback username field at the document root.
pub const BROKER_USERNAME: &str = "brokerUsername";

/// Path of the access token captured during the federated exchange.
pub const FEDERATED_ACCESS_TOKEN_PATH: [&str; 3] = ["contextData", "FEDERATED_ACCESS_TOKEN", "data"];

/// Raw token field at the document root.
pub const RAW_TOKEN: &str = "token";

const ACCESS_TOKEN_KEY: &str = "access_token=";

/// Username and credential recovered from a brokered context.
///
/// Either field may be absent; callers must check both.
#[derive(Default)]
pub struct ExtractionResult {
    /// The external account name, if any non-blank candidate was found.
    pub username: Option<String>,
    /// The per-user access token, if any non-blank candidate was found.
    pub credential: Option<Secret<String>>,
}

impl fmt::Debug for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionResult")
            .field("username", &self.username)
            .field("credential", &self.credential.as_ref().map(|c| c.masked()))
            .finish()
    }
}

/// Extracts the username and credential from a raw brokered context.
///
/// Never fails: an unparseable context yields a result with both fields
/// absent.
///
/// # Examples
///
/// ```
/// use membership_gate::{extract, Tainted};
///
/// let raw = Tainted::new(
///     r#"{"modelUsername":"octocat","token":"foo=1&access_token=abc123&bar=2"}"#.to_string(),
/// );
/// let result = extract(&raw);
///
/// assert_eq!(result.username.as_deref(), Some("octocat"));
/// assert_eq!(result.credential.unwrap().expose_secret(), "abc123");
/// ```
pub fn extract(raw: &Tainted<String>) -> ExtractionResult {
    let Some(doc) = BrokeredDocument::parse(raw.untrusted()) else {
        tracing::debug!(context_len = raw.len(), "brokered context is not valid JSON");
        return ExtractionResult::default();
    };

    ExtractionResult {
        username: extract_username(&doc),
        credential: extract_credential(&doc).map(Secret::new),
    }
}

fn extract_username(doc: &BrokeredDocument) -> Option<String> {
    doc.non_blank_at(&[MODEL_USERNAME])
        .or_else(|| doc.non_blank_at(&[BROKER_USERNAME]))
        .map(str::to_string)
}

fn extract_credential(doc: &BrokeredDocument) -> Option<String> {
    if let Some(token) = doc.non_blank_at(&FEDERATED_ACCESS_TOKEN_PATH) {
        return Some(token.to_string());
    }

    let raw_token = doc.string_at(&[RAW_TOKEN]).unwrap_or_default();
    credential_from_raw_token(raw_token)
}

/// Interprets the legacy `token` field.
///
/// Form-encoded content yields its `access_token` value. Otherwise a
/// non-blank value is taken verbatim unless it starts with `{`, which marks a
/// serialized object rather than a token.
fn credential_from_raw_token(raw_token: &str) -> Option<String> {
    if raw_token.contains(ACCESS_TOKEN_KEY) {
        return raw_token
            .split('&')
            .find_map(|part| part.strip_prefix(ACCESS_TOKEN_KEY))
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string);
    }

    if !raw_token.trim().is_empty() && !raw_token.starts_with('{') {
        return Some(raw_token.to_string());
    }

    None
}
