//! Tolerant accessor over the brokered context document.
//!
//! Upstream brokers enforce no schema on the serialized context, so every
//! lookup here answers `None` for a missing key, a non-object parent, or a
//! leaf that is not a string. Nothing in this module fails or panics.

use serde_json::Value;

/// A parsed brokered context.
///
/// Holds no state beyond the parsed tree and may be shared freely.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokeredDocument {
    root: Value,
}

impl BrokeredDocument {
    /// Parses a serialized context. Returns `None` if it is not valid JSON.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok().map(|root| Self { root })
    }

    /// Returns the string at `path`, walking nested objects key by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_gate::BrokeredDocument;
    ///
    /// let doc = BrokeredDocument::parse(r#"{"a":{"b":"c","n":1}}"#).unwrap();
    /// assert_eq!(doc.string_at(&["a", "b"]), Some("c"));
    /// assert_eq!(doc.string_at(&["a", "n"]), None);
    /// assert_eq!(doc.string_at(&["a", "b", "deeper"]), None);
    /// ```
    pub fn string_at(&self, path: &[&str]) -> Option<&str> {
        path.iter()
            .try_fold(&self.root, |node, key| node.as_object()?.get(*key))?
            .as_str()
    }

    /// Like [`string_at`](Self::string_at), but treats blank strings as absent.
    pub fn non_blank_at(&self, path: &[&str]) -> Option<&str> {
        self.string_at(path).filter(|s| !s.trim().is_empty())
    }
}
