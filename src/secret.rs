use std::fmt;

use serde::{Deserialize, Deserializer};

/// Placeholder shown instead of credentials too short to mask partially.
pub const MASK_PLACEHOLDER: &str = "***";

/// A wrapper that keeps credential material out of logs and error messages.
///
/// Access tokens recovered from a brokered context and statically configured
/// service credentials are held as `Secret<String>` for their whole lifetime.
/// The only ways to look at the value are the explicit
/// [`expose_secret`](Self::expose_secret) call and, for strings, the partial
/// [`masked`](Secret::masked) rendering meant for diagnostics.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - No type information is leaked in formatted output
///
/// # Examples
///
/// ```
/// use membership_gate::Secret;
///
/// let token = Secret::new("gho_1234567890abcdef".to_string());
///
/// assert_eq!(format!("{:?}", token), "[REDACTED]");
/// assert_eq!(token.masked(), "gho_...cdef");
/// assert_eq!(token.expose_secret(), "gho_1234567890abcdef");
/// ```
// BREAKING CHANGE WARNING: Do NOT add Clone, Copy, or Default derives.
// Duplicating a credential goes through the crate-private `duplicate`.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// # Security Warning
    ///
    /// The only caller in this crate is the HTTP verifier when it writes the
    /// `Authorization` header; the `expose_secret_outside_verifier` lint in
    /// `dylint/` rejects any other. Never log the returned value.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<String> {
    /// Renders the credential for diagnostics.
    ///
    /// Credentials longer than 8 characters show their first 4 and last 4
    /// characters around `...`; anything shorter collapses to
    /// [`MASK_PLACEHOLDER`].
    pub fn masked(&self) -> String {
        mask(&self.inner)
    }

    /// Returns `true` if the credential is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }

    /// Copies the credential into a new, independently owned `Secret`.
    pub(crate) fn duplicate(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= 8 {
        return MASK_PLACEHOLDER.to_string();
    }

    let head: String = value.chars().take(4).collect();
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{head}...{tail}")
}

impl<T> fmt::Debug for Secret<T> {
    // MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    // MUST unconditionally return "[REDACTED]" (CWE-532).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}
