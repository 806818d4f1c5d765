use std::fmt;

/// A wrapper for the untrusted brokered context handed over by the flow engine.
///
/// The serialized context is produced by an upstream identity-broker exchange
/// and embeds token material, so it is both untrusted and sensitive. Only the
/// context extractor reads the wrapped value; everything else can at most ask
/// for its length.
///
/// # Security Properties
///
/// - Does NOT implement `Deref` or any implicit conversion traits
/// - Debug output never contains the wrapped value
///
/// # Examples
///
/// ```
/// use membership_gate::Tainted;
///
/// let raw = Tainted::new(r#"{"token":"access_token=gho_secret"}"#.to_string());
///
/// assert_eq!(format!("{:?}", raw), "Tainted(..)");
/// ```
// BREAKING CHANGE WARNING: Do NOT add Deref, AsRef, Borrow, From<T>, Into<T>.
// Raw contexts carry tokens and must only be read through the extractor.
#[derive(Clone)]
pub struct Tainted<T> {
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value in `Tainted`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the raw value for parsing.
    ///
    /// `pub(crate)` on purpose: only the extractor may look inside.
    pub(crate) fn untrusted(&self) -> &T {
        &self.inner
    }
}

impl Tainted<String> {
    /// Returns the length of the raw value in bytes.
    ///
    /// Safe to log in place of the context itself.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the raw value is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tainted(..)")
    }
}
