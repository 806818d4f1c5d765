//! Type states of an authentication attempt.
//!
//! An [`Attempt`](crate::Attempt) moves through these states in order:
//!
//! ```text
//! Start -> ContextParsed -> CredentialResolved -> Verified
//! ```
//!
//! Each state carries exactly what is known at that point. Fields are
//! crate-private, so an attempt in a later state is proof that the earlier
//! checks ran.

use crate::credential::CredentialSource;
use crate::secret::Secret;
use crate::verifier::MembershipOutcome;

/// The attempt has been created but nothing has been read yet.
#[derive(Debug, Clone, Copy)]
pub struct Start {
    _private: (),
}

impl Start {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// The brokered context was present and has been run through the extractor.
///
/// Either value may still be missing.
#[derive(Debug)]
pub struct ContextParsed {
    pub(crate) username: Option<String>,
    pub(crate) credential: Option<Secret<String>>,
}

/// A username is known and exactly one credential has been selected.
#[derive(Debug)]
pub struct CredentialResolved {
    pub(crate) username: String,
    pub(crate) credential: Secret<String>,
    pub(crate) source: CredentialSource,
}

/// The membership API has been consulted and its answer classified.
///
/// The credential itself is dropped once the call is made.
#[derive(Debug)]
pub struct Verified {
    pub(crate) username: String,
    pub(crate) source: CredentialSource,
    pub(crate) outcome: MembershipOutcome,
}
