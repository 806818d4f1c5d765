use crate::credential::{select_credential, CredentialSource};
use crate::error::{Denial, DenialKind, GateError};
use crate::extract::extract;
use crate::gate::GateDecision;
use crate::secret::Secret;
use crate::state::{ContextParsed, CredentialResolved, Start, Verified};
use crate::tainted::Tainted;
use crate::verifier::{MembershipOutcome, MembershipVerifier};

/// One authentication attempt moving through the gate.
///
/// `Attempt<S>` is generic over its progress through the gate, and each
/// state carries only what is known at that point:
/// - `Attempt<Start>`: nothing read yet
/// - `Attempt<ContextParsed>`: extraction done, username/credential may be absent
/// - `Attempt<CredentialResolved>`: username present, exactly one credential chosen
/// - `Attempt<Verified>`: membership outcome known
///
/// # Type-State Progression
///
/// ```text
/// Attempt<Start> --parse_context--> Attempt<ContextParsed>
///     --resolve_credential--> Attempt<CredentialResolved>
///     --verify--> Attempt<Verified> --decision--> GateDecision
/// ```
///
/// Every transition consumes the attempt; a failed check ends it with a
/// [`Denial`]. Nothing is retained once the decision is made.
///
/// # Examples
///
/// ```
/// use membership_gate::{Attempt, DenialKind, Tainted};
///
/// let raw = Tainted::new(r#"{"brokerUsername":"octocat"}"#.to_string());
/// let parsed = Attempt::new("attempt-1").parse_context(Some(&raw)).unwrap();
/// assert_eq!(parsed.username(), Some("octocat"));
///
/// let denial = parsed.resolve_credential(None).unwrap_err();
/// assert_eq!(denial.kind, DenialKind::MissingCredential);
/// ```
#[derive(Debug)]
pub struct Attempt<S = Start> {
    attempt_id: String,
    state: S,
}

impl<S> Attempt<S> {
    /// Returns the attempt ID.
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }
}

// ============================================================================
// Attempt<Start>
// ============================================================================

impl Attempt<Start> {
    /// Starts a new attempt.
    pub fn new(attempt_id: impl Into<String>) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            state: Start::new(),
        }
    }

    /// Runs the context extractor over the raw brokered context.
    ///
    /// # Errors
    ///
    /// Returns a [`DenialKind::MissingContext`] denial if the flow engine never
    /// supplied a context. An unparseable context is *not* an error here; it
    /// simply yields no username and no credential.
    pub fn parse_context(
        self,
        raw: Option<&Tainted<String>>,
    ) -> Result<Attempt<ContextParsed>, Denial> {
        let raw = raw.ok_or_else(Denial::missing_context)?;
        let extraction = extract(raw);

        Ok(Attempt {
            attempt_id: self.attempt_id,
            state: ContextParsed {
                username: extraction.username,
                credential: extraction.credential,
            },
        })
    }
}

// ============================================================================
// Attempt<ContextParsed>
// ============================================================================

impl Attempt<ContextParsed> {
    /// Returns the recovered username, if any.
    pub fn username(&self) -> Option<&str> {
        self.state.username.as_deref()
    }

    /// Returns [`CredentialSource::UserCredential`] if the context carried a
    /// credential.
    pub fn credential_source(&self) -> CredentialSource {
        match self.state.credential {
            Some(_) => CredentialSource::UserCredential,
            None => CredentialSource::None,
        }
    }

    /// Returns the extracted credential in masked form, if any.
    pub fn masked_credential(&self) -> Option<String> {
        self.state.credential.as_ref().map(Secret::masked)
    }

    /// Requires a username and picks the credential to present.
    ///
    /// # Errors
    ///
    /// Returns [`DenialKind::MissingUsername`] if no username was recovered,
    /// or [`DenialKind::MissingCredential`] if neither `service` nor the
    /// extracted user credential is usable.
    pub fn resolve_credential(
        self,
        service: Option<&Secret<String>>,
    ) -> Result<Attempt<CredentialResolved>, Denial> {
        let ContextParsed {
            username,
            credential,
        } = self.state;
        let username = username.ok_or_else(Denial::missing_username)?;

        let (credential, source) = select_credential(service, credential)
            .into_parts()
            .ok_or_else(Denial::missing_credential)?;

        Ok(Attempt {
            attempt_id: self.attempt_id,
            state: CredentialResolved {
                username,
                credential,
                source,
            },
        })
    }
}

// ============================================================================
// Attempt<CredentialResolved>
// ============================================================================

impl Attempt<CredentialResolved> {
    /// Returns the username to verify.
    pub fn username(&self) -> &str {
        &self.state.username
    }

    /// Returns where the selected credential came from.
    pub fn credential_source(&self) -> CredentialSource {
        self.state.source
    }

    /// Returns the selected credential in masked form.
    pub fn masked_credential(&self) -> String {
        self.state.credential.masked()
    }

    /// Asks `verifier` whether the username is a member of `org`.
    ///
    /// # Errors
    ///
    /// Propagates internal [`GateError`]s from the verifier. Transport
    /// failures are not errors; they come back as
    /// [`MembershipOutcome::Unreachable`].
    pub async fn verify<V>(self, verifier: &V, org: &str) -> Result<Attempt<Verified>, GateError>
    where
        V: MembershipVerifier + ?Sized,
    {
        let outcome = verifier
            .verify(org, &self.state.username, &self.state.credential)
            .await?;

        let CredentialResolved {
            username, source, ..
        } = self.state;
        Ok(Attempt {
            attempt_id: self.attempt_id,
            state: Verified {
                username,
                source,
                outcome,
            },
        })
    }
}

// ============================================================================
// Attempt<Verified>
// ============================================================================

impl Attempt<Verified> {
    /// Returns the verified username.
    pub fn username(&self) -> &str {
        &self.state.username
    }

    /// Returns where the presented credential came from.
    pub fn credential_source(&self) -> CredentialSource {
        self.state.source
    }

    /// Returns the classified membership outcome.
    pub fn outcome(&self) -> MembershipOutcome {
        self.state.outcome
    }

    /// Turns the outcome into the terminal decision.
    ///
    /// Allow if and only if the outcome is [`MembershipOutcome::Active`].
    pub fn decision(&self, org: &str) -> GateDecision {
        match denial_for(self.outcome(), org) {
            None => GateDecision::Allow,
            Some(denial) => GateDecision::Deny(denial),
        }
    }
}

/// Maps a non-active outcome to its user-facing denial.
///
/// Messages name the organization but never the credential.
pub fn denial_for(outcome: MembershipOutcome, org: &str) -> Option<Denial> {
    let denial = match outcome {
        MembershipOutcome::Active => return None,
        MembershipOutcome::NotActive => Denial::new(
            DenialKind::NotActiveMember,
            format!("account is not an active member of {org}"),
        ),
        MembershipOutcome::Unauthorized => Denial::new(
            DenialKind::Unauthorized,
            format!("membership of {org} could not be verified: credential was rejected"),
        ),
        MembershipOutcome::Unreachable => Denial::new(
            DenialKind::Unreachable,
            format!("membership of {org} could not be verified: service unreachable"),
        ),
        MembershipOutcome::MalformedResponse => Denial::new(
            DenialKind::MalformedResponse,
            format!("membership of {org} could not be verified: malformed response"),
        ),
    };
    Some(denial)
}
