//! Audit event schema and types.

use std::fmt;

use crate::credential::CredentialSource;
use crate::error::DenialKind;

/// Kind of audit event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// A membership gate decision
    Authentication,
    /// A role grant attempt
    RoleGrant,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::Authentication => write!(f, "authentication"),
            AuditEventKind::RoleGrant => write!(f, "role_grant"),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Attempt allowed or role granted
    Success,
    /// Attempt denied, or role skipped
    Denied,
    /// Internal failure
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// A structured audit event containing only safe metadata.
///
/// # Safety Invariants
///
/// - No raw brokered context is stored
/// - Credentials appear only in masked form
///
/// # Example
///
/// ```
/// use membership_gate::audit::{AuditEvent, AuditEventKind, AuditOutcome};
/// use membership_gate::CredentialSource;
///
/// let event = AuditEvent::new(
///     "attempt-123",
///     Some("octocat"),
///     AuditEventKind::Authentication,
///     AuditOutcome::Success,
/// )
/// .with_org("nidus-lab")
/// .with_credential(CredentialSource::UserCredential, "gho_...wxyz");
///
/// assert_eq!(event.attempt_id(), "attempt-123");
/// assert_eq!(event.masked_credential(), Some("gho_...wxyz"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    attempt_id: String,
    /// External username or subject, if known
    principal: Option<String>,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    org: Option<String>,
    credential_source: Option<CredentialSource>,
    /// Already masked; never a raw credential
    masked_credential: Option<String>,
    denial_kind: Option<DenialKind>,
    /// Free-form safe detail, e.g. the role name for grants
    detail: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event with required fields.
    pub fn new(
        attempt_id: impl Into<String>,
        principal: Option<impl Into<String>>,
        kind: AuditEventKind,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            principal: principal.map(Into::into),
            kind,
            outcome,
            org: None,
            credential_source: None,
            masked_credential: None,
            denial_kind: None,
            detail: None,
        }
    }

    /// Sets the organization the attempt was checked against.
    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Sets the credential source and its masked rendering.
    ///
    /// Callers must pass the output of [`Secret::masked`](crate::Secret::masked).
    pub fn with_credential(mut self, source: CredentialSource, masked: impl Into<String>) -> Self {
        self.credential_source = Some(source);
        self.masked_credential = Some(masked.into());
        self
    }

    /// Sets the denial kind.
    pub fn with_denial_kind(mut self, kind: DenialKind) -> Self {
        self.denial_kind = Some(kind);
        self
    }

    /// Sets a safe detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the attempt identifier.
    pub fn attempt_id(&self) -> &str {
        &self.attempt_id
    }

    /// Returns the principal, if known.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the organization, if set.
    pub fn org(&self) -> Option<&str> {
        self.org.as_deref()
    }

    /// Returns the credential source, if set.
    pub fn credential_source(&self) -> Option<CredentialSource> {
        self.credential_source
    }

    /// Returns the masked credential, if set.
    pub fn masked_credential(&self) -> Option<&str> {
        self.masked_credential.as_deref()
    }

    /// Returns the denial kind, if set.
    pub fn denial_kind(&self) -> Option<DenialKind> {
        self.denial_kind
    }

    /// Returns the detail, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, attempt_id={}, principal={}",
            self.kind,
            self.outcome,
            self.attempt_id,
            self.principal.as_deref().unwrap_or("<none>")
        )?;

        if let Some(org) = &self.org {
            write!(f, ", org={}", org)?;
        }
        if let Some(source) = self.credential_source {
            write!(f, ", credential_source={}", source)?;
        }
        if let Some(masked) = &self.masked_credential {
            write!(f, ", credential={}", masked)?;
        }
        if let Some(kind) = self.denial_kind {
            write!(f, ", denial={}", kind)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }

        write!(f, "]")
    }
}
