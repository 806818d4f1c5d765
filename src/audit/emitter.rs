//! Emission of audit events through tracing.

use super::{AuditEvent, AuditTrail};

/// `tracing` target used for audit events.
pub const AUDIT_TARGET: &str = "membership_audit";

/// Emits audit events as structured `tracing` events and, when given a
/// trail, records them too.
///
/// # Example
///
/// ```
/// use membership_gate::audit::{AuditEmitter, AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// let emitter = AuditEmitter::with_trail(&trail);
///
/// emitter.emit(AuditEvent::new(
///     "attempt-1",
///     Some("octocat"),
///     AuditEventKind::Authentication,
///     AuditOutcome::Denied,
/// ));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditEmitter<'a> {
    trail: Option<&'a AuditTrail>,
}

impl<'a> AuditEmitter<'a> {
    /// An emitter that only logs.
    pub fn new() -> Self {
        Self { trail: None }
    }

    /// An emitter that logs and records into `trail`.
    pub fn with_trail(trail: &'a AuditTrail) -> Self {
        Self { trail: Some(trail) }
    }

    /// Emits `event`.
    pub fn emit(&self, event: AuditEvent) {
        tracing::info!(
            target: AUDIT_TARGET,
            attempt_id = %event.attempt_id(),
            principal = ?event.principal(),
            kind = %event.kind(),
            outcome = %event.outcome(),
            org = ?event.org(),
            credential_source = ?event.credential_source(),
            credential = ?event.masked_credential(),
            denial = ?event.denial_kind(),
            detail = ?event.detail(),
            "audit event"
        );

        if let Some(trail) = self.trail {
            trail.record(event);
        }
    }
}
