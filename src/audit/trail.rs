//! In-memory audit trail recorder.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::AuditEvent;

/// In-memory recorder for audit events.
///
/// Safe to share between concurrent attempts. A production host would
/// forward events to its own audit sink instead.
///
/// # Example
///
/// ```
/// use membership_gate::audit::{AuditTrail, AuditEvent, AuditEventKind, AuditOutcome};
///
/// let trail = AuditTrail::new();
///
/// trail.record(AuditEvent::new(
///     "attempt-123",
///     Some("octocat"),
///     AuditEventKind::Authentication,
///     AuditOutcome::Success,
/// ));
///
/// assert_eq!(trail.events().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates a new empty audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an audit event.
    pub fn record(&self, event: AuditEvent) {
        self.lock().push(event);
    }

    /// Returns a snapshot of all recorded events in recording order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
