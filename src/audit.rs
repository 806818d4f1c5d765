//! Audit records for gate decisions and role grants.
//!
//! This module provides:
//! - `AuditEvent`: one record per decision or grant
//! - `AuditTrail`: in-memory recorder, shareable across threads
//! - `AuditEmitter`: emits events through `tracing` and optionally records them
//!
//! Events only ever hold masked credentials. Neither the raw brokered
//! context nor a raw token can be stored in an event.

mod emitter;
mod event;
mod trail;

pub use emitter::{AuditEmitter, AUDIT_TARGET};
pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
