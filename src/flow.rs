//! Adapter between a host authentication-flow engine and the gate.
//!
//! The host implements [`FlowSession`] over its own session type and calls
//! the two step runners. Everything host-specific (registration, config UI
//! metadata, challenge rendering) stays on the host side.

use std::collections::HashMap;

use crate::config::{GateConfig, RoleGrantConfig};
use crate::error::{Denial, FlowError};
use crate::gate::{GateDecision, MembershipGate};
use crate::roles::{GrantSummary, RoleGrantStep, RoleStore};
use crate::tainted::Tainted;
use crate::verifier::MembershipVerifier;

/// Auth note under which the host stores the serialized brokered context.
pub const BROKERED_CONTEXT_NOTE: &str = "BROKERED_CONTEXT";

/// The slice of a host authentication session the steps need.
pub trait FlowSession {
    /// Returns the auth note stored under `key`.
    fn auth_note(&self, key: &str) -> Option<String>;

    /// Returns the authenticator configuration, if one is attached.
    fn authenticator_config(&self) -> Option<&HashMap<String, String>>;

    /// Returns the identifier of the authenticated subject, if known.
    fn subject_id(&self) -> Option<&str>;

    /// Returns an identifier for this attempt, used to correlate logs.
    fn attempt_id(&self) -> &str;
}

/// A rejection reported back to the flow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFailure {
    /// Error classification
    pub error: FlowError,
    /// User-facing message
    pub message: String,
    /// HTTP status of the challenge response
    pub status: u16,
}

impl From<Denial> for FlowFailure {
    fn from(denial: Denial) -> Self {
        Self {
            error: denial.flow_error(),
            status: denial.http_status(),
            message: denial.message,
        }
    }
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The flow continues.
    Success,
    /// The flow stops with a failure challenge.
    Failure(FlowFailure),
}

impl StepOutcome {
    /// Returns `true` for [`StepOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }
}

impl From<GateDecision> for StepOutcome {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::Allow => StepOutcome::Success,
            GateDecision::Deny(denial) => StepOutcome::Failure(denial.into()),
        }
    }
}

/// Runs the membership gate as a flow step.
///
/// Configuration comes from the session's authenticator config (defaults
/// when none is attached). The brokered context is read from the
/// [`BROKERED_CONTEXT_NOTE`] auth note.
pub async fn run_membership_gate<S, V>(session: &S, verifier: V) -> StepOutcome
where
    S: FlowSession + ?Sized,
    V: MembershipVerifier,
{
    let config = session
        .authenticator_config()
        .map(GateConfig::from_authenticator_config)
        .unwrap_or_default();
    let gate = MembershipGate::new(config, verifier);

    let raw_context = session.auth_note(BROKERED_CONTEXT_NOTE).map(Tainted::new);

    gate.evaluate(session.attempt_id(), raw_context).await.into()
}

/// Runs the role grant as a flow step. Always succeeds.
pub fn run_role_grant<S, R>(session: &S, store: &R) -> StepOutcome
where
    S: FlowSession + ?Sized,
    R: RoleStore,
{
    grant_roles(session, store);
    StepOutcome::Success
}

/// Grants the configured roles to the session subject and reports what
/// happened. Used by [`run_role_grant`]; exposed for hosts that surface the
/// summary.
pub fn grant_roles<S, R>(session: &S, store: &R) -> GrantSummary
where
    S: FlowSession + ?Sized,
    R: RoleStore,
{
    let Some(subject) = session.subject_id() else {
        tracing::warn!(
            attempt_id = session.attempt_id(),
            "no subject in session, skipping role grant"
        );
        return GrantSummary::default();
    };

    let config = session
        .authenticator_config()
        .map(RoleGrantConfig::from_authenticator_config)
        .unwrap_or_default();

    RoleGrantStep::from_config(&config).grant(store, subject)
}
