use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::Instrument;

use crate::attempt::Attempt;
use crate::audit::{AuditEmitter, AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
use crate::config::{organization_or_default, GateConfig, DEFAULT_ORGANIZATION};
use crate::credential::CredentialSource;
use crate::error::{Denial, DenialKind, GateError};
use crate::logging::GateLog;
use crate::tainted::Tainted;
use crate::verifier::{HttpMembershipVerifier, MembershipVerifier};

/// Terminal outcome of the membership gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The subject is an active member; the flow may proceed.
    Allow,
    /// The attempt is rejected.
    Deny(Denial),
}

impl GateDecision {
    /// Returns `true` for [`GateDecision::Allow`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    /// Returns the denial, if any.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Deny(denial) => Some(denial),
        }
    }

    /// Returns the user-facing reason of a denial.
    pub fn reason(&self) -> Option<&str> {
        self.denial().map(|denial| denial.message.as_str())
    }
}

/// The membership gate.
///
/// `MembershipGate` is the only component the authentication-flow engine
/// talks to. Each call to [`evaluate`](Self::evaluate) runs one attempt
/// through extraction, credential selection and verification and always
/// resolves to [`GateDecision::Allow`] or [`GateDecision::Deny`]; internal
/// errors and panics become denials.
///
/// The gate holds no per-attempt state and may be shared across concurrent
/// attempts.
///
/// # Examples
///
/// ```no_run
/// use membership_gate::{GateConfig, MembershipGate, Tainted};
///
/// # async fn run() -> Result<(), membership_gate::GateError> {
/// let gate = MembershipGate::from_config(GateConfig::default())?;
///
/// let raw = Tainted::new(
///     r#"{"modelUsername":"octocat","token":"access_token=gho_abc&scope=read:org"}"#.to_string(),
/// );
/// let decision = gate.evaluate("attempt-1", Some(raw)).await;
///
/// if let Some(reason) = decision.reason() {
///     tracing::warn!(reason, "sign-in denied");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MembershipGate<V> {
    config: GateConfig,
    verifier: V,
}

impl MembershipGate<HttpMembershipVerifier> {
    /// Builds a gate backed by the HTTP membership API described in `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`GateError`] if the HTTP verifier cannot be built.
    pub fn from_config(config: GateConfig) -> Result<Self, GateError> {
        let verifier = HttpMembershipVerifier::new(&config)?;
        Ok(Self::new(config, verifier))
    }
}

impl<V: MembershipVerifier> MembershipGate<V> {
    /// Creates a gate from a configuration and a verifier.
    ///
    /// A blank organization is replaced by [`DEFAULT_ORGANIZATION`].
    pub fn new(mut config: GateConfig, verifier: V) -> Self {
        if config.organization.trim().is_empty() {
            tracing::warn!(
                default = DEFAULT_ORGANIZATION,
                "blank organization configured, using default"
            );
        }
        config.organization = organization_or_default(&config.organization);
        Self { config, verifier }
    }

    /// Returns the gate configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluates one attempt.
    ///
    /// `raw_context` is the serialized brokered context, or `None` if the flow
    /// engine never populated it.
    pub async fn evaluate(
        &self,
        attempt_id: &str,
        raw_context: Option<Tainted<String>>,
    ) -> GateDecision {
        self.evaluate_with(attempt_id, raw_context, AuditEmitter::new())
            .await
    }

    /// Evaluates one attempt and records its audit event into `trail`.
    pub async fn evaluate_audited(
        &self,
        attempt_id: &str,
        raw_context: Option<Tainted<String>>,
        trail: &AuditTrail,
    ) -> GateDecision {
        self.evaluate_with(attempt_id, raw_context, AuditEmitter::with_trail(trail))
            .await
    }

    async fn evaluate_with(
        &self,
        attempt_id: &str,
        raw_context: Option<Tainted<String>>,
        audit: AuditEmitter<'_>,
    ) -> GateDecision {
        let org = self.config.organization.as_str();
        let log = GateLog::new(attempt_id, org);
        let span = tracing::info_span!("membership_gate", attempt_id, org);

        // Filled in as the attempt progresses, so it survives a panic.
        let mut evaluation = Evaluation::default();

        let run = self.run(attempt_id, raw_context.as_ref(), log, &mut evaluation);
        let completed = AssertUnwindSafe(run)
            .catch_unwind()
            .instrument(span)
            .await;

        if let Err(panic) = completed {
            log.error(format_args!(
                "membership check panicked: {}",
                panic_message(panic.as_ref())
            ));
            evaluation.deny(log, GateError::Panicked.into());
        }

        audit.emit(evaluation.audit_event(attempt_id, org));
        evaluation.decision
    }

    async fn run(
        &self,
        attempt_id: &str,
        raw_context: Option<&Tainted<String>>,
        log: GateLog<'_>,
        evaluation: &mut Evaluation,
    ) {
        let org = self.config.organization.as_str();

        match raw_context {
            Some(raw) => log.debug(format_args!("brokered context received ({} bytes)", raw.len())),
            None => log.warn(format_args!("brokered context missing from session")),
        }

        let parsed = match Attempt::new(attempt_id).parse_context(raw_context) {
            Ok(parsed) => parsed,
            Err(denial) => return evaluation.deny(log, denial),
        };
        evaluation.username = parsed.username().map(str::to_owned);

        let resolved = match parsed.resolve_credential(self.config.service_credential.as_ref()) {
            Ok(resolved) => resolved,
            Err(denial) => return evaluation.deny(log, denial),
        };

        let source = resolved.credential_source();
        let masked = resolved.masked_credential();
        log.debug(format_args!("using {source} for membership request"));
        log.info(format_args!(
            "verifying membership for user {} (credential: {masked})",
            resolved.username()
        ));
        evaluation.credential = Some((source, masked));

        let verified = match resolved.verify(&self.verifier, org).await {
            Ok(verified) => verified,
            Err(err) => {
                log.error(format_args!("error verifying membership: {err}"));
                return evaluation.deny(log, err.into());
            }
        };

        match verified.decision(org) {
            GateDecision::Allow => {
                log.info(format_args!(
                    "membership verified for user {}",
                    verified.username()
                ));
                evaluation.decision = GateDecision::Allow;
            }
            GateDecision::Deny(denial) => evaluation.deny(log, denial),
        }
    }
}

/// Everything the gate learned about one attempt, for logging and audit.
#[derive(Debug)]
struct Evaluation {
    username: Option<String>,
    credential: Option<(CredentialSource, String)>,
    decision: GateDecision,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            username: None,
            credential: None,
            decision: GateDecision::Deny(Denial::new(
                DenialKind::InternalError,
                "error verifying membership: no decision reached",
            )),
        }
    }
}

impl Evaluation {
    fn deny(&mut self, log: GateLog<'_>, denial: Denial) {
        log.warn(format_args!(
            "membership gate denied user {}: {}",
            self.username.as_deref().unwrap_or("<unknown>"),
            denial
        ));
        self.decision = GateDecision::Deny(denial);
    }

    fn audit_event(&self, attempt_id: &str, org: &str) -> AuditEvent {
        let outcome = match &self.decision {
            GateDecision::Allow => AuditOutcome::Success,
            GateDecision::Deny(denial) if denial.kind == DenialKind::InternalError => {
                AuditOutcome::Error
            }
            GateDecision::Deny(_) => AuditOutcome::Denied,
        };

        let mut event = AuditEvent::new(
            attempt_id,
            self.username.as_deref(),
            AuditEventKind::Authentication,
            outcome,
        )
        .with_org(org);

        if let Some((source, masked)) = &self.credential {
            event = event.with_credential(*source, masked.as_str());
        }
        if let Some(denial) = self.decision.denial() {
            event = event.with_denial_kind(denial.kind);
        }
        event
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "panic"
    }
}
