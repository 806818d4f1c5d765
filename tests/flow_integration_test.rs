//! Tests of the flow-engine adapter: session notes, authenticator config and
//! the step outcomes reported back to the host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use membership_gate::flow::{
    grant_roles, run_membership_gate, run_role_grant, FlowFailure, FlowSession, StepOutcome,
    BROKERED_CONTEXT_NOTE,
};
use membership_gate::{
    FlowError, GateError, InMemoryRoleStore, MembershipOutcome, MembershipVerifier, RoleSpec,
    Secret, FORBIDDEN_STATUS,
};

/// A host session as a flow engine would expose it.
#[derive(Default)]
struct HostSession {
    notes: HashMap<String, String>,
    config: Option<HashMap<String, String>>,
    subject: Option<String>,
}

impl HostSession {
    fn with_context(context: &str) -> Self {
        Self {
            notes: HashMap::from([(BROKERED_CONTEXT_NOTE.to_string(), context.to_string())]),
            ..Self::default()
        }
    }

    fn with_config(mut self, pairs: &[(&str, &str)]) -> Self {
        self.config = Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }
}

impl FlowSession for HostSession {
    fn auth_note(&self, key: &str) -> Option<String> {
        self.notes.get(key).cloned()
    }

    fn authenticator_config(&self) -> Option<&HashMap<String, String>> {
        self.config.as_ref()
    }

    fn subject_id(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn attempt_id(&self) -> &str {
        "flow-attempt"
    }
}

/// Verifier that records the organization and credential it was asked about.
struct Spy {
    outcome: MembershipOutcome,
    seen: Mutex<Vec<(String, String)>>,
}

impl Spy {
    fn new(outcome: MembershipOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MembershipVerifier for Spy {
    async fn verify(
        &self,
        org: &str,
        _subject: &str,
        credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError> {
        self.seen
            .lock()
            .unwrap()
            .push((org.to_string(), credential.expose_secret().clone()));
        Ok(self.outcome)
    }
}

const CONTEXT: &str = r#"{"brokerUsername":"octocat","token":"gho_raw_user_token"}"#;

#[tokio::test]
async fn gate_step_reads_context_note_and_config() {
    let spy = Spy::new(MembershipOutcome::Active);
    let session = HostSession::with_context(CONTEXT).with_config(&[
        ("githubOrg", "acme-corp"),
        ("githubServiceToken", "ghp_configured_service"),
    ]);

    let outcome = run_membership_gate(&session, Arc::clone(&spy)).await;

    assert_eq!(outcome, StepOutcome::Success);
    assert_eq!(
        *spy.seen.lock().unwrap(),
        vec![("acme-corp".to_string(), "ghp_configured_service".to_string())]
    );
}

#[tokio::test]
async fn gate_step_uses_defaults_without_config() {
    let spy = Spy::new(MembershipOutcome::Active);
    let session = HostSession::with_context(CONTEXT);

    run_membership_gate(&session, Arc::clone(&spy)).await;

    assert_eq!(
        *spy.seen.lock().unwrap(),
        vec![("nidus-lab".to_string(), "gho_raw_user_token".to_string())]
    );
}

#[tokio::test]
async fn missing_note_fails_with_forbidden() {
    let spy = Spy::new(MembershipOutcome::Active);

    let outcome = run_membership_gate(&HostSession::default(), Arc::clone(&spy)).await;

    assert_eq!(
        outcome,
        StepOutcome::Failure(FlowFailure {
            error: FlowError::InvalidUser,
            message: "missing broker context".to_string(),
            status: FORBIDDEN_STATUS,
        })
    );
    assert!(spy.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn inactive_member_fails_with_org_in_message() {
    let spy = Spy::new(MembershipOutcome::NotActive);
    let session = HostSession::with_context(CONTEXT).with_config(&[("githubOrg", "acme-corp")]);

    let outcome = run_membership_gate(&session, spy).await;

    match outcome {
        StepOutcome::Failure(failure) => {
            assert_eq!(failure.message, "account is not an active member of acme-corp");
            assert!(!failure.message.contains("gho_raw_user_token"));
        }
        StepOutcome::Success => panic!("inactive member must not pass"),
    }
}

#[test]
fn role_step_grants_configured_roles_once() {
    let store = InMemoryRoleStore::new()
        .with_realm_role("member")
        .with_scoped_role("dashboard", "viewer");
    let session = HostSession {
        subject: Some("user-42".to_string()),
        ..HostSession::default()
    }
    .with_config(&[("roles", "member, dashboard:viewer, missing")]);

    assert!(run_role_grant(&session, &store).is_success());
    let second = grant_roles(&session, &store);

    assert!(second.granted.is_empty());
    assert_eq!(second.already_held.len(), 2);
    assert_eq!(second.unresolved, vec![RoleSpec::realm("missing")]);
    assert_eq!(
        store.roles_of("user-42"),
        vec![RoleSpec::realm("member"), RoleSpec::scoped("dashboard", "viewer")]
    );
}

#[test]
fn role_step_without_config_grants_nothing() {
    let store = InMemoryRoleStore::new().with_realm_role("member");
    let session = HostSession {
        subject: Some("user-42".to_string()),
        ..HostSession::default()
    };

    assert!(run_role_grant(&session, &store).is_success());
    assert!(store.roles_of("user-42").is_empty());
}
