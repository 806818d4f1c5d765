//! End-to-end tests of the membership gate against a mocked membership API.

use std::io;
use std::sync::{Arc, Mutex};

use membership_gate::audit::{AuditOutcome, AuditTrail};
use membership_gate::{
    CredentialSource, DenialKind, GateConfig, GateDecision, MembershipGate, Secret, Tainted,
};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_TOKEN: &str = "gho_user_token_0123456789";
const SERVICE_TOKEN: &str = "ghp_service_token_abcdefgh";

fn context() -> Option<Tainted<String>> {
    Some(Tainted::new(format!(
        r#"{{"modelUsername":"octocat","token":"scope=read:org&access_token={USER_TOKEN}"}}"#
    )))
}

fn gate_for(server: &MockServer, service: Option<&str>) -> MembershipGate<membership_gate::HttpMembershipVerifier> {
    let config = GateConfig {
        api_base_url: server.uri(),
        service_credential: service.map(|s| Secret::new(s.to_string())),
        timeout_ms: 2000,
        ..GateConfig::default()
    };
    MembershipGate::from_config(config).unwrap()
}

async fn mount(server: &MockServer, bearer: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/orgs/nidus-lab/memberships/octocat"))
        .and(header("authorization", format!("Bearer {bearer}").as_str()))
        .respond_with(template)
        .expect(1)
        .mount(server)
        .await;
}

/// Shared in-memory sink for formatted log output.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[tokio::test]
async fn active_member_is_allowed() {
    let server = MockServer::start().await;
    mount(
        &server,
        USER_TOKEN,
        ResponseTemplate::new(200).set_body_string(r#"{"state":"active","role":"member"}"#),
    )
    .await;

    let decision = gate_for(&server, None).evaluate("attempt-1", context()).await;

    assert_eq!(decision, GateDecision::Allow);
}

#[tokio::test]
async fn service_credential_is_sent_instead_of_user_token() {
    let server = MockServer::start().await;
    mount(
        &server,
        SERVICE_TOKEN,
        ResponseTemplate::new(200).set_body_string(r#"{"state":"active"}"#),
    )
    .await;

    let trail = AuditTrail::new();
    let decision = gate_for(&server, Some(SERVICE_TOKEN))
        .evaluate_audited("attempt-2", context(), &trail)
        .await;

    assert!(decision.is_allowed());
    let event = &trail.events()[0];
    assert_eq!(event.outcome(), AuditOutcome::Success);
    assert_eq!(event.credential_source(), Some(CredentialSource::ServiceCredential));
    assert_eq!(event.masked_credential(), Some("ghp_...efgh"));
}

#[tokio::test]
async fn pending_member_is_denied() {
    let server = MockServer::start().await;
    mount(
        &server,
        USER_TOKEN,
        ResponseTemplate::new(200).set_body_string(r#"{"state":"pending"}"#),
    )
    .await;

    let decision = gate_for(&server, None).evaluate("attempt-3", context()).await;

    let denial = decision.denial().unwrap();
    assert_eq!(denial.kind, DenialKind::NotActiveMember);
    assert_eq!(denial.message, "account is not an active member of nidus-lab");
    assert_eq!(denial.http_status(), 403);
}

#[tokio::test]
async fn non_member_is_denied_as_unreachable() {
    let server = MockServer::start().await;
    mount(&server, USER_TOKEN, ResponseTemplate::new(404)).await;

    let decision = gate_for(&server, None).evaluate("attempt-4", context()).await;

    assert_eq!(decision.denial().unwrap().kind, DenialKind::Unreachable);
}

#[tokio::test]
async fn rejected_credential_is_logged_only_masked() {
    let server = MockServer::start().await;
    mount(&server, USER_TOKEN, ResponseTemplate::new(401)).await;
    let (logs, _guard) = capture_logs();

    let decision = gate_for(&server, None).evaluate("attempt-5", context()).await;

    let denial = decision.denial().unwrap();
    assert_eq!(denial.kind, DenialKind::Unauthorized);
    assert!(!denial.message.contains(USER_TOKEN));

    let output = logs.contents();
    assert!(output.contains("gho_...6789"), "masked credential missing: {output}");
    assert!(output.contains("attempt-5"));
    assert!(!output.contains(USER_TOKEN), "raw credential leaked: {output}");
    assert!(!output.contains("modelUsername"), "raw context leaked: {output}");
}

#[tokio::test]
async fn unparseable_context_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let decision = gate_for(&server, None)
        .evaluate("attempt-6", Some(Tainted::new("not json at all".to_string())))
        .await;

    assert_eq!(decision.reason(), Some("no username"));
}

#[tokio::test]
async fn slow_api_is_denied_not_hung() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"state":"active"}"#)
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = GateConfig {
        api_base_url: server.uri(),
        timeout_ms: 200,
        ..GateConfig::default()
    };
    let gate = MembershipGate::from_config(config).unwrap();

    let decision = gate.evaluate("attempt-7", context()).await;

    assert_eq!(decision.denial().unwrap().kind, DenialKind::Unreachable);
}

#[test]
fn invalid_endpoint_fails_at_construction() {
    let config = GateConfig {
        api_base_url: "not a url".to_string(),
        ..GateConfig::default()
    };

    assert!(MembershipGate::from_config(config).is_err());
}
