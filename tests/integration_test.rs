use membership_gate::{
    extract, Attempt, DenialKind, GateDecision, MembershipOutcome, Secret, Tainted,
};

#[test]
fn secret_is_fully_redacted() {
    let token = Secret::new("gho_secret123456".to_string());

    let debug_out = format!("{:?}", token);
    assert_eq!(debug_out, "[REDACTED]");
    assert!(!debug_out.contains("gho_secret"));
    assert!(!debug_out.contains("String")); // No type info leaked

    let display_out = format!("{}", token);
    assert_eq!(display_out, "[REDACTED]");
    assert_eq!(token.masked(), "gho_...3456");
}

#[test]
fn tainted_context_is_opaque() {
    let raw = Tainted::new(r#"{"token":"gho_secret123456"}"#.to_string());

    let debug_out = format!("{:?}", raw);
    assert!(debug_out.contains("Tainted"));
    assert!(!debug_out.contains("gho_secret"));

    // No implicit conversion back to String.
    // Uncommenting this would fail to compile:
    // let _s: String = raw;
}

#[test]
fn extraction_result_debug_masks_credential() {
    let raw = Tainted::new(
        r#"{"modelUsername":"octocat","contextData":{"FEDERATED_ACCESS_TOKEN":{"data":"gho_federated_9876"}}}"#
            .to_string(),
    );

    let debug_out = format!("{:?}", extract(&raw));
    assert!(debug_out.contains("octocat"));
    assert!(debug_out.contains("gho_...9876"));
    assert!(!debug_out.contains("gho_federated_9876"));
}

#[test]
fn attempt_states_cannot_be_skipped() {
    // An attempt only reaches CredentialResolved through parse_context.
    // Uncommenting this would fail to compile:
    // let a = Attempt::new("a").resolve_credential(None);
    let raw = Tainted::new(r#"{"brokerUsername":"octocat","token":"rawtoken999"}"#.to_string());

    let resolved = Attempt::new("attempt-1")
        .parse_context(Some(&raw))
        .and_then(|parsed| parsed.resolve_credential(None))
        .unwrap();

    assert_eq!(resolved.username(), "octocat");
    assert_eq!(resolved.masked_credential(), "rawt...n999");
}

#[test]
fn missing_context_is_denied_before_parsing() {
    let denial = Attempt::new("attempt-2").parse_context(None).unwrap_err();

    assert_eq!(denial.kind, DenialKind::MissingContext);
}

#[test]
fn decision_is_allow_only_for_active() {
    for outcome in [
        MembershipOutcome::NotActive,
        MembershipOutcome::Unauthorized,
        MembershipOutcome::Unreachable,
        MembershipOutcome::MalformedResponse,
    ] {
        let denial = membership_gate::denial_for(outcome, "nidus-lab").unwrap();
        assert!(denial.message.contains("nidus-lab"));
        assert_ne!(GateDecision::Deny(denial), GateDecision::Allow);
    }

    assert!(membership_gate::denial_for(MembershipOutcome::Active, "nidus-lab").is_none());
}
