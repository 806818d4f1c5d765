//! Integration property tests for membership-gate.
//!
//! These tests validate the extraction, selection and masking invariants
//! across arbitrary brokered contexts.

use membership_gate::{
    classify_response, denial_for, extract, select_credential, CredentialSource,
    MembershipOutcome, RoleSpec, Secret, Tainted,
};
use proptest::prelude::*;
use serde_json::json;

fn run(doc: serde_json::Value) -> membership_gate::ExtractionResult {
    extract(&Tainted::new(doc.to_string()))
}

// Strategy: non-blank account names
fn arb_username() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9-]{0,19}").unwrap()
}

// Strategy: absent or blank username field
fn arb_blank() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("")), Just(Some("   ")), Just(Some("\t"))]
}

// Strategy: opaque token material without separators
fn arb_token() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_]{1,40}").unwrap()
}

// Strategy: form-encoded parameters that are not access_token
fn arb_params() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("(scope|token_type|state)=[a-z0-9:]{0,8}").unwrap(),
        0..4,
    )
}

proptest! {
    /// Property: a non-blank primary username always wins over the fallback
    #[test]
    fn proptest_primary_username_wins(
        primary in arb_username(),
        secondary in prop::option::of(arb_username()),
    ) {
        let mut doc = json!({ "modelUsername": primary.clone() });
        if let Some(secondary) = secondary {
            doc["brokerUsername"] = json!(secondary);
        }

        prop_assert_eq!(run(doc).username, Some(primary));
    }

    /// Property: a blank or absent primary username falls back to the broker username
    #[test]
    fn proptest_blank_primary_falls_back(
        primary in arb_blank(),
        secondary in arb_username(),
    ) {
        let mut doc = json!({ "brokerUsername": secondary.clone() });
        if let Some(primary) = primary {
            doc["modelUsername"] = json!(primary);
        }

        prop_assert_eq!(run(doc).username, Some(secondary));
    }

    /// Property: extraction never panics, whatever the input
    #[test]
    fn proptest_extract_never_panics(raw in any::<String>()) {
        let _ = extract(&Tainted::new(raw));
    }

    /// Property: extraction never panics on structurally valid but oddly typed documents
    #[test]
    fn proptest_extract_tolerates_wrong_types(
        value in prop_oneof![
            Just(json!(null)),
            Just(json!(42)),
            Just(json!(true)),
            Just(json!([1, 2, 3])),
            Just(json!({ "nested": { "deeper": [] } })),
        ],
    ) {
        let doc = json!({
            "modelUsername": value.clone(),
            "brokerUsername": value.clone(),
            "token": value.clone(),
            "contextData": { "FEDERATED_ACCESS_TOKEN": value },
        });

        let result = run(doc);
        prop_assert!(result.username.is_none());
        prop_assert!(result.credential.is_none());
    }

    /// Property: the access_token value is recovered wherever it sits among other parameters
    #[test]
    fn proptest_access_token_from_form_encoded(
        before in arb_params(),
        after in arb_params(),
        token in arb_token(),
    ) {
        let mut parts = before;
        parts.push(format!("access_token={token}"));
        parts.extend(after);

        let result = run(json!({ "modelUsername": "octocat", "token": parts.join("&") }));

        prop_assert_eq!(
            result.credential.map(|c| c.expose_secret().clone()),
            Some(token)
        );
    }

    /// Property: the federated token takes precedence over the raw token field
    #[test]
    fn proptest_federated_token_wins(federated in arb_token(), raw in arb_token()) {
        let doc = json!({
            "modelUsername": "octocat",
            "token": raw,
            "contextData": { "FEDERATED_ACCESS_TOKEN": { "data": federated.clone() } },
        });

        prop_assert_eq!(
            run(doc).credential.map(|c| c.expose_secret().clone()),
            Some(federated)
        );
    }

    /// Property: a non-blank service credential always wins
    #[test]
    fn proptest_service_credential_precedence(
        service in arb_token(),
        user in prop::option::of(arb_token()),
    ) {
        let service = Secret::new(service);
        let selected = select_credential(Some(&service), user.map(Secret::new));

        prop_assert_eq!(selected.source(), CredentialSource::ServiceCredential);
        prop_assert_eq!(
            selected.credential().map(|c| c.expose_secret().as_str()),
            Some(service.expose_secret().as_str())
        );
    }

    /// Property: selection yields a credential iff its source is not None
    #[test]
    fn proptest_selection_is_exactly_one_or_none(
        service in prop::option::of(prop_oneof![arb_token(), Just(String::new()), Just("  ".to_string())]),
        user in prop::option::of(prop_oneof![arb_token(), Just(String::new())]),
    ) {
        let service = service.map(Secret::new);
        let selected = select_credential(service.as_ref(), user.map(Secret::new));

        prop_assert_eq!(
            selected.credential().is_some(),
            selected.source() != CredentialSource::None
        );
    }

    /// Property: masking keeps only four characters at each end
    #[test]
    fn proptest_masking_never_reveals_credential(token in arb_token()) {
        let masked = Secret::new(token.clone()).masked();

        if token.chars().count() > 8 {
            prop_assert_eq!(&masked[..4], &token[..4]);
            prop_assert_eq!(&masked[masked.len() - 4..], &token[token.len() - 4..]);
            prop_assert_eq!(masked.len(), 11);
            prop_assert!(!masked.contains(&token));
        } else {
            prop_assert_eq!(masked, "***");
        }
    }

    /// Property: only a 200 response can classify as Active
    #[test]
    fn proptest_non_ok_status_is_never_active(
        status in (100u16..600).prop_filter("not 200", |s| *s != 200),
        body in any::<String>(),
    ) {
        prop_assert_ne!(classify_response(status, &body), MembershipOutcome::Active);
    }

    /// Property: every denial reason names the org and nothing else secret
    #[test]
    fn proptest_denial_reasons_name_org(
        org in prop::string::string_regex("[a-z][a-z0-9-]{2,15}").unwrap(),
        outcome in prop_oneof![
            Just(MembershipOutcome::NotActive),
            Just(MembershipOutcome::Unauthorized),
            Just(MembershipOutcome::Unreachable),
            Just(MembershipOutcome::MalformedResponse),
        ],
    ) {
        let denial = denial_for(outcome, &org).unwrap();
        prop_assert!(denial.message.contains(&org));
        prop_assert!(denial_for(MembershipOutcome::Active, &org).is_none());
    }

    /// Property: role lists parse to unique, trimmed, non-blank specs
    #[test]
    fn proptest_role_specs_are_unique(
        names in prop::collection::vec(prop::string::string_regex("[a-z]{1,6}(:[a-z]{1,6})?").unwrap(), 0..8),
    ) {
        let list = names.join(" , ");
        let specs = RoleSpec::parse_list(&list);

        for (i, spec) in specs.iter().enumerate() {
            prop_assert!(!spec.name.trim().is_empty());
            prop_assert!(!specs[i + 1..].contains(spec));
        }
        prop_assert!(specs.len() <= names.len());
    }
}
