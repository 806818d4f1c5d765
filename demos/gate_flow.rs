//! Membership gate demonstration.
//!
//! This example runs several brokered contexts through the gate:
//! 1. A primary username with a form-encoded user token
//! 2. A fallback username covered by a service credential
//! 3. A context with no usable credential
//! 4. A member whose invitation is still pending
//!
//! The membership API is replaced by a fixed directory so the example runs
//! offline. Log output (with masked credentials) is controlled by `RUST_LOG`.
//!
//! Run with: `RUST_LOG=debug cargo run --example gate_flow`

use std::collections::HashMap;

use async_trait::async_trait;
use membership_gate::audit::AuditTrail;
use membership_gate::{
    GateConfig, GateDecision, GateError, MembershipGate, MembershipOutcome, MembershipVerifier,
    Secret, Tainted,
};
use tracing_subscriber::EnvFilter;

/// Membership states keyed by account name.
struct Directory(HashMap<&'static str, &'static str>);

#[async_trait]
impl MembershipVerifier for Directory {
    async fn verify(
        &self,
        _org: &str,
        subject: &str,
        _credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError> {
        Ok(match self.0.get(subject) {
            Some(&"active") => MembershipOutcome::Active,
            Some(_) => MembershipOutcome::NotActive,
            None => MembershipOutcome::Unreachable,
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Membership Gate Example ===\n");

    let directory = Directory(HashMap::from([("octocat", "active"), ("newcomer", "pending")]));
    let trail = AuditTrail::new();

    let user_gate = MembershipGate::new(GateConfig::default(), &directory);
    let service_gate = MembershipGate::new(
        GateConfig {
            service_credential: Some(Secret::new("ghp_example_service_token".to_string())),
            ..GateConfig::default()
        },
        &directory,
    );

    let scenarios = [
        (
            "primary username, form-encoded token",
            &user_gate,
            r#"{"modelUsername":"octocat","token":"scope=read:org&access_token=gho_example_user_token"}"#,
        ),
        (
            "fallback username, service credential",
            &service_gate,
            r#"{"brokerUsername":"octocat"}"#,
        ),
        (
            "serialized object in token field",
            &user_gate,
            r#"{"modelUsername":"octocat","token":"{\"nested\":true}"}"#,
        ),
        (
            "pending invitation",
            &user_gate,
            r#"{"modelUsername":"newcomer","token":"gho_example_newcomer_token"}"#,
        ),
    ];

    for (i, (label, gate, context)) in scenarios.into_iter().enumerate() {
        println!("--- Scenario {}: {} ---", i + 1, label);

        let attempt_id = format!("demo-{}", i + 1);
        let raw = Tainted::new(context.to_string());

        match gate.evaluate_audited(&attempt_id, Some(raw), &trail).await {
            GateDecision::Allow => println!("✓ allowed"),
            GateDecision::Deny(denial) => {
                println!("✗ denied ({}, HTTP {}): {}", denial.kind, denial.http_status(), denial.message)
            }
        }
        println!();
    }

    println!("--- Audit Trail ({} events) ---", trail.len());
    for event in trail.events() {
        println!("{}", event);
    }
}
