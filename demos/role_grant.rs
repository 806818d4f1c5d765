//! Role grant demonstration.
//!
//! This example grants a configured role list to an authenticated subject:
//! 1. Parse `roles` from an authenticator config map
//! 2. Grant realm and scoped roles
//! 3. Run again to show the step is idempotent
//! 4. Show that unknown roles are skipped
//!
//! Run with: `RUST_LOG=info cargo run --example role_grant`

use std::collections::HashMap;

use membership_gate::audit::AuditTrail;
use membership_gate::{InMemoryRoleStore, RoleGrantConfig, RoleGrantStep, ROLES_KEY};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Role Grant Example ===\n");

    let store = InMemoryRoleStore::new()
        .with_realm_role("member")
        .with_realm_role("admin")
        .with_scoped_role("ci", "deployer");

    let config = RoleGrantConfig::from_authenticator_config(&HashMap::from([(
        ROLES_KEY.to_string(),
        "member, ci:deployer, ci:auditor, member".to_string(),
    )]));
    let step = RoleGrantStep::from_config(&config);

    println!("Configured roles:");
    for spec in step.specs() {
        println!("  - {}", spec);
    }

    let trail = AuditTrail::new();

    println!("\n--- First run ---");
    let summary = step.grant_audited(&store, "demo-1", "user-42", &trail);
    println!("granted:      {:?}", summary.granted);
    println!("unresolved:   {:?}", summary.unresolved);

    println!("\n--- Second run ---");
    let summary = step.grant_audited(&store, "demo-2", "user-42", &trail);
    println!("granted:      {:?}", summary.granted);
    println!("already held: {:?}", summary.already_held);

    println!("\n--- Roles held by user-42 ---");
    for role in store.roles_of("user-42") {
        println!("  - {}", role);
    }

    println!("\n--- Audit Trail ({} events) ---", trail.len());
    for event in trail.events() {
        println!("{}", event);
    }
}
