//! Integration tests for enforcement_pack lints.
//!
//! These run `cargo dylint` twice: over membership-gate itself, which must
//! come out clean, and over `ui-tests/leaky_gate`, a crate that leaks its
//! credential in every way the pack forbids.

use std::process::{Command, Output};

const GATE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../..");
const LEAKY_GATE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/ui-tests/leaky_gate");

fn dylint(dir: &str, args: &[&str]) -> Output {
    Command::new("cargo")
        .arg("dylint")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run cargo dylint")
}

#[test]
fn membership_gate_passes_all_lints() {
    let output = dylint(
        GATE_ROOT,
        &["--lib", "enforcement_pack", "--", "--manifest-path", "Cargo.toml"],
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Only src/verifier.rs unwraps the credential, and nothing prints.
    assert!(
        output.status.success(),
        "dylint should pass on membership-gate, got: {}",
        stderr
    );
}

#[test]
fn credential_leaks_are_denied() {
    let output = dylint(LEAKY_GATE, &["--lib", "enforcement_pack"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "leaky_gate should fail the lint run");

    // Method call and path call are both caught.
    let exposures = stderr
        .matches("use of Secret::expose_secret outside the membership verifier")
        .count();
    assert_eq!(exposures, 2, "expected two expose_secret errors, got: {}", stderr);
    assert!(
        stderr.contains("`Authorization` header"),
        "expose_secret error should explain the allowed use, got: {}",
        stderr
    );
    assert!(
        stderr.contains("use of println!, eprintln!, or dbg! macros"),
        "println! in leaky_gate should be denied, got: {}",
        stderr
    );
}

#[test]
fn both_lints_are_registered_at_deny() {
    let output = dylint(GATE_ROOT, &["list", "--lib", "enforcement_pack"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    for lint in [
        "enforcement_pack::expose_secret_outside_verifier",
        "enforcement_pack::no_println",
    ] {
        assert!(stdout.contains(lint), "{} should be registered, got: {}", lint, stdout);
    }
    assert!(
        stdout.contains("deny"),
        "enforcement_pack lints should be at deny level, got: {}",
        stdout
    );
}
