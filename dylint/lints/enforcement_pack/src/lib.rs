//! Enforcement pack: Custom lints for membership-gate invariants.
//!
//! Credentials may only leave the process masked, through `tracing`, or as
//! the `Authorization` header of the membership request. These lints keep
//! every other exit closed at compile time.
//!
//! ## Implemented Lints
//!
//! - `EXPOSE_SECRET_OUTSIDE_VERIFIER`: Forbids `Secret::expose_secret` outside
//!   `src/verifier.rs` (and `src/secret.rs`, which defines it).
//! - `NO_PRINTLN`: Forbids println!, eprintln!, and dbg! macros so nothing
//!   bypasses `GateLog`/`tracing` and its masking.
//!
//! Both run on library code; `cargo dylint` does not check `#[cfg(test)]`
//! modules unless asked to build tests.

#![feature(rustc_private)]
#![warn(unused_extern_crates)]

extern crate rustc_ast;
extern crate rustc_lint;
extern crate rustc_session;
extern crate rustc_span;

use std::path::Path;

use rustc_ast::{Expr, ExprKind, MacCall};
use rustc_lint::{EarlyContext, EarlyLintPass, LintContext};
use rustc_session::{declare_lint_pass, declare_tool_lint};
use rustc_span::{FileName, Span};

/// Method that unwraps a `Secret`.
const EXPOSE_SECRET: &str = "expose_secret";

/// Source files allowed to call [`EXPOSE_SECRET`].
const EXPOSE_ALLOWED_IN: &[&str] = &["src/verifier.rs", "src/secret.rs"];

declare_tool_lint! {
    /// **What it does:** Forbids calling `expose_secret` anywhere except the
    /// membership verifier.
    ///
    /// **Why is this bad?** The raw credential is only needed to build the
    /// `Authorization` header. Any other call site is a place where a token
    /// can end up in a log line, an error message or a denial reason.
    ///
    /// **Known problems:** Matches by method name, so an unrelated method
    /// called `expose_secret` is flagged too.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Bad - raw token in a log line
    /// tracing::warn!("rejected {}", token.expose_secret());
    ///
    /// // Good
    /// tracing::warn!(credential = %token.masked(), "rejected");
    /// ```
    pub enforcement_pack::EXPOSE_SECRET_OUTSIDE_VERIFIER,
    Deny,
    "use of Secret::expose_secret outside the membership verifier"
}

declare_tool_lint! {
    /// **What it does:** Forbids use of `println!`, `eprintln!`, and `dbg!` macros in library code.
    ///
    /// **Why is this bad?** These macros bypass structured logging:
    /// - They write directly to stdout/stderr, without the attempt id and org fields
    /// - They may print a brokered context or token that `GateLog` would mask
    /// - Their output never reaches the `membership_audit` target
    ///
    /// **Known problems:** None.
    ///
    /// **Example:**
    /// ```rust,ignore
    /// // Bad - bypasses GateLog
    /// dbg!(raw_context);
    ///
    /// // Good - uses structured logging
    /// use membership_gate::GateLog;
    /// GateLog::new(attempt_id, org).info(format_args!("credential: {}", token.masked()));
    /// ```
    pub enforcement_pack::NO_PRINTLN,
    Deny,
    "use of println!, eprintln!, or dbg! macros; use GateLog or tracing instead"
}

declare_lint_pass!(GateEnforcement => [EXPOSE_SECRET_OUTSIDE_VERIFIER, NO_PRINTLN]);

impl EarlyLintPass for GateEnforcement {
    fn check_expr(&mut self, cx: &EarlyContext<'_>, expr: &Expr) {
        match &expr.kind {
            ExprKind::MacCall(mac) => check_macro(cx, mac, expr.span),
            ExprKind::MethodCall(call) if call.seg.ident.name.as_str() == EXPOSE_SECRET => {
                check_expose(cx, expr.span);
            }
            ExprKind::Call(func, _) => {
                if let ExprKind::Path(_, path) = &func.kind {
                    let is_expose = path
                        .segments
                        .last()
                        .is_some_and(|seg| seg.ident.name.as_str() == EXPOSE_SECRET);
                    if is_expose {
                        check_expose(cx, expr.span);
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_expose(cx: &EarlyContext<'_>, span: Span) {
    if is_allowed_file(cx, span) {
        return;
    }

    cx.span_lint(EXPOSE_SECRET_OUTSIDE_VERIFIER, span, |diag| {
        diag.help("log `Secret::masked()` instead, or move the call into the verifier");
        diag.note("raw credentials may only be written to the `Authorization` header");
    });
}

fn is_allowed_file(cx: &EarlyContext<'_>, span: Span) -> bool {
    let FileName::Real(name) = cx.sess().source_map().span_to_filename(span) else {
        return false;
    };

    name.local_path().is_some_and(|path| {
        EXPOSE_ALLOWED_IN
            .iter()
            .any(|allowed| path.ends_with(Path::new(allowed)))
    })
}

fn check_macro(cx: &EarlyContext<'_>, mac: &MacCall, span: Span) {
    let path = &mac.path;

    // Only bare `println!`, not `my_crate::println!`
    if path.segments.len() != 1 {
        return;
    }

    let (help, note) = match path.segments[0].ident.name.as_str() {
        "println" => (
            "use `tracing::info!` or `GateLog` for structured logging",
            "`println!` skips credential masking and may leak tokens",
        ),
        "eprintln" => (
            "use `tracing::error!` or `GateLog` for structured logging",
            "`eprintln!` skips credential masking and may leak tokens",
        ),
        "dbg" => (
            "use `tracing::debug!` or `GateLog` for structured logging",
            "`dbg!` prints the full value, including brokered contexts",
        ),
        _ => return,
    };

    cx.span_lint(NO_PRINTLN, span, |diag| {
        diag.help(help);
        diag.note(note);
    });
}

#[unsafe(no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn register_lints(_sess: &rustc_session::Session, lint_store: &mut rustc_lint::LintStore) {
    lint_store.register_lints(&[&EXPOSE_SECRET_OUTSIDE_VERIFIER, &NO_PRINTLN]);
    lint_store.register_early_pass(|| Box::new(GateEnforcement));
}

#[unsafe(no_mangle)]
pub fn dylint_version() -> *mut std::os::raw::c_char {
    std::ffi::CString::new(dylint_linting::DYLINT_VERSION)
        .expect("version string contains null byte")
        .into_raw()
}
