//! Organization-membership gate for federated sign-in.
//!
//! After an identity broker completes a federated login, the gate checks
//! that the external account is an active member of a configured
//! organization before the authentication flow may continue:
//! - **Extraction**: username and access credential are recovered from the
//!   untyped brokered context through an ordered fallback chain
//! - **Credential selection**: a configured service credential takes
//!   precedence over the user's own token
//! - **Verification**: one bounded HTTPS call to the membership API,
//!   classified into a [`MembershipOutcome`]
//!
//! A secondary [`RoleGrantStep`] grants configured roles to authenticated
//! subjects.
//!
//! # Core Types
//!
//! - [`Secret<T>`]: Wrapper that redacts credentials in logs and output
//! - [`Tainted<T>`]: Wrapper for the untrusted brokered context
//! - [`Attempt`]: One attempt, typed by its progress through the gate
//! - [`MembershipGate`]: The controller the flow engine talks to
//! - [`GateDecision`]: Allow, or Deny with a user-safe reason
//!
//! # Examples
//!
//! ```
//! use membership_gate::{extract, select_credential, CredentialSource, Secret, Tainted};
//!
//! let raw = Tainted::new(
//!     r#"{"brokerUsername":"octocat","token":"scope=read:org&access_token=gho_abc123"}"#
//!         .to_string(),
//! );
//! let extracted = extract(&raw);
//! assert_eq!(extracted.username.as_deref(), Some("octocat"));
//!
//! // Credentials are redacted unless explicitly exposed
//! let service = Secret::new("ghp_service_credential".to_string());
//! assert_eq!(format!("{:?}", service), "[REDACTED]");
//!
//! let selected = select_credential(Some(&service), extracted.credential);
//! assert_eq!(selected.source(), CredentialSource::ServiceCredential);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod attempt;
pub mod audit;
mod config;
mod credential;
mod document;
mod error;
mod extract;
pub mod flow;
mod gate;
mod logging;
mod roles;
mod secret;
mod state;
mod tainted;
mod verifier;

pub use attempt::{denial_for, Attempt};
pub use config::{
    GateConfig, RoleGrantConfig, DEFAULT_ACCEPT, DEFAULT_API_BASE_URL, DEFAULT_ORGANIZATION,
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT, ORGANIZATION_KEY, ROLES_KEY, SERVICE_CREDENTIAL_KEY,
};
pub use credential::{select_credential, CredentialSource, SelectedCredential};
pub use document::BrokeredDocument;
pub use error::{Denial, DenialKind, FlowError, GateError, FORBIDDEN_STATUS};
pub use extract::{
    extract, ExtractionResult, BROKER_USERNAME, FEDERATED_ACCESS_TOKEN_PATH, MODEL_USERNAME,
    RAW_TOKEN,
};
pub use gate::{GateDecision, MembershipGate};
pub use logging::GateLog;
pub use roles::{GrantSummary, InMemoryRoleStore, RoleGrantStep, RoleSpec, RoleStore, RoleStoreError};
pub use secret::{Secret, MASK_PLACEHOLDER};
pub use state::{ContextParsed, CredentialResolved, Start, Verified};
pub use tainted::Tainted;
pub use verifier::{classify_response, HttpMembershipVerifier, MembershipOutcome, MembershipVerifier};
