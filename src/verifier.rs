//! Outbound membership check against the external organization API.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde_json::Value;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::secret::Secret;

/// Classified result of the external membership call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOutcome {
    /// The subject is an active member.
    Active,
    /// The subject is known but not active (pending, missing state, ...).
    NotActive,
    /// The membership API rejected the credential (HTTP 401).
    Unauthorized,
    /// Transport failure or any status other than 200 and 401.
    Unreachable,
    /// HTTP 200 with a body that is not JSON.
    MalformedResponse,
}

impl fmt::Display for MembershipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipOutcome::Active => write!(f, "active"),
            MembershipOutcome::NotActive => write!(f, "not_active"),
            MembershipOutcome::Unauthorized => write!(f, "unauthorized"),
            MembershipOutcome::Unreachable => write!(f, "unreachable"),
            MembershipOutcome::MalformedResponse => write!(f, "malformed_response"),
        }
    }
}

/// Interprets a membership API response.
///
/// Only a 200 body is inspected; a `state` of `"active"` (any case) is the
/// single path to [`MembershipOutcome::Active`].
///
/// # Examples
///
/// ```
/// use membership_gate::{classify_response, MembershipOutcome};
///
/// assert_eq!(classify_response(200, r#"{"state":"active"}"#), MembershipOutcome::Active);
/// assert_eq!(classify_response(200, r#"{"state":"pending"}"#), MembershipOutcome::NotActive);
/// assert_eq!(classify_response(401, ""), MembershipOutcome::Unauthorized);
/// assert_eq!(classify_response(404, ""), MembershipOutcome::Unreachable);
/// ```
pub fn classify_response(status: u16, body: &str) -> MembershipOutcome {
    match status {
        200 => match serde_json::from_str::<Value>(body) {
            Ok(json) => {
                let active = json
                    .get("state")
                    .and_then(Value::as_str)
                    .is_some_and(|state| state.eq_ignore_ascii_case("active"));
                if active {
                    MembershipOutcome::Active
                } else {
                    MembershipOutcome::NotActive
                }
            }
            Err(_) => MembershipOutcome::MalformedResponse,
        },
        401 => MembershipOutcome::Unauthorized,
        _ => MembershipOutcome::Unreachable,
    }
}

/// Checks whether a subject belongs to an organization.
///
/// Implementations perform at most one external call per invocation and map
/// every transport problem to [`MembershipOutcome::Unreachable`]. `Err` is
/// reserved for failures inside the gate itself.
#[async_trait]
pub trait MembershipVerifier: Send + Sync {
    /// Verifies membership of `subject` in `org` using `credential`.
    async fn verify(
        &self,
        org: &str,
        subject: &str,
        credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError>;
}

#[async_trait]
impl<'a, T: MembershipVerifier + ?Sized> MembershipVerifier for &'a T {
    async fn verify(
        &self,
        org: &str,
        subject: &str,
        credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError> {
        (**self).verify(org, subject, credential).await
    }
}

#[async_trait]
impl<T: MembershipVerifier + ?Sized> MembershipVerifier for Arc<T> {
    async fn verify(
        &self,
        org: &str,
        subject: &str,
        credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError> {
        (**self).verify(org, subject, credential).await
    }
}

/// Membership verifier backed by the `/orgs/{org}/memberships/{subject}` API.
///
/// One instance owns one connection pool and may be shared across concurrent
/// attempts.
#[derive(Debug, Clone)]
pub struct HttpMembershipVerifier {
    client: reqwest::Client,
    base_url: Url,
    accept: String,
}

impl HttpMembershipVerifier {
    /// Builds a verifier from the endpoint, headers and timeout in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidEndpoint`] if `api_base_url` cannot carry a
    /// path, or [`GateError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &GateConfig) -> Result<Self, GateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| GateError::Client(err.to_string()))?;

        let base_url = Url::parse(&config.api_base_url)
            .map_err(|err| GateError::InvalidEndpoint(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(GateError::InvalidEndpoint(format!(
                "{} cannot be used as a base URL",
                config.api_base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            accept: config.accept.clone(),
        })
    }

    /// Returns the membership URL for `org` and `subject`.
    ///
    /// Both values are percent-encoded as single path segments.
    pub fn membership_url(&self, org: &str, subject: &str) -> Result<Url, GateError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GateError::InvalidEndpoint("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["orgs", org, "memberships", subject]);
        Ok(url)
    }
}

#[async_trait]
impl MembershipVerifier for HttpMembershipVerifier {
    async fn verify(
        &self,
        org: &str,
        subject: &str,
        credential: &Secret<String>,
    ) -> Result<MembershipOutcome, GateError> {
        let url = self.membership_url(org, subject)?;

        let sent = self
            .client
            .get(url)
            .header(ACCEPT, self.accept.as_str())
            .bearer_auth(credential.expose_secret())
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                return Err(GateError::Request(err.without_url().to_string()));
            }
            Err(err) => {
                tracing::warn!(
                    error = %err.without_url(),
                    org,
                    subject,
                    "membership API unreachable"
                );
                return Ok(MembershipOutcome::Unreachable);
            }
        };

        let status = response.status().as_u16();
        tracing::info!(status, org, subject, "membership API response status");

        if status == 401 {
            tracing::warn!(
                org,
                subject,
                credential = %credential.masked(),
                "membership API rejected credential"
            );
        }

        if status != 200 {
            return Ok(classify_response(status, ""));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err.without_url(), "failed to read membership response body");
                return Ok(MembershipOutcome::Unreachable);
            }
        };

        let outcome = classify_response(status, &body);
        tracing::info!(%outcome, org, subject, "membership state classified");
        Ok(outcome)
    }
}
