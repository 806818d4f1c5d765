use std::fmt;

/// HTTP status reported to the flow engine for every denial.
pub const FORBIDDEN_STATUS: u16 = 403;

/// Internal failures while evaluating the gate.
///
/// Messages never contain credential material or the raw brokered context.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The membership endpoint URL could not be built.
    #[error("invalid membership endpoint: {0}")]
    InvalidEndpoint(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build membership client: {0}")]
    Client(String),
    /// The outbound request could not be assembled.
    #[error("failed to build membership request: {0}")]
    Request(String),
    /// A step of the evaluation panicked.
    #[error("unexpected internal failure")]
    Panicked,
}

/// A terminal rejection of the authentication attempt.
///
/// The message is meant for end-user display and never carries secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// The kind of denial
    pub kind: DenialKind,
    /// Human-readable reason
    pub message: String,
}

impl Denial {
    /// Creates a new denial.
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The raw context never reached the gate.
    pub fn missing_context() -> Self {
        Self::new(DenialKind::MissingContext, "missing broker context")
    }

    /// No username could be recovered from the context.
    pub fn missing_username() -> Self {
        Self::new(DenialKind::MissingUsername, "no username")
    }

    /// Neither a service nor a user credential was available.
    pub fn missing_credential() -> Self {
        Self::new(DenialKind::MissingCredential, "no credential available")
    }

    /// Error classification reported to the flow engine.
    pub fn flow_error(&self) -> FlowError {
        FlowError::InvalidUser
    }

    /// HTTP status reported to the flow engine.
    pub fn http_status(&self) -> u16 {
        FORBIDDEN_STATUS
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Denial {}

impl From<GateError> for Denial {
    fn from(err: GateError) -> Self {
        Denial::new(
            DenialKind::InternalError,
            format!("error verifying membership: {err}"),
        )
    }
}

/// The kind of denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// The flow engine never populated the brokered context
    MissingContext,
    /// No username in the brokered context
    MissingUsername,
    /// No credential to present to the membership API
    MissingCredential,
    /// The membership API rejected the credential
    Unauthorized,
    /// The subject is not an active member
    NotActiveMember,
    /// The membership API could not be reached
    Unreachable,
    /// The membership API answered with an unreadable body
    MalformedResponse,
    /// Unexpected failure inside the gate
    InternalError,
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialKind::MissingContext => write!(f, "missing context"),
            DenialKind::MissingUsername => write!(f, "missing username"),
            DenialKind::MissingCredential => write!(f, "missing credential"),
            DenialKind::Unauthorized => write!(f, "unauthorized"),
            DenialKind::NotActiveMember => write!(f, "not an active member"),
            DenialKind::Unreachable => write!(f, "unreachable"),
            DenialKind::MalformedResponse => write!(f, "malformed response"),
            DenialKind::InternalError => write!(f, "internal error"),
        }
    }
}

/// Error classification understood by the authentication-flow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// The user may not complete this flow.
    InvalidUser,
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::InvalidUser => write!(f, "invalid_user"),
        }
    }
}
