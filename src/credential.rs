//! Choice of the credential presented to the membership API.

use std::fmt;

use crate::secret::Secret;

/// Which credential was presented to the membership API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// The statically configured service credential.
    ServiceCredential,
    /// The access token recovered from the brokered context.
    UserCredential,
    /// No credential was available.
    None,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ServiceCredential => write!(f, "service_credential"),
            CredentialSource::UserCredential => write!(f, "user_credential"),
            CredentialSource::None => write!(f, "none"),
        }
    }
}

/// Result of credential selection: exactly one credential, or none.
#[derive(Debug)]
pub struct SelectedCredential {
    credential: Option<Secret<String>>,
    source: CredentialSource,
}

impl SelectedCredential {
    fn none() -> Self {
        Self {
            credential: None,
            source: CredentialSource::None,
        }
    }

    /// Returns the selected credential, if any.
    pub fn credential(&self) -> Option<&Secret<String>> {
        self.credential.as_ref()
    }

    /// Returns where the credential came from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }

    /// Splits into the credential and its source.
    ///
    /// Returns `None` when nothing was selected.
    pub fn into_parts(self) -> Option<(Secret<String>, CredentialSource)> {
        let source = self.source;
        self.credential.map(|credential| (credential, source))
    }
}

/// Picks the credential to present to the membership API.
///
/// A non-blank service credential always wins because it carries stable,
/// broader read permissions. Otherwise a non-blank user credential is used.
///
/// # Examples
///
/// ```
/// use membership_gate::{select_credential, CredentialSource, Secret};
///
/// let service = Secret::new("ghp_service_token".to_string());
/// let user = Secret::new("gho_user_token".to_string());
///
/// let selected = select_credential(Some(&service), Some(user));
/// assert_eq!(selected.source(), CredentialSource::ServiceCredential);
/// ```
pub fn select_credential(
    service: Option<&Secret<String>>,
    user: Option<Secret<String>>,
) -> SelectedCredential {
    if let Some(service) = service.filter(|s| !s.is_blank()) {
        return SelectedCredential {
            credential: Some(service.duplicate()),
            source: CredentialSource::ServiceCredential,
        };
    }

    match user.filter(|u| !u.is_blank()) {
        Some(user) => SelectedCredential {
            credential: Some(user),
            source: CredentialSource::UserCredential,
        },
        None => SelectedCredential::none(),
    }
}
