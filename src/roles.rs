//! Automatic role grants after a successful authentication.
//!
//! Best effort: an unknown role, an unknown scope or a failing store is
//! logged and skipped, and the step itself never rejects the flow.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::audit::{AuditEmitter, AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
use crate::config::RoleGrantConfig;

/// A configured role: realm-level, or qualified by a scope (e.g. a client).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleSpec {
    /// Scope identifier for scoped roles; `None` for realm roles
    pub scope: Option<String>,
    /// Role name
    pub name: String,
}

impl RoleSpec {
    /// A realm-level role.
    pub fn realm(name: impl Into<String>) -> Self {
        Self {
            scope: None,
            name: name.into(),
        }
    }

    /// A role defined inside `scope`.
    pub fn scoped(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            name: name.into(),
        }
    }

    /// Parses one entry. `scope:name` yields a scoped role (split on the
    /// first `:`); anything else is a realm role. Blank entries yield `None`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        Some(match entry.split_once(':') {
            Some((scope, name)) => Self::scoped(scope, name),
            None => Self::realm(entry),
        })
    }

    /// Parses a comma-separated list, dropping blanks and duplicates.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_gate::RoleSpec;
    ///
    /// let specs = RoleSpec::parse_list(" admin, ci:deployer,, admin ");
    /// assert_eq!(specs, vec![RoleSpec::realm("admin"), RoleSpec::scoped("ci", "deployer")]);
    /// ```
    pub fn parse_list(list: &str) -> Vec<Self> {
        let mut seen = HashSet::new();
        list.split(',')
            .filter_map(Self::parse)
            .filter(|spec| seen.insert(spec.clone()))
            .collect()
    }
}

impl fmt::Display for RoleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Failure reported by a [`RoleStore`] while granting.
#[derive(Debug, thiserror::Error)]
#[error("role store failure: {0}")]
pub struct RoleStoreError(pub String);

/// Realm and role storage owned by the host.
pub trait RoleStore {
    /// Handle to a resolved role.
    type Role;

    /// Looks up a realm-level role by name.
    fn lookup_realm_role(&self, name: &str) -> Option<Self::Role>;

    /// Looks up a role inside `scope`. `None` if the scope or role is unknown.
    fn lookup_scoped_role(&self, scope: &str, name: &str) -> Option<Self::Role>;

    /// Returns `true` if `subject` already holds `role`.
    fn subject_has_role(&self, subject: &str, role: &Self::Role) -> bool;

    /// Grants `role` to `subject`.
    fn grant_role(&self, subject: &str, role: &Self::Role) -> Result<(), RoleStoreError>;
}

/// What a role grant run did with each configured role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSummary {
    /// Roles newly granted
    pub granted: Vec<RoleSpec>,
    /// Roles the subject already held
    pub already_held: Vec<RoleSpec>,
    /// Roles (or scopes) that could not be found
    pub unresolved: Vec<RoleSpec>,
    /// Roles the store failed to grant
    pub failed: Vec<RoleSpec>,
}

/// Grants a configured set of roles to an authenticated subject.
///
/// Idempotent: roles the subject already holds are skipped.
///
/// # Examples
///
/// ```
/// use membership_gate::{InMemoryRoleStore, RoleGrantStep, RoleSpec};
///
/// let store = InMemoryRoleStore::new()
///     .with_realm_role("admin")
///     .with_scoped_role("ci", "deployer");
/// let step = RoleGrantStep::new(RoleSpec::parse_list("admin, ci:deployer"));
///
/// assert_eq!(step.grant(&store, "octocat").granted.len(), 2);
/// assert!(step.grant(&store, "octocat").granted.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoleGrantStep {
    specs: Vec<RoleSpec>,
}

impl RoleGrantStep {
    /// Creates a step granting `specs`.
    pub fn new(specs: Vec<RoleSpec>) -> Self {
        Self { specs }
    }

    /// Creates a step from configuration.
    pub fn from_config(config: &RoleGrantConfig) -> Self {
        Self::new(config.role_specs())
    }

    /// Returns the configured roles.
    pub fn specs(&self) -> &[RoleSpec] {
        &self.specs
    }

    /// Grants every configured role `subject` does not hold yet.
    pub fn grant<S: RoleStore>(&self, store: &S, subject: &str) -> GrantSummary {
        self.grant_with(store, "", subject, AuditEmitter::new())
    }

    /// Like [`grant`](Self::grant), recording one audit event per role.
    pub fn grant_audited<S: RoleStore>(
        &self,
        store: &S,
        attempt_id: &str,
        subject: &str,
        trail: &AuditTrail,
    ) -> GrantSummary {
        self.grant_with(store, attempt_id, subject, AuditEmitter::with_trail(trail))
    }

    fn grant_with<S: RoleStore>(
        &self,
        store: &S,
        attempt_id: &str,
        subject: &str,
        audit: AuditEmitter<'_>,
    ) -> GrantSummary {
        let mut summary = GrantSummary::default();

        if self.specs.is_empty() {
            tracing::debug!(subject, "no roles configured for automatic grant");
            return summary;
        }

        for spec in &self.specs {
            let resolved = match &spec.scope {
                Some(scope) => store.lookup_scoped_role(scope, &spec.name),
                None => store.lookup_realm_role(&spec.name),
            };

            let outcome = match resolved {
                None => {
                    tracing::warn!(subject, role = %spec, "role not found, skipping");
                    summary.unresolved.push(spec.clone());
                    AuditOutcome::Denied
                }
                Some(role) if store.subject_has_role(subject, &role) => {
                    tracing::debug!(subject, role = %spec, "subject already holds role");
                    summary.already_held.push(spec.clone());
                    continue;
                }
                Some(role) => match store.grant_role(subject, &role) {
                    Ok(()) => {
                        tracing::info!(subject, role = %spec, "granted role");
                        summary.granted.push(spec.clone());
                        AuditOutcome::Success
                    }
                    Err(err) => {
                        tracing::error!(subject, role = %spec, error = %err, "failed to grant role");
                        summary.failed.push(spec.clone());
                        AuditOutcome::Error
                    }
                },
            };

            audit.emit(
                AuditEvent::new(attempt_id, Some(subject), AuditEventKind::RoleGrant, outcome)
                    .with_detail(spec.to_string()),
            );
        }

        summary
    }
}

/// In-memory [`RoleStore`] for tests, demos and single-process hosts.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    realm_roles: HashSet<String>,
    scoped_roles: HashMap<String, HashSet<String>>,
    grants: Mutex<HashMap<String, BTreeSet<RoleSpec>>>,
}

impl InMemoryRoleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a realm-level role.
    pub fn with_realm_role(mut self, name: impl Into<String>) -> Self {
        self.realm_roles.insert(name.into());
        self
    }

    /// Defines a role inside `scope`.
    pub fn with_scoped_role(mut self, scope: impl Into<String>, name: impl Into<String>) -> Self {
        self.scoped_roles
            .entry(scope.into())
            .or_default()
            .insert(name.into());
        self
    }

    /// Returns the roles held by `subject`, sorted.
    pub fn roles_of(&self, subject: &str) -> Vec<RoleSpec> {
        self.lock()
            .get(subject)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<RoleSpec>>> {
        self.grants.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoleStore for InMemoryRoleStore {
    type Role = RoleSpec;

    fn lookup_realm_role(&self, name: &str) -> Option<RoleSpec> {
        self.realm_roles
            .contains(name)
            .then(|| RoleSpec::realm(name))
    }

    fn lookup_scoped_role(&self, scope: &str, name: &str) -> Option<RoleSpec> {
        self.scoped_roles
            .get(scope)
            .filter(|roles| roles.contains(name))
            .map(|_| RoleSpec::scoped(scope, name))
    }

    fn subject_has_role(&self, subject: &str, role: &RoleSpec) -> bool {
        self.lock()
            .get(subject)
            .is_some_and(|roles| roles.contains(role))
    }

    fn grant_role(&self, subject: &str, role: &RoleSpec) -> Result<(), RoleStoreError> {
        let inserted = self
            .lock()
            .entry(subject.to_string())
            .or_default()
            .insert(role.clone());

        if inserted {
            Ok(())
        } else {
            Err(RoleStoreError(format!("{subject} already holds {role}")))
        }
    }
}
