//! # Tenancy
//!
//! The company → branch → store hierarchy, role classification and the pure
//! halves of the tenant access checks.
//!
//! ## Scope Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Company  (broadest)      company role sees every branch and store     │
//! │     └── Branch             branch role sees every store in its branch   │
//! │           └── Store        store role sees its own store only           │
//! │                                                                         │
//! │   A record is matched on the NARROWEST scope column it carries that    │
//! │   is not narrower than the caller's role:                              │
//! │                                                                         │
//! │     store role  + sale (company/branch/store)  → store_id              │
//! │     store role  + invoice (company/branch)     → branch_id             │
//! │     branch role + payment method (company)     → company_id            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Role names are never compared against process-wide globals: a
//! [`RoleTaxonomy`] is built once from configuration and handed to whoever
//! needs to classify a role.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Scope Levels
// =============================================================================

/// One level of the tenant hierarchy. Ordered broadest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Company,
    Branch,
    Store,
}

impl ScopeLevel {
    /// Column name carrying this level on every table.
    pub const fn column(&self) -> &'static str {
        match self {
            ScopeLevel::Company => "company_id",
            ScopeLevel::Branch => "branch_id",
            ScopeLevel::Store => "store_id",
        }
    }

    /// The level a record is matched on for a caller at `self`, given the
    /// scope columns the record's table carries.
    ///
    /// ```rust
    /// use tally_core::tenancy::ScopeLevel::*;
    ///
    /// assert_eq!(Store.match_on(&[Company, Branch, Store]), Store);
    /// assert_eq!(Store.match_on(&[Company, Branch]), Branch);
    /// assert_eq!(Branch.match_on(&[Company]), Company);
    /// ```
    pub fn match_on(&self, carried: &[ScopeLevel]) -> ScopeLevel {
        carried
            .iter()
            .copied()
            .filter(|level| level <= self)
            .max()
            .unwrap_or(ScopeLevel::Company)
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeLevel::Company => "company",
            ScopeLevel::Branch => "branch",
            ScopeLevel::Store => "store",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Tenant Scope
// =============================================================================

/// The ownership triple stamped on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub company_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
}

impl TenantScope {
    pub fn company(company_id: Uuid) -> Self {
        TenantScope {
            company_id,
            branch_id: None,
            store_id: None,
        }
    }

    /// Value of the given level, if present.
    pub fn at(&self, level: ScopeLevel) -> Option<Uuid> {
        match level {
            ScopeLevel::Company => Some(self.company_id),
            ScopeLevel::Branch => self.branch_id,
            ScopeLevel::Store => self.store_id,
        }
    }

    /// Scope for a record created by a caller at `level`.
    ///
    /// Levels at or above the caller come from the caller's claims; levels
    /// below it come from the submitted payload (a branch user creating a
    /// cash drawer entry names the store).
    pub fn for_create(level: ScopeLevel, caller: &TenantScope, requested: &TenantScope) -> Self {
        let from_claims = |at: ScopeLevel| level >= at;
        TenantScope {
            company_id: caller.company_id,
            branch_id: if from_claims(ScopeLevel::Branch) {
                caller.branch_id
            } else {
                requested.branch_id
            },
            store_id: if from_claims(ScopeLevel::Store) {
                caller.store_id
            } else {
                requested.store_id
            },
        }
    }

    /// Fails when a level the entity requires is absent.
    pub fn require(&self, levels: &[ScopeLevel]) -> Result<(), ValidationError> {
        for level in levels {
            if self.at(*level).is_none() {
                return Err(ValidationError::required(level.column()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Roles
// =============================================================================

/// A role name classified against the configured taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Super,
    Company,
    Branch,
    Store,
    Unrecognized(String),
}

impl Role {
    /// Scope level the role operates at; `None` for roles that carry no
    /// tenant scope in this service.
    pub fn scope_level(&self) -> Option<ScopeLevel> {
        match self {
            Role::Company => Some(ScopeLevel::Company),
            Role::Branch => Some(ScopeLevel::Branch),
            Role::Store => Some(ScopeLevel::Store),
            Role::Super | Role::Unrecognized(_) => None,
        }
    }

    /// Membership test against an operation allow-list.
    pub fn is_allowed(&self, allowed: &[ScopeLevel]) -> bool {
        self.scope_level()
            .map(|level| allowed.contains(&level))
            .unwrap_or(false)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Super => f.write_str("super"),
            Role::Company => f.write_str("company"),
            Role::Branch => f.write_str("branch"),
            Role::Store => f.write_str("store"),
            Role::Unrecognized(name) => f.write_str(name),
        }
    }
}

/// Role names as configured for this deployment.
///
/// Immutable once built; every component that classifies roles receives a
/// clone at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTaxonomy {
    pub super_role: String,
    pub company_role: String,
    pub branch_role: String,
    pub store_role: String,
}

impl RoleTaxonomy {
    pub fn new(
        super_role: impl Into<String>,
        company_role: impl Into<String>,
        branch_role: impl Into<String>,
        store_role: impl Into<String>,
    ) -> Self {
        RoleTaxonomy {
            super_role: super_role.into(),
            company_role: company_role.into(),
            branch_role: branch_role.into(),
            store_role: store_role.into(),
        }
    }

    /// Classifies a role name by exact match.
    pub fn classify(&self, role_name: &str) -> Role {
        if role_name == self.store_role {
            Role::Store
        } else if role_name == self.branch_role {
            Role::Branch
        } else if role_name == self.company_role {
            Role::Company
        } else if role_name == self.super_role {
            Role::Super
        } else {
            Role::Unrecognized(role_name.to_string())
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Identity claims carried by the caller's bearer token.
///
/// Field names follow the token payload (`role`, `companyId`, `branchId`,
/// `storeId`, `userId`). Company-level users carry empty branch/store claims,
/// which deserialize to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "role")]
    pub role_id: Uuid,

    pub company_id: Uuid,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub branch_id: Option<Uuid>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub store_id: Option<Uuid>,

    pub user_id: Uuid,
}

impl Claims {
    pub fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: self.branch_id,
            store_id: self.store_id,
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Uuid::parse_str(text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// An authenticated caller: verified claims plus the raw token forwarded to
/// collaborators.
#[derive(Debug, Clone)]
pub struct Caller {
    pub claims: Claims,
    pub token: String,
}

impl Caller {
    pub fn new(claims: Claims, token: impl Into<String>) -> Self {
        Caller {
            claims,
            token: token.into(),
        }
    }
}

// =============================================================================
// Access Policy
// =============================================================================

/// Operations guarded by an [`AccessPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// Fixed allow-lists for one entity, by operation.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub create: &'static [ScopeLevel],
    pub read: &'static [ScopeLevel],
    pub update: &'static [ScopeLevel],
    pub delete: &'static [ScopeLevel],
    pub list: &'static [ScopeLevel],
}

impl AccessPolicy {
    pub fn allowed(&self, operation: Operation) -> &'static [ScopeLevel] {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
            Operation::List => self.list,
        }
    }
}

// =============================================================================
// Scope Checks
// =============================================================================

/// True when the role is scoped and both values are present and equal.
///
/// ```rust
/// use tally_core::tenancy::{verify_scope, Role};
/// use uuid::Uuid;
///
/// let store = Uuid::new_v4();
/// assert!(verify_scope(&Role::Store, Some(store), Some(store)));
/// assert!(!verify_scope(&Role::Store, Some(store), Some(Uuid::new_v4())));
/// assert!(!verify_scope(&Role::Super, Some(store), Some(store)));
/// ```
pub fn verify_scope(role: &Role, record_value: Option<Uuid>, caller_value: Option<Uuid>) -> bool {
    if role.scope_level().is_none() {
        return false;
    }
    matches!((record_value, caller_value), (Some(record), Some(caller)) if record == caller)
}

/// Filter applied to list queries: `WHERE {level.column()} = value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeFilter {
    pub level: ScopeLevel,
    pub value: Uuid,
}

impl ScopeFilter {
    /// Builds the tenant filter for a caller listing records of a table that
    /// carries the given scope columns.
    pub fn for_role(role: &Role, caller: &TenantScope, carried: &[ScopeLevel]) -> CoreResult<Self> {
        let level = role
            .scope_level()
            .ok_or_else(|| CoreError::InvalidRole(role.to_string()))?
            .match_on(carried);
        let value = caller
            .at(level)
            .ok_or_else(|| ValidationError::required(level.column()))?;
        Ok(ScopeFilter { level, value })
    }

    pub fn matches(&self, scope: &TenantScope) -> bool {
        scope.at(self.level) == Some(self.value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> RoleTaxonomy {
        RoleTaxonomy::new("super admin", "company admin", "branch manager", "cashier")
    }

    fn scope() -> TenantScope {
        TenantScope {
            company_id: Uuid::new_v4(),
            branch_id: Some(Uuid::new_v4()),
            store_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_classify_roles() {
        let t = taxonomy();
        assert_eq!(t.classify("cashier"), Role::Store);
        assert_eq!(t.classify("branch manager"), Role::Branch);
        assert_eq!(t.classify("company admin"), Role::Company);
        assert_eq!(t.classify("super admin"), Role::Super);
        assert_eq!(
            t.classify("auditor"),
            Role::Unrecognized("auditor".to_string())
        );
    }

    #[test]
    fn test_allow_list_membership() {
        let allowed = &[ScopeLevel::Branch, ScopeLevel::Store];
        assert!(Role::Store.is_allowed(allowed));
        assert!(Role::Branch.is_allowed(allowed));
        assert!(!Role::Company.is_allowed(allowed));
        assert!(!Role::Super.is_allowed(allowed));
        assert!(!Role::Unrecognized("x".into()).is_allowed(allowed));
    }

    #[test]
    fn test_match_on_falls_back_to_broader_column() {
        use ScopeLevel::*;
        assert_eq!(Company.match_on(&[Company, Branch, Store]), Company);
        assert_eq!(Branch.match_on(&[Company, Branch, Store]), Branch);
        assert_eq!(Store.match_on(&[Company, Branch]), Branch);
        assert_eq!(Store.match_on(&[Company]), Company);
    }

    #[test]
    fn test_verify_scope_rejects_missing_values() {
        let id = Uuid::new_v4();
        assert!(!verify_scope(&Role::Branch, None, Some(id)));
        assert!(!verify_scope(&Role::Branch, Some(id), None));
        assert!(verify_scope(&Role::Branch, Some(id), Some(id)));
    }

    #[test]
    fn test_create_scope_by_role() {
        let caller = scope();
        let requested = scope();

        let store = TenantScope::for_create(ScopeLevel::Store, &caller, &requested);
        assert_eq!(store, caller);

        let branch = TenantScope::for_create(ScopeLevel::Branch, &caller, &requested);
        assert_eq!(branch.company_id, caller.company_id);
        assert_eq!(branch.branch_id, caller.branch_id);
        assert_eq!(branch.store_id, requested.store_id);

        let company = TenantScope::for_create(ScopeLevel::Company, &caller, &requested);
        assert_eq!(company.company_id, caller.company_id);
        assert_eq!(company.branch_id, requested.branch_id);
    }

    #[test]
    fn test_require_reports_missing_column() {
        let scope = TenantScope::company(Uuid::new_v4());
        let err = scope
            .require(&[ScopeLevel::Company, ScopeLevel::Store])
            .unwrap_err();
        assert_eq!(err, ValidationError::required("store_id"));
    }

    #[test]
    fn test_list_filter_for_roles() {
        use ScopeLevel::*;
        let caller = scope();

        let f = ScopeFilter::for_role(&Role::Store, &caller, &[Company, Branch, Store]).unwrap();
        assert_eq!(f.level, Store);
        assert_eq!(Some(f.value), caller.store_id);

        let f = ScopeFilter::for_role(&Role::Company, &caller, &[Company, Branch, Store]).unwrap();
        assert_eq!(f.value, caller.company_id);

        let err = ScopeFilter::for_role(&Role::Super, &caller, &[Company]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRole(_)));
    }

    #[test]
    fn test_claims_from_token_payload() {
        let company = Uuid::new_v4();
        let json = format!(
            r#"{{"name":"ana","role":"{}","companyId":"{}","branchId":"","storeId":"","userId":"{}"}}"#,
            Uuid::new_v4(),
            company,
            Uuid::new_v4()
        );
        let claims: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims.company_id, company);
        assert_eq!(claims.branch_id, None);
        assert_eq!(claims.store_id, None);
    }
}
