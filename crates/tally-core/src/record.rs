//! # Record Trait
//!
//! What the storage and service layers need to know about an entity,
//! independent of how it is stored.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Record (this trait)                                                    │
//! │  ├── KIND            "sale", "invoice", ... (cache key prefix, logs)   │
//! │  ├── SCOPE_LEVELS    which of company/branch/store the table carries   │
//! │  ├── REQUIRED_SCOPE  which of those must be present on create          │
//! │  ├── POLICY          allow-lists per operation                         │
//! │  └── id / scope / audit accessors                                      │
//! │                                                                         │
//! │  Used by:                                                               │
//! │    tally-db    CachedStore<T: Record>     (cache keys, tenant filter)  │
//! │    tally-sales RecordService<T: Record>   (guard, stamping)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationResult;
use crate::tenancy::{AccessPolicy, ScopeLevel, TenantScope};

// =============================================================================
// Audit Fields
// =============================================================================

/// Creation and last-update stamps shared by every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Uuid,
}

impl Audit {
    pub fn new(actor: Uuid, at: DateTime<Utc>) -> Self {
        Audit {
            created_at: at,
            created_by: actor,
            updated_at: at,
            updated_by: actor,
        }
    }

    pub fn touch(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.updated_at = at;
        self.updated_by = actor;
    }
}

/// Current time at the precision PostgreSQL keeps (microseconds), so a
/// record read back from the table equals the one that was written.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Copies id, scope and creation stamps from `stored` onto `incoming`.
pub fn carry_identity<T: Record>(incoming: &mut T, stored: &T) {
    incoming.set_id(stored.id());
    incoming.set_scope(&stored.scope());
    let created = *stored.audit();
    let audit = incoming.audit_mut();
    audit.created_at = created.created_at;
    audit.created_by = created.created_by;
}

/// Treats the nil uuid as an absent scope value.
pub(crate) fn present(id: Uuid) -> Option<Uuid> {
    if id.is_nil() {
        None
    } else {
        Some(id)
    }
}

// =============================================================================
// Record
// =============================================================================

/// An independently addressable, tenant-scoped entity.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short lowercase name used in cache keys and log fields.
    const KIND: &'static str;

    /// Scope columns the table carries, broadest first.
    const SCOPE_LEVELS: &'static [ScopeLevel];

    /// Scope columns that must be present when the record is created.
    const REQUIRED_SCOPE: &'static [ScopeLevel];

    const POLICY: AccessPolicy;

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    fn scope(&self) -> TenantScope;

    /// Writes the levels this record carries; absent values leave the field
    /// untouched.
    fn set_scope(&mut self, scope: &TenantScope);

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;

    /// Field-level checks run before create and update.
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }

    /// Copies identity, scope and creation stamps from the stored version
    /// onto an incoming update.
    fn carry_over(&mut self, stored: &Self) {
        carry_identity(self, stored);
    }

    /// Cache key for a record of this kind.
    fn cache_key(id: Uuid) -> String {
        format!("{}:{}", Self::KIND, id)
    }
}
