//! Tenant Access Guard.
//!
//! ## Decision Flow
//! ```text
//! caller.claims.role_id
//!      │
//!      ▼ IdentityDirectory::role_name (every call, never cached here)
//! role name ──► RoleTaxonomy::classify ──► Role
//!      │
//!      ├─ not in the operation's allow-list ─────────► Authorization
//!      │
//!      ▼ record in hand?
//! level = role level matched onto the entity's scope columns
//! record.scope(level) == claims.scope(level) ? ok : Authorization
//! ```
//!
//! A record outside the caller's tenant is reported as an authorization
//! failure, never as not-found.

use std::sync::Arc;

use tally_core::tenancy::verify_scope;
use tally_core::{
    AccessPolicy, Caller, CoreError, Operation, Record, Role, RoleTaxonomy, ScopeFilter, ScopeLevel,
};
use tracing::{debug, warn};

use crate::collaborators::IdentityDirectory;
use crate::error::{SalesError, SalesResult};

#[derive(Clone)]
pub struct TenantGuard {
    taxonomy: RoleTaxonomy,
    identity: Arc<dyn IdentityDirectory>,
}

impl TenantGuard {
    pub fn new(taxonomy: RoleTaxonomy, identity: Arc<dyn IdentityDirectory>) -> Self {
        Self { taxonomy, identity }
    }

    /// Resolves the caller's role through the identity service.
    pub async fn resolve_role(&self, caller: &Caller) -> SalesResult<Role> {
        let name = self
            .identity
            .role_name(caller, caller.claims.role_id)
            .await?;
        let role = self.taxonomy.classify(&name);
        debug!(user_id = %caller.claims.user_id, role = %role, "Resolved caller role");
        Ok(role)
    }

    /// Checks a resolved role against an allow-list.
    pub fn authorize(
        &self,
        role: &Role,
        operation: Operation,
        allowed: &[ScopeLevel],
    ) -> SalesResult<()> {
        if role.is_allowed(allowed) {
            return Ok(());
        }
        warn!(role = %role, operation = %operation, "Operation not permitted for role");
        Err(CoreError::Forbidden {
            role: role.to_string(),
            operation: operation.to_string(),
        }
        .into())
    }

    /// Resolves the role and checks it against `policy` for `operation`.
    pub async fn admit(
        &self,
        caller: &Caller,
        policy: &AccessPolicy,
        operation: Operation,
    ) -> SalesResult<Role> {
        let role = self.resolve_role(caller).await?;
        self.authorize(&role, operation, policy.allowed(operation))?;
        Ok(role)
    }

    /// Verifies that a stored record sits inside the caller's scope.
    pub fn check_record<T: Record>(&self, role: &Role, caller: &Caller, record: &T) -> SalesResult<()> {
        let level = role
            .scope_level()
            .ok_or_else(|| CoreError::InvalidRole(role.to_string()))?
            .match_on(T::SCOPE_LEVELS);

        let record_value = record.scope().at(level);
        let caller_value = caller.claims.scope().at(level);
        if verify_scope(role, record_value, caller_value) {
            return Ok(());
        }

        warn!(
            entity = T::KIND,
            id = %record.id(),
            level = %level,
            user_id = %caller.claims.user_id,
            "Record outside caller scope"
        );
        Err(SalesError::from(CoreError::ScopeMismatch {
            entity: T::KIND.to_string(),
            id: record.id().to_string(),
        }))
    }

    /// Tenant filter for listing records of `T`.
    pub fn list_filter<T: Record>(&self, role: &Role, caller: &Caller) -> SalesResult<ScopeFilter> {
        Ok(ScopeFilter::for_role(
            role,
            &caller.claims.scope(),
            T::SCOPE_LEVELS,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::World;
    use tally_core::{Invoice, PaymentMethod, Sale};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_role_is_resolved_per_call() {
        let world = World::new();
        let cashier = world.store_caller();
        assert_eq!(world.guard().resolve_role(&cashier).await.unwrap(), Role::Store);

        world.identity.rename_role(cashier.claims.role_id, "intern");
        assert_eq!(
            world.guard().resolve_role(&cashier).await.unwrap(),
            Role::Unrecognized("intern".into())
        );
    }

    #[tokio::test]
    async fn test_unrecognized_role_is_refused() {
        let world = World::new();
        let caller = world.caller_with_role("intern", world.store_scope());
        let err = world
            .guard()
            .admit(&caller, &Sale::POLICY, Operation::Read)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthorizationFailed);
    }

    #[tokio::test]
    async fn test_identity_outage_is_dependency_failure() {
        let world = World::new();
        world.identity.fail(true);
        let err = world.guard().resolve_role(&world.store_caller()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DependencyFailed);
    }

    #[tokio::test]
    async fn test_store_role_cannot_update_sales() {
        let world = World::new();
        let err = world
            .guard()
            .admit(&world.store_caller(), &Sale::POLICY, Operation::Update)
            .await
            .unwrap_err();
        assert!(matches!(err, SalesError::Authorization(_)));
    }

    #[test]
    fn test_foreign_store_record_is_authorization_failure() {
        let world = World::new();
        let caller = world.store_caller();
        let mut sale = world.sale_for(&caller);

        assert!(world.guard().check_record(&Role::Store, &caller, &sale).is_ok());

        sale.store_id = Uuid::new_v4();
        let err = world.guard().check_record(&Role::Store, &caller, &sale).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthorizationFailed);
    }

    #[test]
    fn test_store_role_on_invoice_matches_branch() {
        let world = World::new();
        let caller = world.store_caller();
        let scope = caller.claims.scope();
        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            receipt_id: "1".into(),
            date: tally_core::timestamp_now(),
            amount: tally_core::Money::zero(),
            discounts: tally_core::Money::zero(),
            taxes: tally_core::Money::zero(),
            due_date: None,
            company_id: scope.company_id,
            branch_id: scope.branch_id.unwrap(),
            audit: world.audit(),
        };
        assert!(world.guard().check_record(&Role::Store, &caller, &invoice).is_ok());

        let filter = world.guard().list_filter::<Invoice>(&Role::Store, &caller).unwrap();
        assert_eq!(filter.level, ScopeLevel::Branch);
        let filter = world
            .guard()
            .list_filter::<PaymentMethod>(&Role::Store, &caller)
            .unwrap();
        assert_eq!(filter.level, ScopeLevel::Company);
    }

    #[test]
    fn test_super_role_never_matches_scope() {
        let world = World::new();
        let caller = world.store_caller();
        let sale = world.sale_for(&caller);
        assert!(world.guard().check_record(&Role::Super, &caller, &sale).is_err());
    }
}
