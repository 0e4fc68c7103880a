//! Guarded CRUD for every entity.
//!
//! ```text
//! create   admit(create) ─► scope from claims ─► required scope ─► validate ─► insert
//! read     admit(read)   ─► cache-aside read  ─► check_record
//! update   admit(update) ─► read stored ─► check_record ─► carry_over ─► validate ─► write
//! delete   admit(delete) ─► read stored ─► check_record ─► delete + evict
//! list     admit(list)   ─► tenant filter ─► page
//! ```

use std::sync::Arc;

use tally_core::{
    timestamp_now, Audit, Caller, CoreError, Operation, Page, Pagination, Record, Sale,
    SaleLineRequest, TenantScope,
};
use tally_db::CachedStore;
use tracing::info;
use uuid::Uuid;

use crate::error::SalesResult;
use crate::guard::TenantGuard;
use crate::orchestrator::{CreatedSales, SaleOrchestrator};

/// Tenant-guarded access to one entity's cache-aside store.
pub struct RecordService<T: Record> {
    guard: TenantGuard,
    store: CachedStore<T>,
}

impl<T: Record> Clone for RecordService<T> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: Record> RecordService<T> {
    pub fn new(guard: TenantGuard, store: CachedStore<T>) -> Self {
        Self { guard, store }
    }

    /// Creates a record. The id and audit stamps are assigned here; scope
    /// comes from the claims down to the caller's level and from the
    /// record below it.
    pub async fn create(&self, caller: &Caller, mut record: T) -> SalesResult<T> {
        let role = self.guard.admit(caller, &T::POLICY, Operation::Create).await?;
        let level = role
            .scope_level()
            .ok_or_else(|| CoreError::InvalidRole(role.to_string()))?;

        let scope = TenantScope::for_create(level, &caller.claims.scope(), &record.scope());
        scope.require(T::REQUIRED_SCOPE)?;

        record.set_id(Uuid::new_v4());
        record.set_scope(&scope);
        *record.audit_mut() = Audit::new(caller.claims.user_id, timestamp_now());
        record.validate()?;

        self.store.create(&record).await?;
        info!(entity = T::KIND, id = %record.id(), user_id = %caller.claims.user_id, "Record created");
        Ok(record)
    }

    pub async fn read(&self, caller: &Caller, id: Uuid) -> SalesResult<T> {
        let role = self.guard.admit(caller, &T::POLICY, Operation::Read).await?;
        let record = self.store.read(id).await?;
        self.guard.check_record(&role, caller, &record)?;
        Ok(record)
    }

    /// Replaces a record; identity, scope and creation stamps are kept.
    pub async fn update(&self, caller: &Caller, id: Uuid, mut incoming: T) -> SalesResult<T> {
        let role = self.guard.admit(caller, &T::POLICY, Operation::Update).await?;
        let stored = self.store.read(id).await?;
        self.guard.check_record(&role, caller, &stored)?;

        incoming.carry_over(&stored);
        incoming
            .audit_mut()
            .touch(caller.claims.user_id, timestamp_now());
        incoming.validate()?;

        self.store.update(&incoming).await?;
        info!(entity = T::KIND, %id, user_id = %caller.claims.user_id, "Record updated");
        Ok(incoming)
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> SalesResult<()> {
        let role = self.guard.admit(caller, &T::POLICY, Operation::Delete).await?;
        let stored = self.store.read(id).await?;
        self.guard.check_record(&role, caller, &stored)?;

        self.store.delete(id).await?;
        info!(entity = T::KIND, %id, user_id = %caller.claims.user_id, "Record deleted");
        Ok(())
    }

    pub async fn list(&self, caller: &Caller, pagination: Pagination) -> SalesResult<Page<T>> {
        let role = self.guard.admit(caller, &T::POLICY, Operation::List).await?;
        let filter = self.guard.list_filter::<T>(&role, caller)?;
        Ok(self.store.read_all_paged(&filter, pagination).await?)
    }
}

/// Sales: orchestrated creation plus guarded read, update, delete, list.
pub struct SaleService {
    records: RecordService<Sale>,
    orchestrator: Arc<SaleOrchestrator>,
}

impl SaleService {
    pub fn new(records: RecordService<Sale>, orchestrator: Arc<SaleOrchestrator>) -> Self {
        Self {
            records,
            orchestrator,
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        lines: &[SaleLineRequest],
    ) -> SalesResult<CreatedSales> {
        self.orchestrator.create_sales(caller, lines).await
    }

    pub async fn read(&self, caller: &Caller, id: Uuid) -> SalesResult<Sale> {
        self.records.read(caller, id).await
    }

    /// Only the customer and the sale date change; settled fields stay.
    pub async fn update(&self, caller: &Caller, id: Uuid, incoming: Sale) -> SalesResult<Sale> {
        self.records.update(caller, id, incoming).await
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> SalesResult<()> {
        self.records.delete(caller, id).await
    }

    pub async fn list(&self, caller: &Caller, pagination: Pagination) -> SalesResult<Page<Sale>> {
        self.records.list(caller, pagination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, SalesError};
    use crate::testing::World;
    use tally_core::{CashDrawerEntry, Customer, Money, PaymentMethod};

    fn customer() -> Customer {
        Customer {
            customer_id: Uuid::nil(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana.silva@example.com".into(),
            phone_number: "555-0101".into(),
            date_of_birth: None,
            registration_date: None,
            address: "2 Quay Rd".into(),
            city: "Porto".into(),
            country: "PT".into(),
            company_id: Uuid::nil(),
            branch_id: Uuid::nil(),
            audit: Audit::new(Uuid::nil(), timestamp_now()),
        }
    }

    #[tokio::test]
    async fn test_create_takes_scope_from_claims() {
        let world = World::new();
        let caller = world.store_caller();
        let mut payload = customer();
        payload.company_id = Uuid::new_v4();

        let created = world.customers().create(&caller, payload).await.unwrap();
        let scope = caller.claims.scope();
        assert_ne!(created.customer_id, Uuid::nil());
        assert_eq!(created.company_id, scope.company_id);
        assert_eq!(Some(created.branch_id), scope.branch_id);
        assert_eq!(created.audit.created_by, caller.claims.user_id);

        let read = world.customers().read(&caller, created.customer_id).await.unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn test_branch_user_must_name_store_for_cash_drawer() {
        let world = World::new();
        let caller = world.branch_caller();
        let service = RecordService::new(world.guard(), world.stores().cash_drawers);
        let entry = CashDrawerEntry {
            drawer_id: Uuid::nil(),
            receipt_id: "9".into(),
            employee_id: caller.claims.user_id,
            role_id: caller.claims.role_id,
            cash_in: Money::from_cents(500),
            amount: Money::from_cents(500),
            cash_out: Money::zero(),
            transaction_time: timestamp_now(),
            description: "float".into(),
            company_id: Uuid::nil(),
            branch_id: None,
            store_id: None,
            audit: world.audit(),
        };

        let err = service.create(&caller, entry.clone()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);

        let store_id = world.store_caller().claims.store_id;
        let created = service
            .create(&caller, CashDrawerEntry { store_id, ..entry })
            .await
            .unwrap();
        assert_eq!(created.store_id, store_id);
        assert_eq!(created.branch_id, caller.claims.branch_id);
    }

    #[tokio::test]
    async fn test_company_only_payment_method_creation() {
        let world = World::new();
        let service = world.payment_methods();
        let method = world.method("Voucher");

        let err = service.create(&world.store_caller(), method.clone()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthorizationFailed);

        let created = service.create(&world.company_caller(), method).await.unwrap();
        assert_eq!(created.method_name, "Voucher");
    }

    #[tokio::test]
    async fn test_read_of_foreign_record_is_authorization_not_not_found() {
        let world = World::new();
        let other_store = world.caller_with_role("cashier", world.other_store_scope());
        let created = world
            .customers()
            .create(&world.store_caller(), customer())
            .await
            .unwrap();

        // same branch: visible
        assert!(world.customers().read(&other_store, created.customer_id).await.is_ok());

        let foreign = world.caller_with_role("cashier", world.foreign_scope());
        let err = world
            .customers()
            .read(&foreign, created.customer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, SalesError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_identity_and_scope() {
        let world = World::new();
        let caller = world.store_caller();
        let created = world.customers().create(&caller, customer()).await.unwrap();

        let mut incoming = customer();
        incoming.city = "Lisbon".into();
        incoming.company_id = Uuid::new_v4();
        let updated = world
            .customers()
            .update(&caller, created.customer_id, incoming)
            .await
            .unwrap();

        assert_eq!(updated.customer_id, created.customer_id);
        assert_eq!(updated.company_id, created.company_id);
        assert_eq!(updated.audit.created_at, created.audit.created_at);
        assert_eq!(updated.city, "Lisbon");

        let read = world.customers().read(&caller, created.customer_id).await.unwrap();
        assert_eq!(read.city, "Lisbon");
    }

    #[tokio::test]
    async fn test_delete_then_read_is_not_found() {
        let world = World::new();
        let created = world
            .customers()
            .create(&world.store_caller(), customer())
            .await
            .unwrap();

        world
            .customers()
            .delete(&world.branch_caller(), created.customer_id)
            .await
            .unwrap();

        let err = world
            .customers()
            .read(&world.store_caller(), created.customer_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped() {
        let world = World::new();
        let service = world.payment_methods();
        for name in ["Cash", "Pay Later", "Card"] {
            service.create(&world.company_caller(), world.method(name)).await.unwrap();
        }
        world.seed_foreign_method("Cash").await;

        let page = service
            .list(&world.store_caller(), Pagination::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_records, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.records.len(), 2);
    }

    #[tokio::test]
    async fn test_sale_update_changes_customer_only() {
        let world = World::new();
        let method = world.seed_method("Cash").await;
        let created = world
            .sales()
            .create(
                &world.store_caller(),
                &[SaleLineRequest {
                    product_id: world.espresso,
                    customer_id: world.customer_id,
                    quantity: 2,
                    payment_method_id: method,
                    sale_date: None,
                }],
            )
            .await
            .unwrap();
        let stored = created.sales[0].clone();

        let new_customer = Uuid::new_v4();
        let mut incoming = stored.clone();
        incoming.customer_id = new_customer;
        incoming.quantity = 50;
        incoming.total_price = Money::zero();

        let updated = world
            .sales()
            .update(&world.branch_caller(), stored.sale_id, incoming)
            .await
            .unwrap();
        assert_eq!(updated.customer_id, new_customer);
        assert_eq!(updated.quantity, 2);
        assert_eq!(updated.total_price, stored.total_price);

        let err = world
            .sales()
            .update(&world.store_caller(), stored.sale_id, updated.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AuthorizationFailed);

        let listed = world
            .sales()
            .list(&world.company_caller(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(listed.total_records, 1);
    }

    #[tokio::test]
    async fn test_unknown_payment_method_read_is_not_found() {
        let world = World::new();
        let err = RecordService::<PaymentMethod>::new(world.guard(), world.stores().payment_methods)
            .read(&world.store_caller(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
