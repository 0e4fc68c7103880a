//! In-memory fakes of every collaborator and a fixture tenant.
//!
//! ```text
//! company ── branch ──┬── store          (store_caller, cashier "sam")
//!                     └── other store
//! foreign company ── foreign branch ── foreign store
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tally_core::{
    timestamp_now, Audit, CashDrawerEntry, CatalogProduct, Caller, Claims, Customer, Invoice,
    Money, OnlinePayment, PaymentMethod, Promotion, RoleTaxonomy, Sale, SaleReturn,
    SettlementSentinels, TenantScope,
};
use tally_db::{CachedStore, MemoryCache, MemoryTable, RecordStore};
use uuid::Uuid;

use crate::collaborators::{
    CollaboratorResult, Collaborators, DeliveryQueue, IdentityDirectory, InventoryLedger,
    ProductCatalog, PromotionSource, ReceiptNumbering, StockMovement, StoreDirectory, StoreProfile,
    UserProfile,
};
use crate::config::{SalesConfig, ServiceUrls};
use crate::error::CollaboratorError;
use crate::guard::TenantGuard;
use crate::orchestrator::SaleOrchestrator;
use crate::pricing::PricingResolver;
use crate::receipt::ReceiptPublisher;
use crate::records::{RecordService, SaleService};
use crate::settlement::SettlementRouter;
use crate::{SalesRuntime, Stores};

fn outage(service: &'static str) -> CollaboratorError {
    CollaboratorError::Transport {
        service,
        reason: "connection refused".into(),
    }
}

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
pub struct FakeIdentity {
    roles: Mutex<HashMap<Uuid, String>>,
    users: Mutex<HashMap<Uuid, UserProfile>>,
    failing: AtomicBool,
}

impl FakeIdentity {
    pub fn add_role(&self, role_id: Uuid, name: &str) {
        self.roles.lock().unwrap().insert(role_id, name.to_string());
    }

    pub fn rename_role(&self, role_id: Uuid, name: &str) {
        self.add_role(role_id, name);
    }

    pub fn add_user(&self, user_id: Uuid, username: &str) {
        self.users.lock().unwrap().insert(
            user_id,
            UserProfile {
                user_id,
                username: username.to_string(),
            },
        );
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityDirectory for FakeIdentity {
    async fn role_name(&self, _caller: &Caller, role_id: Uuid) -> CollaboratorResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage("identity service"));
        }
        self.roles
            .lock()
            .unwrap()
            .get(&role_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                service: "identity service",
                what: "role",
                id: role_id.to_string(),
            })
    }

    async fn user(&self, _caller: &Caller, user_id: Uuid) -> CollaboratorResult<UserProfile> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                service: "identity service",
                what: "user",
                id: user_id.to_string(),
            })
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    products: Mutex<HashMap<Uuid, CatalogProduct>>,
}

impl FakeCatalog {
    pub fn add(&self, name: &str, cents: i64) -> Uuid {
        let product_id = Uuid::new_v4();
        self.products.lock().unwrap().insert(
            product_id,
            CatalogProduct {
                product_id,
                name: name.to_string(),
                price: Money::from_cents(cents),
            },
        );
        product_id
    }
}

#[async_trait]
impl ProductCatalog for FakeCatalog {
    async fn product(&self, _caller: &Caller, product_id: Uuid) -> CollaboratorResult<CatalogProduct> {
        self.products
            .lock()
            .unwrap()
            .get(&product_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                service: "product service",
                what: "product",
                id: product_id.to_string(),
            })
    }
}

#[derive(Default)]
pub struct FakePromotions {
    promotions: Mutex<HashMap<Uuid, Promotion>>,
    failing: AtomicBool,
}

impl FakePromotions {
    pub fn set(&self, promotion: Promotion) {
        self.promotions
            .lock()
            .unwrap()
            .insert(promotion.product_id, promotion);
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PromotionSource for FakePromotions {
    async fn promotion_for(
        &self,
        _caller: &Caller,
        product_id: Uuid,
    ) -> CollaboratorResult<Option<Promotion>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage("promotion service"));
        }
        Ok(self.promotions.lock().unwrap().get(&product_id).cloned())
    }
}

/// Records movements; optionally fails once a number of them were accepted.
#[derive(Default)]
pub struct FakeInventory {
    movements: Mutex<Vec<StockMovement>>,
    accept_limit: Mutex<Option<usize>>,
}

impl FakeInventory {
    pub fn fail_after(&self, accepted: usize) {
        *self.accept_limit.lock().unwrap() = Some(accepted);
    }

    pub fn movements(&self) -> Vec<StockMovement> {
        self.movements.lock().unwrap().clone()
    }
}

#[async_trait]
impl InventoryLedger for FakeInventory {
    async fn record_movement(&self, _caller: &Caller, movement: &StockMovement) -> CollaboratorResult<()> {
        let mut movements = self.movements.lock().unwrap();
        if let Some(limit) = *self.accept_limit.lock().unwrap() {
            if movements.len() >= limit {
                return Err(outage("inventory service"));
            }
        }
        movements.push(movement.clone());
        Ok(())
    }
}

pub struct FakeNumbering {
    next: AtomicU64,
    issued: AtomicUsize,
}

impl Default for FakeNumbering {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1000),
            issued: AtomicUsize::new(0),
        }
    }
}

impl FakeNumbering {
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptNumbering for FakeNumbering {
    async fn next_receipt_id(&self, _caller: &Caller, _store_id: Uuid) -> CollaboratorResult<String> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst).to_string())
    }
}

pub struct FakeStores;

#[async_trait]
impl StoreDirectory for FakeStores {
    async fn store(&self, _caller: &Caller, store_id: Uuid) -> CollaboratorResult<StoreProfile> {
        Ok(StoreProfile {
            store_id,
            store_name: "Harbor St".into(),
            location: "1 Harbor St".into(),
        })
    }
}

#[derive(Default)]
pub struct FakeQueue {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    failing: AtomicBool,
}

impl FakeQueue {
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliveryQueue for FakeQueue {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> CollaboratorResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(outage("delivery queue"));
        }
        self.published
            .lock()
            .unwrap()
            .push((queue.to_string(), payload));
        Ok(())
    }
}

// =============================================================================
// Tables
// =============================================================================

pub struct MemoryTables {
    pub sales: Arc<MemoryTable<Sale>>,
    pub customers: Arc<MemoryTable<Customer>>,
    pub payment_methods: Arc<MemoryTable<PaymentMethod>>,
    pub cash_drawers: Arc<MemoryTable<CashDrawerEntry>>,
    pub invoices: Arc<MemoryTable<Invoice>>,
    pub online_payments: Arc<MemoryTable<OnlinePayment>>,
    pub returns: Arc<MemoryTable<SaleReturn>>,
}

fn cached<T: tally_core::Record>(
    table: &Arc<MemoryTable<T>>,
    cache: &Arc<MemoryCache>,
    ttl: Duration,
) -> CachedStore<T> {
    let store: Arc<dyn RecordStore<T>> = table.clone();
    CachedStore::new(store, cache.clone(), ttl)
}

// =============================================================================
// World
// =============================================================================

/// One tenant with a store, a customer and two products.
pub struct World {
    pub taxonomy: RoleTaxonomy,
    pub identity: Arc<FakeIdentity>,
    pub catalog: Arc<FakeCatalog>,
    pub promotions: Arc<FakePromotions>,
    pub inventory: Arc<FakeInventory>,
    pub numbering: Arc<FakeNumbering>,
    pub queue: Arc<FakeQueue>,
    pub tables: MemoryTables,
    pub cache: Arc<MemoryCache>,
    pub ttl: Duration,
    pub espresso: Uuid,
    pub croissant: Uuid,
    pub customer_id: Uuid,
    company_id: Uuid,
    branch_id: Uuid,
    store_id: Uuid,
    cashier_id: Uuid,
    roles: HashMap<&'static str, Uuid>,
}

impl World {
    pub fn new() -> Self {
        let taxonomy = RoleTaxonomy::new("super admin", "company admin", "branch manager", "cashier");
        let identity = Arc::new(FakeIdentity::default());
        let mut roles = HashMap::new();
        for name in ["super admin", "company admin", "branch manager", "cashier"] {
            let role_id = Uuid::new_v4();
            identity.add_role(role_id, name);
            roles.insert(name, role_id);
        }

        let cashier_id = Uuid::new_v4();
        identity.add_user(cashier_id, "sam");

        let catalog = Arc::new(FakeCatalog::default());
        let espresso = catalog.add("Espresso", 10000);
        let croissant = catalog.add("Croissant", 450);

        let company_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();
        let store_id = Uuid::new_v4();

        let customer_id = Uuid::new_v4();
        let customer = Customer {
            customer_id,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana@example.com".into(),
            phone_number: String::new(),
            date_of_birth: None,
            registration_date: None,
            address: String::new(),
            city: String::new(),
            country: String::new(),
            company_id,
            branch_id,
            audit: Audit::new(cashier_id, timestamp_now()),
        };

        World {
            taxonomy,
            identity,
            catalog,
            promotions: Arc::new(FakePromotions::default()),
            inventory: Arc::new(FakeInventory::default()),
            numbering: Arc::new(FakeNumbering::default()),
            queue: Arc::new(FakeQueue::default()),
            tables: MemoryTables {
                sales: Arc::new(MemoryTable::new()),
                customers: Arc::new(MemoryTable::with_rows(vec![customer])),
                payment_methods: Arc::new(MemoryTable::new()),
                cash_drawers: Arc::new(MemoryTable::new()),
                invoices: Arc::new(MemoryTable::new()),
                online_payments: Arc::new(MemoryTable::new()),
                returns: Arc::new(MemoryTable::new()),
            },
            cache: Arc::new(MemoryCache::new()),
            ttl: Duration::from_secs(3600),
            espresso,
            croissant,
            customer_id,
            company_id,
            branch_id,
            store_id,
            cashier_id,
            roles,
        }
    }

    // -------------------------------------------------------------------------
    // Scopes and callers
    // -------------------------------------------------------------------------

    pub fn store_scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: Some(self.branch_id),
            store_id: Some(self.store_id),
        }
    }

    /// Same branch, different store.
    pub fn other_store_scope(&self) -> TenantScope {
        TenantScope {
            store_id: Some(Uuid::new_v4()),
            ..self.store_scope()
        }
    }

    pub fn foreign_scope(&self) -> TenantScope {
        TenantScope {
            company_id: Uuid::new_v4(),
            branch_id: Some(Uuid::new_v4()),
            store_id: Some(Uuid::new_v4()),
        }
    }

    fn caller(&self, role_id: Uuid, scope: TenantScope) -> Caller {
        Caller::new(
            Claims {
                name: "sam".into(),
                role_id,
                company_id: scope.company_id,
                branch_id: scope.branch_id,
                store_id: scope.store_id,
                user_id: self.cashier_id,
            },
            "test-token",
        )
    }

    /// Caller with the named role, registering it when unknown.
    pub fn caller_with_role(&self, role_name: &str, scope: TenantScope) -> Caller {
        let role_id = match self.roles.get(role_name) {
            Some(id) => *id,
            None => {
                let id = Uuid::new_v4();
                self.identity.add_role(id, role_name);
                id
            }
        };
        self.caller(role_id, scope)
    }

    pub fn store_caller(&self) -> Caller {
        self.caller(self.roles["cashier"], self.store_scope())
    }

    pub fn branch_caller(&self) -> Caller {
        let scope = TenantScope {
            store_id: None,
            ..self.store_scope()
        };
        self.caller(self.roles["branch manager"], scope)
    }

    pub fn company_caller(&self) -> Caller {
        self.caller(self.roles["company admin"], TenantScope::company(self.company_id))
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    pub fn audit(&self) -> Audit {
        Audit::new(self.cashier_id, timestamp_now())
    }

    pub fn method(&self, name: &str) -> PaymentMethod {
        PaymentMethod {
            payment_method_id: Uuid::new_v4(),
            method_name: name.to_string(),
            company_id: self.company_id,
            audit: self.audit(),
        }
    }

    pub async fn seed_method(&self, name: &str) -> Uuid {
        let method = self.method(name);
        let id = method.payment_method_id;
        self.tables.payment_methods.insert(&method).await.unwrap();
        id
    }

    pub async fn seed_foreign_method(&self, name: &str) -> Uuid {
        let mut method = self.method(name);
        method.company_id = Uuid::new_v4();
        let id = method.payment_method_id;
        self.tables.payment_methods.insert(&method).await.unwrap();
        id
    }

    /// Inserts a customer owned by another company.
    pub async fn seed_foreign_customer(&self, email: &str) -> Uuid {
        let customer = Customer {
            customer_id: Uuid::new_v4(),
            first_name: "Eve".into(),
            last_name: "Stone".into(),
            email: email.to_string(),
            phone_number: String::new(),
            date_of_birth: None,
            registration_date: None,
            address: String::new(),
            city: String::new(),
            country: String::new(),
            company_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            audit: self.audit(),
        };
        let id = customer.customer_id;
        self.tables.customers.insert(&customer).await.unwrap();
        id
    }

    pub fn sale_for(&self, caller: &Caller) -> Sale {
        let scope = caller.claims.scope();
        Sale {
            sale_id: Uuid::new_v4(),
            receipt_id: "1".into(),
            product_id: self.espresso,
            customer_id: self.customer_id,
            quantity: 1,
            price: Money::from_cents(10000),
            total_price: Money::from_cents(10000),
            sale_date: timestamp_now(),
            company_id: scope.company_id,
            branch_id: scope.branch_id.unwrap_or_default(),
            store_id: scope.store_id.unwrap_or_default(),
            cashier_id: caller.claims.user_id,
            payment_method_id: Uuid::new_v4(),
            audit: self.audit(),
        }
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    pub fn stores(&self) -> Stores {
        Stores {
            sales: cached(&self.tables.sales, &self.cache, self.ttl),
            customers: cached(&self.tables.customers, &self.cache, self.ttl),
            payment_methods: cached(&self.tables.payment_methods, &self.cache, self.ttl),
            cash_drawers: cached(&self.tables.cash_drawers, &self.cache, self.ttl),
            invoices: cached(&self.tables.invoices, &self.cache, self.ttl),
            online_payments: cached(&self.tables.online_payments, &self.cache, self.ttl),
            returns: cached(&self.tables.returns, &self.cache, self.ttl),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            identity: self.identity.clone(),
            products: self.catalog.clone(),
            promotions: self.promotions.clone(),
            inventory: self.inventory.clone(),
            numbering: self.numbering.clone(),
            stores: Arc::new(FakeStores),
            queue: self.queue.clone(),
        }
    }

    pub fn config(&self) -> SalesConfig {
        SalesConfig {
            database_url: "postgres://unused".into(),
            db_max_connections: 1,
            redis_url: "redis://unused".into(),
            roles: self.taxonomy.clone(),
            sentinels: SettlementSentinels::new("Cash", "Pay Later"),
            services: ServiceUrls {
                product: String::new(),
                promotion: String::new(),
                inventory: String::new(),
                store: String::new(),
                identity: String::new(),
            },
            http_timeout_secs: 1,
            receipt_queue: "email_queue".into(),
            cache_ttl_secs: self.ttl.as_secs(),
        }
    }

    pub fn guard(&self) -> TenantGuard {
        TenantGuard::new(self.taxonomy.clone(), self.identity.clone())
    }

    pub fn pricing(&self) -> PricingResolver {
        PricingResolver::new(self.catalog.clone(), self.promotions.clone())
    }

    pub fn settlement(&self) -> SettlementRouter {
        let stores = self.stores();
        SettlementRouter::new(
            SettlementSentinels::new("Cash", "Pay Later"),
            stores.cash_drawers,
            stores.invoices,
            stores.online_payments,
        )
    }

    pub fn runtime(&self) -> SalesRuntime {
        SalesRuntime::assemble(&self.config(), self.stores(), self.collaborators())
    }

    pub fn orchestrator(&self) -> SaleOrchestrator {
        let collaborators = self.collaborators();
        let stores = self.stores();
        SaleOrchestrator::new(
            self.guard(),
            self.pricing(),
            self.settlement(),
            ReceiptPublisher::new(collaborators.queue, "email_queue"),
            crate::orchestrator::CheckoutServices {
                inventory: collaborators.inventory,
                numbering: collaborators.numbering,
                identity: collaborators.identity,
                stores: collaborators.stores,
            },
            crate::orchestrator::CheckoutTables {
                sales: stores.sales,
                payment_methods: stores.payment_methods,
                customers: stores.customers,
            },
        )
    }

    pub fn customers(&self) -> RecordService<Customer> {
        RecordService::new(self.guard(), self.stores().customers)
    }

    pub fn payment_methods(&self) -> RecordService<PaymentMethod> {
        RecordService::new(self.guard(), self.stores().payment_methods)
    }

    pub fn sales(&self) -> SaleService {
        let stores = self.stores();
        SaleService::new(
            RecordService::new(self.guard(), stores.sales),
            Arc::new(self.orchestrator()),
        )
    }
}
