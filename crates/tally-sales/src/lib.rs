//! # Tally Sales
//!
//! Sale orchestration and tenant-guarded record services.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           SalesRuntime                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌─────────────────────────────────────────────┐   │
//! │  │  SaleService   │  │  RecordService<T>                           │   │
//! │  │                │  │  customers, payment methods, cash drawers,  │   │
//! │  │ • create ──────┼─►│  invoices, online payments, returns         │   │
//! │  │   (checkout)   │  └─────────────────────────────────────────────┘   │
//! │  │ • read/update/ │                                                    │
//! │  │   delete/list  │  ┌──────────────┐ ┌──────────────┐ ┌────────────┐ │
//! │  └───────┬────────┘  │ TenantGuard  │ │PricingResolver│ │Settlement  │ │
//! │          │           └──────────────┘ └──────────────┘ │Router      │ │
//! │          ▼                                             └────────────┘ │
//! │  ┌────────────────┐  ┌──────────────────────────────────────────────┐ │
//! │  │SaleOrchestrator│  │  Infrastructure                              │ │
//! │  │                │  │  PostgreSQL tables · Redis cache-aside ·     │ │
//! │  │                │  │  HTTP collaborators · Redis receipt queue    │ │
//! │  └────────────────┘  └──────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::SalesConfig::load`]):
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `REDIS_URL` / `REDIS_ADDR` - Redis connection
//! - `*_USER_ROLE` - Role names for the four tiers
//! - `CASH_METHOD`, `PAY_LATER_METHOD` - Settlement payment method names
//! - `*_SERVICE_URL` - Collaborator base URLs

pub mod collaborators;
pub mod config;
pub mod error;
pub mod guard;
pub mod health;
pub mod orchestrator;
pub mod pricing;
pub mod receipt;
pub mod records;
pub mod settlement;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use tally_core::{
    CashDrawerEntry, Customer, Invoice, OnlinePayment, PaymentMethod, Sale, SaleReturn,
};
use tally_db::{Cache, CachedStore, Database, DbConfig, RedisCache, Table};
use tracing::info;

use crate::collaborators::http::{build_client, http_collaborators};
use crate::collaborators::queue::RedisQueue;
use crate::collaborators::Collaborators;
use crate::guard::TenantGuard;
use crate::health::{HealthReport, Probes};
use crate::orchestrator::{CheckoutServices, CheckoutTables, SaleOrchestrator};
use crate::pricing::PricingResolver;
use crate::receipt::ReceiptPublisher;
use crate::records::{RecordService, SaleService};
use crate::settlement::SettlementRouter;

// Re-exports
pub use config::SalesConfig;
pub use error::{FailureResponse, SalesError, SalesResult};
pub use orchestrator::{CreatedSales, SaleStage};

/// Cache-aside stores for every entity.
#[derive(Clone)]
pub struct Stores {
    pub sales: CachedStore<Sale>,
    pub customers: CachedStore<Customer>,
    pub payment_methods: CachedStore<PaymentMethod>,
    pub cash_drawers: CachedStore<CashDrawerEntry>,
    pub invoices: CachedStore<Invoice>,
    pub online_payments: CachedStore<OnlinePayment>,
    pub returns: CachedStore<SaleReturn>,
}

impl Stores {
    /// PostgreSQL tables behind one shared cache.
    pub fn postgres(db: &Database, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        fn cached<T: Table>(db: &Database, cache: &Arc<dyn Cache>, ttl: Duration) -> CachedStore<T> {
            CachedStore::new(Arc::new(db.table::<T>()), Arc::clone(cache), ttl)
        }

        Stores {
            sales: cached(db, &cache, ttl),
            customers: cached(db, &cache, ttl),
            payment_methods: cached(db, &cache, ttl),
            cash_drawers: cached(db, &cache, ttl),
            invoices: cached(db, &cache, ttl),
            online_payments: cached(db, &cache, ttl),
            returns: cached(db, &cache, ttl),
        }
    }
}

struct Backends {
    database: Database,
    cache: RedisCache,
}

/// Every public operation of the sales core, wired and ready.
pub struct SalesRuntime {
    pub sales: SaleService,
    pub customers: RecordService<Customer>,
    pub payment_methods: RecordService<PaymentMethod>,
    pub cash_drawers: RecordService<CashDrawerEntry>,
    pub invoices: RecordService<Invoice>,
    pub online_payments: RecordService<OnlinePayment>,
    pub returns: RecordService<SaleReturn>,
    backends: Option<Backends>,
}

impl SalesRuntime {
    /// Connects PostgreSQL (running migrations), Redis and the HTTP
    /// collaborators.
    pub async fn connect(config: SalesConfig) -> SalesResult<Self> {
        let database = Database::new(
            DbConfig::new(config.database_url.clone()).max_connections(config.db_max_connections),
        )
        .await?;
        let cache = RedisCache::connect(&config.redis_url).await?;
        info!("Connected to Redis");

        let http = build_client(config.http_timeout())?;
        let queue = Arc::new(RedisQueue::from_cache(&cache));
        let collaborators = http_collaborators(&config.services, http, queue);

        let stores = Stores::postgres(&database, Arc::new(cache.clone()), config.cache_ttl());
        let mut runtime = Self::assemble(&config, stores, collaborators);
        runtime.backends = Some(Backends { database, cache });

        info!("Sales runtime ready");
        Ok(runtime)
    }

    /// Wires services over the given stores and collaborators.
    pub fn assemble(config: &SalesConfig, stores: Stores, collaborators: Collaborators) -> Self {
        let guard = TenantGuard::new(config.roles.clone(), Arc::clone(&collaborators.identity));

        let orchestrator = SaleOrchestrator::new(
            guard.clone(),
            PricingResolver::new(
                Arc::clone(&collaborators.products),
                Arc::clone(&collaborators.promotions),
            ),
            SettlementRouter::new(
                config.sentinels.clone(),
                stores.cash_drawers.clone(),
                stores.invoices.clone(),
                stores.online_payments.clone(),
            ),
            ReceiptPublisher::new(Arc::clone(&collaborators.queue), config.receipt_queue.clone()),
            CheckoutServices {
                inventory: collaborators.inventory,
                numbering: collaborators.numbering,
                identity: collaborators.identity,
                stores: collaborators.stores,
            },
            CheckoutTables {
                sales: stores.sales.clone(),
                payment_methods: stores.payment_methods.clone(),
                customers: stores.customers.clone(),
            },
        );

        SalesRuntime {
            sales: SaleService::new(
                RecordService::new(guard.clone(), stores.sales),
                Arc::new(orchestrator),
            ),
            customers: RecordService::new(guard.clone(), stores.customers),
            payment_methods: RecordService::new(guard.clone(), stores.payment_methods),
            cash_drawers: RecordService::new(guard.clone(), stores.cash_drawers),
            invoices: RecordService::new(guard.clone(), stores.invoices),
            online_payments: RecordService::new(guard.clone(), stores.online_payments),
            returns: RecordService::new(guard, stores.returns),
            backends: None,
        }
    }

    pub async fn health(&self) -> HealthReport {
        match &self.backends {
            Some(backends) => health::check(&backends.database, &backends.cache).await,
            None => health::summarize(Probes {
                database: true,
                redis: true,
                migrations: None,
            }),
        }
    }

    pub async fn shutdown(&self) {
        if let Some(backends) = &self.backends {
            backends.database.close().await;
        }
        info!("Sales runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ServingStatus;
    use crate::testing::World;
    use tally_core::{Pagination, SaleLineRequest};

    #[tokio::test]
    async fn test_assembled_runtime_checks_out_and_lists() {
        let world = World::new();
        let runtime = world.runtime();
        let method = world.seed_method("Cash").await;

        let created = runtime
            .sales
            .create(
                &world.store_caller(),
                &[SaleLineRequest {
                    product_id: world.croissant,
                    customer_id: world.customer_id,
                    quantity: 4,
                    payment_method_id: method,
                    sale_date: None,
                }],
            )
            .await
            .unwrap();

        let drawers = runtime
            .cash_drawers
            .list(&world.store_caller(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(drawers.total_records, 1);
        assert_eq!(drawers.records[0].receipt_id, created.receipt_id);

        let sale = runtime
            .sales
            .read(&world.store_caller(), created.sales[0].sale_id)
            .await
            .unwrap();
        assert_eq!(sale, created.sales[0]);

        assert_eq!(runtime.health().await.status, ServingStatus::Serving);
    }
}
