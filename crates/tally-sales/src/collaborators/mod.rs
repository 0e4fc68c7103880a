//! Contracts with the services the sales core depends on.
//!
//! ```text
//! ┌──────────────────────┐     ┌─────────────────────────────┐
//! │  SaleOrchestrator    │────►│ ProductCatalog   (HTTP)     │
//! │  TenantGuard         │────►│ PromotionSource  (HTTP)     │
//! │  PricingResolver     │────►│ InventoryLedger  (HTTP)     │
//! │  ReceiptPublisher    │────►│ ReceiptNumbering (HTTP)     │
//! │                      │────►│ StoreDirectory   (HTTP)     │
//! │                      │────►│ IdentityDirectory(HTTP)     │
//! │                      │────►│ DeliveryQueue    (Redis)    │
//! └──────────────────────┘     └─────────────────────────────┘
//! ```
//!
//! Every call forwards the caller's bearer token. Adapters never retry.

pub mod http;
pub mod queue;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{CatalogProduct, Caller, Promotion};
use uuid::Uuid;

use crate::error::CollaboratorError;

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// A user as known to the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
}

/// A store as known to the store service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub store_id: Uuid,
    pub store_name: String,
    pub location: String,
}

/// Signed stock change reported to the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub branch_id: Uuid,
    pub company_id: Uuid,
    /// Negative for a sale.
    pub quantity: i32,
    pub date: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Authoritative role name for a role id.
    async fn role_name(&self, caller: &Caller, role_id: Uuid) -> CollaboratorResult<String>;

    async fn user(&self, caller: &Caller, user_id: Uuid) -> CollaboratorResult<UserProfile>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn product(&self, caller: &Caller, product_id: Uuid) -> CollaboratorResult<CatalogProduct>;
}

#[async_trait]
pub trait PromotionSource: Send + Sync {
    /// `Ok(None)` when the product has no promotion.
    async fn promotion_for(
        &self,
        caller: &Caller,
        product_id: Uuid,
    ) -> CollaboratorResult<Option<Promotion>>;
}

#[async_trait]
pub trait InventoryLedger: Send + Sync {
    async fn record_movement(&self, caller: &Caller, movement: &StockMovement) -> CollaboratorResult<()>;
}

#[async_trait]
pub trait ReceiptNumbering: Send + Sync {
    /// Next receipt id for the store. Ids are never reused.
    async fn next_receipt_id(&self, caller: &Caller, store_id: Uuid) -> CollaboratorResult<String>;
}

#[async_trait]
pub trait StoreDirectory: Send + Sync {
    async fn store(&self, caller: &Caller, store_id: Uuid) -> CollaboratorResult<StoreProfile>;
}

#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Enqueues one message. Success means the queue accepted it, not that
    /// it was delivered.
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> CollaboratorResult<()>;
}

/// Every collaborator the services need, behind trait objects.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityDirectory>,
    pub products: Arc<dyn ProductCatalog>,
    pub promotions: Arc<dyn PromotionSource>,
    pub inventory: Arc<dyn InventoryLedger>,
    pub numbering: Arc<dyn ReceiptNumbering>,
    pub stores: Arc<dyn StoreDirectory>,
    pub queue: Arc<dyn DeliveryQueue>,
}
