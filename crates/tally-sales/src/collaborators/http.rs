//! reqwest adapters for the HTTP collaborators.
//!
//! Every response is wrapped in the envelope
//! `{ "status": bool, "message": string, "data": {...} }`. Monetary numbers
//! are taken as decimal text and converted to cents without floats.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tally_core::{CatalogProduct, Caller, DiscountRate, Money, Promotion};
use tracing::debug;
use uuid::Uuid;

use super::{
    CollaboratorResult, Collaborators, DeliveryQueue, IdentityDirectory, InventoryLedger,
    ProductCatalog, PromotionSource, ReceiptNumbering, StockMovement, StoreDirectory, StoreProfile,
    UserProfile,
};
use crate::config::ServiceUrls;
use crate::error::CollaboratorError;

/// Shared client with the configured per-request timeout.
pub fn build_client(timeout: Duration) -> CollaboratorResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CollaboratorError::Transport {
            service: "http client",
            reason: e.to_string(),
        })
}

/// Wires every HTTP collaborator plus the given delivery queue.
pub fn http_collaborators(
    urls: &ServiceUrls,
    http: reqwest::Client,
    queue: Arc<dyn DeliveryQueue>,
) -> Collaborators {
    let stores = Arc::new(HttpStoreService::new(ServiceClient::new(
        "store service",
        &urls.store,
        http.clone(),
    )));

    Collaborators {
        identity: Arc::new(HttpIdentityDirectory::new(ServiceClient::new(
            "identity service",
            &urls.identity,
            http.clone(),
        ))),
        products: Arc::new(HttpProductCatalog::new(ServiceClient::new(
            "product service",
            &urls.product,
            http.clone(),
        ))),
        promotions: Arc::new(HttpPromotionSource::new(ServiceClient::new(
            "promotion service",
            &urls.promotion,
            http.clone(),
        ))),
        inventory: Arc::new(HttpInventoryLedger::new(ServiceClient::new(
            "inventory service",
            &urls.inventory,
            http,
        ))),
        numbering: stores.clone(),
        stores,
        queue,
    }
}

// =============================================================================
// Service Client
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default = "default_status")]
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

fn default_status() -> bool {
    true
}

/// One remote service: base URL plus the shared reqwest client.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl ServiceClient {
    pub fn new(service: &'static str, base_url: &str, http: reqwest::Client) -> Self {
        ServiceClient {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport(&self, err: reqwest::Error) -> CollaboratorError {
        CollaboratorError::Transport {
            service: self.service,
            reason: err.to_string(),
        }
    }

    fn decode(&self, reason: impl ToString) -> CollaboratorError {
        CollaboratorError::Decode {
            service: self.service,
            reason: reason.to_string(),
        }
    }

    fn not_found(&self, what: &'static str, id: impl ToString) -> CollaboratorError {
        CollaboratorError::NotFound {
            service: self.service,
            what,
            id: id.to_string(),
        }
    }

    /// GET returning the envelope's `data`; `None` on 404.
    async fn get_data(&self, caller: &Caller, path: &str) -> CollaboratorResult<Option<Value>> {
        let url = self.url(path);
        debug!(service = self.service, url = %url, "GET");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&caller.token)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = resp.json().await.map_err(|e| self.decode(e))?;
        self.open(envelope).map(Some)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        caller: &Caller,
        path: &str,
        body: &B,
    ) -> CollaboratorResult<()> {
        let url = self.url(path);
        debug!(service = self.service, url = %url, "POST");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&caller.token)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn open(&self, envelope: Envelope) -> CollaboratorResult<Value> {
        if !envelope.status {
            return Err(CollaboratorError::Rejected {
                service: self.service,
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| self.decode("response has no data"))
    }

    fn field<T: DeserializeOwned>(&self, data: Value) -> CollaboratorResult<T> {
        serde_json::from_value(data).map_err(|e| self.decode(e))
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// A JSON number or string kept as its decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumberText(String);

impl<'de> Deserialize<'de> for NumberText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(NumberText(n.to_string())),
            Value::String(s) => Ok(NumberText(s.trim().to_string())),
            other => Err(de::Error::custom(format!("expected a number, got {}", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProductData {
    pos_product: WireProduct,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    product_id: Uuid,
    product_name: String,
    price: NumberText,
}

#[derive(Debug, Deserialize)]
struct PromotionData {
    pos_promotion: WirePromotion,
}

#[derive(Debug, Deserialize)]
struct WirePromotion {
    #[serde(default)]
    promotion_id: Option<Uuid>,
    product_id: Uuid,
    discount_rate: NumberText,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreData {
    pos_store: StoreProfile,
}

#[derive(Debug, Deserialize)]
struct ReceiptNumberData {
    receipt_id: NumberText,
}

#[derive(Debug, Deserialize)]
struct RoleData {
    pos_role: WireRole,
}

#[derive(Debug, Deserialize)]
struct WireRole {
    role_name: String,
}

#[derive(Debug, Deserialize)]
struct UserData {
    pos_user: UserProfile,
}

#[derive(Debug, Serialize)]
struct InventoryRequest<'a> {
    pos_inventory_history: &'a StockMovement,
    jwt_token: &'a str,
}

/// `YYYY-MM-DD`, tolerating a trailing time part. Blank means unbounded.
fn parse_day(text: Option<&str>) -> Result<Option<NaiveDate>, String> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| format!("bad date '{}': {}", text, e))
}

fn to_product(wire: WireProduct) -> Result<CatalogProduct, String> {
    let price = Money::parse_decimal(&wire.price.0).map_err(|e| e.to_string())?;
    Ok(CatalogProduct {
        product_id: wire.product_id,
        name: wire.product_name,
        price,
    })
}

fn to_promotion(wire: WirePromotion) -> Result<Promotion, String> {
    let discount_rate =
        DiscountRate::parse_fraction(&wire.discount_rate.0).map_err(|e| e.to_string())?;
    Ok(Promotion {
        promotion_id: wire.promotion_id,
        product_id: wire.product_id,
        discount_rate,
        active: wire.active,
        start_date: parse_day(wire.start_date.as_deref())?,
        end_date: parse_day(wire.end_date.as_deref())?,
    })
}

// =============================================================================
// Adapters
// =============================================================================

pub struct HttpProductCatalog {
    client: ServiceClient,
}

impl HttpProductCatalog {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn product(&self, caller: &Caller, product_id: Uuid) -> CollaboratorResult<CatalogProduct> {
        let path = format!("/api/v1/products/pos_product_barcode/{}", product_id);
        let data = self
            .client
            .get_data(caller, &path)
            .await?
            .ok_or_else(|| self.client.not_found("product", product_id))?;
        let wire: ProductData = self.client.field(data)?;
        to_product(wire.pos_product).map_err(|e| self.client.decode(e))
    }
}

pub struct HttpPromotionSource {
    client: ServiceClient,
}

impl HttpPromotionSource {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PromotionSource for HttpPromotionSource {
    async fn promotion_for(
        &self,
        caller: &Caller,
        product_id: Uuid,
    ) -> CollaboratorResult<Option<Promotion>> {
        let path = format!("/api/v1/promotions/pos_promotion/by_product/{}", product_id);
        let Some(data) = self.client.get_data(caller, &path).await? else {
            return Ok(None);
        };
        let wire: PromotionData = self.client.field(data)?;
        to_promotion(wire.pos_promotion)
            .map(Some)
            .map_err(|e| self.client.decode(e))
    }
}

pub struct HttpInventoryLedger {
    client: ServiceClient,
}

impl HttpInventoryLedger {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InventoryLedger for HttpInventoryLedger {
    async fn record_movement(&self, caller: &Caller, movement: &StockMovement) -> CollaboratorResult<()> {
        let body = InventoryRequest {
            pos_inventory_history: movement,
            jwt_token: &caller.token,
        };
        self.client
            .post_json(caller, "/api/v1/inventory-histories/pos_inventory_history", &body)
            .await
    }
}

/// Store profiles and receipt numbering live in the same service.
pub struct HttpStoreService {
    client: ServiceClient,
}

impl HttpStoreService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReceiptNumbering for HttpStoreService {
    async fn next_receipt_id(&self, caller: &Caller, store_id: Uuid) -> CollaboratorResult<String> {
        let path = format!("/api/v1/stores/pos_store/{}/next_receipt_id", store_id);
        let data = self
            .client
            .get_data(caller, &path)
            .await?
            .ok_or_else(|| self.client.not_found("store", store_id))?;
        let wire: ReceiptNumberData = self.client.field(data)?;
        if wire.receipt_id.0.is_empty() {
            return Err(self.client.decode("empty receipt id"));
        }
        Ok(wire.receipt_id.0)
    }
}

#[async_trait]
impl StoreDirectory for HttpStoreService {
    async fn store(&self, caller: &Caller, store_id: Uuid) -> CollaboratorResult<StoreProfile> {
        let path = format!("/api/v1/stores/pos_store/{}", store_id);
        let data = self
            .client
            .get_data(caller, &path)
            .await?
            .ok_or_else(|| self.client.not_found("store", store_id))?;
        let wire: StoreData = self.client.field(data)?;
        Ok(wire.pos_store)
    }
}

pub struct HttpIdentityDirectory {
    client: ServiceClient,
}

impl HttpIdentityDirectory {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn role_name(&self, caller: &Caller, role_id: Uuid) -> CollaboratorResult<String> {
        let path = format!("/api/v1/roles/pos_role/{}", role_id);
        let data = self
            .client
            .get_data(caller, &path)
            .await?
            .ok_or_else(|| self.client.not_found("role", role_id))?;
        let wire: RoleData = self.client.field(data)?;
        Ok(wire.pos_role.role_name)
    }

    async fn user(&self, caller: &Caller, user_id: Uuid) -> CollaboratorResult<UserProfile> {
        let path = format!("/api/v1/users/pos_user/{}", user_id);
        let data = self
            .client
            .get_data(caller, &path)
            .await?
            .ok_or_else(|| self.client.not_found("user", user_id))?;
        let wire: UserData = self.client.field(data)?;
        Ok(wire.pos_user)
    }
}
