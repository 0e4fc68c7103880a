//! Pricing Resolver: catalog price plus the product's promotion, if any.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_core::pricing::price_line;
use tally_core::{Caller, PricedLine};
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::{ProductCatalog, PromotionSource};
use crate::error::SalesResult;

#[derive(Clone)]
pub struct PricingResolver {
    products: Arc<dyn ProductCatalog>,
    promotions: Arc<dyn PromotionSource>,
}

impl PricingResolver {
    pub fn new(products: Arc<dyn ProductCatalog>, promotions: Arc<dyn PromotionSource>) -> Self {
        Self {
            products,
            promotions,
        }
    }

    /// Prices `quantity` units of a product for a sale made on `day`.
    ///
    /// A missing promotion means no discount. Any other failure of either
    /// service is returned.
    pub async fn price(
        &self,
        caller: &Caller,
        product_id: Uuid,
        quantity: i32,
        day: NaiveDate,
    ) -> SalesResult<PricedLine> {
        let product = self.products.product(caller, product_id).await?;
        let promotion = self.promotions.promotion_for(caller, product_id).await?;

        if promotion.is_none() {
            info!(product_id = %product_id, "No promotion for product");
        }

        let line = price_line(&product, promotion.as_ref(), quantity, day);
        debug!(
            product_id = %product_id,
            unit_price = %line.unit_price,
            unit_discount = %line.unit_discount,
            line_total = %line.line_total,
            "Priced line"
        );
        Ok(line)
    }
}
