//! Receipt Publisher: JSON receipt onto the delivery queue.

use std::sync::Arc;

use tally_core::DigitalReceipt;
use tracing::info;

use crate::collaborators::DeliveryQueue;
use crate::error::{CollaboratorError, SalesResult};

#[derive(Clone)]
pub struct ReceiptPublisher {
    queue: Arc<dyn DeliveryQueue>,
    queue_name: String,
}

impl ReceiptPublisher {
    pub fn new(queue: Arc<dyn DeliveryQueue>, queue_name: impl Into<String>) -> Self {
        Self {
            queue,
            queue_name: queue_name.into(),
        }
    }

    pub async fn publish(&self, receipt: &DigitalReceipt) -> SalesResult<()> {
        let payload = receipt.to_payload().map_err(|e| CollaboratorError::Encode {
            service: "delivery queue",
            reason: e.to_string(),
        })?;

        self.queue.publish(&self.queue_name, payload).await?;

        info!(
            queue = %self.queue_name,
            receipt_id = %receipt.receipt_header.receipt_id,
            "Receipt queued"
        );
        Ok(())
    }
}
