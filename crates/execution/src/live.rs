// In crates/execution/src/live.rs

use crate::{OrderSubmitter, Result};
use api_client::ApiClient;
use async_trait::async_trait;
use core_types::{OrderRequest, OrderResult};

/// Places orders with the broker's REST API.
pub struct LiveSubmitter {
    api_client: ApiClient,
}

impl LiveSubmitter {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }
}

#[async_trait]
impl OrderSubmitter for LiveSubmitter {
    fn name(&self) -> &'static str {
        "LiveSubmitter"
    }

    async fn submit(&self, order: &OrderRequest) -> Result<OrderResult> {
        tracing::info!(
            instrument = %order.instrument_id,
            side = %order.side,
            price = %order.price,
            "Placing live order."
        );

        let response = self.api_client.place_order(order).await?;
        let order_id = response.order_id_string();
        tracing::info!(order_id = %order_id, status = ?response.status, "Live order acknowledged.");

        Ok(OrderResult {
            order_id,
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            price: order.price,
        })
    }
}
