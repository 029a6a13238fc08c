// In crates/execution/src/paper.rs

use crate::types::PaperFill;
use crate::{Error, OrderSubmitter, Result};
use async_trait::async_trait;
use core_types::{OrderRequest, OrderResult, Side};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fills every order locally, applying slippage against the order's side.
#[derive(Debug)]
pub struct PaperSubmitter {
    slippage: Decimal,
    next_id: AtomicU64,
    fills: Mutex<Vec<PaperFill>>,
}

impl PaperSubmitter {
    pub fn new(slippage_percent: f64) -> Result<Self> {
        let slippage = Decimal::from_f64(slippage_percent)
            .filter(|s| *s >= Decimal::ZERO && *s < dec!(1))
            .ok_or(Error::InvalidSlippage(slippage_percent))?;

        Ok(Self {
            slippage,
            next_id: AtomicU64::new(1),
            fills: Mutex::new(Vec::new()),
        })
    }

    pub fn fills(&self) -> Vec<PaperFill> {
        self.fills.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn fill_price(&self, order: &OrderRequest) -> Decimal {
        match order.side {
            // Buying, slippage makes the price worse (higher).
            Side::Buy => order.price * (dec!(1) + self.slippage),
            // Selling, slippage makes the price worse (lower).
            Side::Sell => order.price * (dec!(1) - self.slippage),
        }
    }
}

#[async_trait]
impl OrderSubmitter for PaperSubmitter {
    fn name(&self) -> &'static str {
        "PaperSubmitter"
    }

    async fn submit(&self, order: &OrderRequest) -> Result<OrderResult> {
        if order.price <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: format!("non-positive price {}", order.price),
            });
        }

        let order_id = format!("PAPER-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let fill_price = self.fill_price(order).round_dp(4);

        tracing::info!(
            order_id = %order_id,
            instrument = %order.instrument_id,
            side = %order.side,
            price = %fill_price,
            "Paper order filled."
        );

        self.fills.lock().unwrap_or_else(|e| e.into_inner()).push(PaperFill {
            order_id: order_id.clone(),
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            requested_price: order.price,
            fill_price,
        });

        Ok(OrderResult {
            order_id,
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            price: fill_price,
        })
    }
}
