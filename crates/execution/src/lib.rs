// In crates/execution/src/lib.rs

use async_trait::async_trait;
use core_types::{OrderRequest, OrderResult};

pub mod error;
pub mod live;
pub mod paper;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use live::LiveSubmitter;
pub use paper::PaperSubmitter;
pub use types::PaperFill;

/// The order collaborator.
///
/// A submitter takes an accepted decision's `OrderRequest` and hands it to a
/// target, which could be a live broker or a paper ledger. The decision gate
/// guarantees at most one `submit` call is in progress at a time.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// The name of the submitter (e.g., "PaperSubmitter", "LiveSubmitter").
    fn name(&self) -> &'static str;

    async fn submit(&self, order: &OrderRequest) -> Result<OrderResult>;
}
