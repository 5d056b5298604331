use crate::{errors::RefundError, events::EventSender, store_client::StoreClient};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// Encapsulates one backend write (validation, the store call, and the
/// events it produces) into a single executable object.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `store` - Client for the commerce backend
    /// * `event_sender` - Channel to publish domain events
    ///
    /// # Returns
    /// * `Result<Self::Result, RefundError>` - The result of command execution or an error
    async fn execute(
        &self,
        store: Arc<dyn StoreClient>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, RefundError>;
}

pub mod refunds;
