use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    errors::RefundError,
    events::{Event, EventSender},
    store_client::StoreClient,
};

/// Appends a note to an order. Best-effort from the refund flow: callers
/// treat a failure as log-and-continue, never as a refund failure.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddOrderNoteCommand {
    pub order_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub note: String,
    pub customer_visible: bool,
}

#[async_trait::async_trait]
impl Command for AddOrderNoteCommand {
    type Result = ();

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        store: Arc<dyn StoreClient>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, RefundError> {
        self.validate()
            .map_err(|e| RefundError::InvalidInput(format!("Invalid order note: {}", e)))?;

        match store
            .add_order_note(self.order_id, &self.note, self.customer_visible)
            .await
        {
            Ok(()) => {
                info!(order_id = %self.order_id, "Order note added");
                event_sender
                    .send_logged(Event::OrderNoteAdded {
                        order_id: self.order_id,
                    })
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to add note to order {}: {}", self.order_id, e);
                event_sender
                    .send_logged(Event::NoteAddFailed {
                        order_id: self.order_id,
                        reason: e.to_string(),
                    })
                    .await;
                Err(RefundError::ExternalService(e.to_string()))
            }
        }
    }
}
