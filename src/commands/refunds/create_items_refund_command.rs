use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::Command,
    errors::RefundError,
    events::{Event, EventSender},
    models::refund::{validate_payload_not_empty, ItemsRefundPayload, RefundRecord},
    store_client::StoreClient,
};

/// Submits an itemized refund: selected order items with prorated amounts
/// plus whole shipping/fee lines.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateItemsRefundCommand {
    pub order_id: Uuid,
    #[validate(length(max = 500))]
    pub reason: String,
    #[validate(custom = "validate_payload_not_empty")]
    pub payload: ItemsRefundPayload,
    /// Ask the gateway to move the money as part of this call.
    pub auto_gateway_refund: bool,
    /// Card-present Interac: the refund completes via a client-side
    /// confirmation rather than inside this call.
    pub requires_confirmation: bool,
}

#[async_trait::async_trait]
impl Command for CreateItemsRefundCommand {
    type Result = RefundRecord;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        store: Arc<dyn StoreClient>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, RefundError> {
        self.validate().map_err(|e| {
            let msg = format!("Invalid items refund: {}", e);
            error!("{}", msg);
            RefundError::Validation(msg)
        })?;

        let record = store
            .create_items_refund(
                self.order_id,
                &self.reason,
                &self.payload,
                self.auto_gateway_refund,
                self.requires_confirmation,
            )
            .await
            .map_err(|e| {
                error!("Items refund rejected for order {}: {}", self.order_id, e);
                RefundError::RefundRejected(e.to_string())
            })?;

        info!(
            order_id = %self.order_id,
            refund_id = %record.id,
            amount = %record.amount,
            "Items refund created"
        );

        event_sender
            .send_logged(Event::RefundCreated {
                order_id: self.order_id,
                refund_id: record.id,
                amount: record.amount,
            })
            .await;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::models::money::Money;
    use crate::models::refund::RefundItemInput;
    use crate::store_client::InMemoryStoreClient;
    use rust_decimal_macros::dec;

    fn payload() -> ItemsRefundPayload {
        ItemsRefundPayload {
            items: vec![RefundItemInput {
                item_id: Uuid::new_v4(),
                quantity: 1,
                refund_total: Money::new(dec!(10.00)),
                refund_tax: Money::new(dec!(1.00)),
            }],
            shipping_lines: vec![],
            fee_lines: vec![],
        }
    }

    #[tokio::test]
    async fn empty_payload_is_rejected_locally() {
        let store = Arc::new(InMemoryStoreClient::new());
        let (sender, _rx) = events::event_channel(4);

        let command = CreateItemsRefundCommand {
            order_id: Uuid::new_v4(),
            reason: String::new(),
            payload: ItemsRefundPayload::default(),
            auto_gateway_refund: true,
            requires_confirmation: false,
        };

        let result = command.execute(store.clone(), Arc::new(sender)).await;
        assert!(matches!(result, Err(RefundError::Validation(_))));
        // Nothing was dispatched.
        assert_eq!(store.refund_write_calls(), 0);
    }

    #[tokio::test]
    async fn successful_write_emits_refund_created() {
        let store = Arc::new(InMemoryStoreClient::new());
        let (sender, mut rx) = events::event_channel(4);
        let order_id = Uuid::new_v4();

        let command = CreateItemsRefundCommand {
            order_id,
            reason: "Damaged".to_string(),
            payload: payload(),
            auto_gateway_refund: true,
            requires_confirmation: false,
        };

        let record = command
            .execute(store.clone(), Arc::new(sender))
            .await
            .expect("refund");
        assert_eq!(record.amount, Money::new(dec!(11.00)));
        assert_eq!(store.refund_write_calls(), 1);
        assert!(matches!(
            rx.recv().await,
            Some(Event::RefundCreated { .. })
        ));
    }

    #[tokio::test]
    async fn store_rejection_maps_to_refund_rejected() {
        let store = Arc::new(InMemoryStoreClient::new());
        store.set_fail_refund_writes(true);
        let (sender, _rx) = events::event_channel(4);

        let command = CreateItemsRefundCommand {
            order_id: Uuid::new_v4(),
            reason: String::new(),
            payload: payload(),
            auto_gateway_refund: false,
            requires_confirmation: false,
        };

        let result = command.execute(store, Arc::new(sender)).await;
        assert!(matches!(result, Err(RefundError::RefundRejected(_))));
    }
}
