use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    commands::Command,
    errors::RefundError,
    events::{Event, EventSender},
    models::money::Money,
    models::refund::RefundRecord,
    store_client::StoreClient,
};

/// Submits a free-form amount refund with a reason.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateAmountRefundCommand {
    pub order_id: Uuid,
    #[validate(custom = "validate_amount_positive")]
    pub amount: Money,
    #[validate(length(max = 500))]
    pub reason: String,
    pub auto_gateway_refund: bool,
}

fn validate_amount_positive(amount: &Money) -> Result<(), ValidationError> {
    if amount.is_zero() || amount.is_negative() {
        return Err(ValidationError::new("Refund amount must be positive"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl Command for CreateAmountRefundCommand {
    type Result = RefundRecord;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        store: Arc<dyn StoreClient>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, RefundError> {
        self.validate().map_err(|e| {
            let msg = format!("Invalid amount refund: {}", e);
            error!("{}", msg);
            RefundError::Validation(msg)
        })?;

        let record = store
            .create_amount_refund(
                self.order_id,
                self.amount,
                &self.reason,
                self.auto_gateway_refund,
            )
            .await
            .map_err(|e| {
                error!("Amount refund rejected for order {}: {}", self.order_id, e);
                RefundError::RefundRejected(e.to_string())
            })?;

        info!(
            order_id = %self.order_id,
            refund_id = %record.id,
            amount = %record.amount,
            "Amount refund created"
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
