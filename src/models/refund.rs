use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::money::Money;
use crate::models::order::validate_money_non_negative;

/// One previously completed refund against an order. Immutable history:
/// a record is created by a successful submission and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct RefundRecord {
    pub id: Uuid,

    pub order_id: Uuid,

    /// Total amount this refund returned to the customer.
    #[validate(custom = "validate_money_non_negative")]
    pub amount: Money,

    pub reason: Option<String>,

    pub date_created: DateTime<Utc>,

    /// Item entries this refund covered.
    #[validate]
    pub items: Vec<RefundedItem>,

    /// Shipping lines this refund covered, by id.
    pub shipping_line_ids: Vec<Uuid>,

    /// Fee lines this refund covered, by id.
    pub fee_line_ids: Vec<Uuid>,

    /// Whether the gateway moved the money automatically.
    pub automatic_gateway_refund: bool,
}

/// A refunded portion of one order line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct RefundedItem {
    /// Order line item this entry reconciles against.
    pub item_id: Uuid,

    pub quantity: i32,

    #[validate(custom = "validate_money_non_negative")]
    pub subtotal: Money,

    #[validate(custom = "validate_money_non_negative")]
    pub total_tax: Money,
}

/// One product line of an itemized refund submission, with amounts
/// prorated from the original line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct RefundItemInput {
    pub item_id: Uuid,

    pub quantity: i32,

    #[validate(custom = "validate_money_non_negative")]
    pub refund_total: Money,

    #[validate(custom = "validate_money_non_negative")]
    pub refund_tax: Money,
}

/// One shipping or fee line of an itemized refund submission. These are
/// binary: the whole line total and tax are refunded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct RefundLineInput {
    pub line_id: Uuid,

    #[validate(custom = "validate_money_non_negative")]
    pub refund_total: Money,

    #[validate(custom = "validate_money_non_negative")]
    pub refund_tax: Money,
}

/// Full payload of an itemized refund submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ItemsRefundPayload {
    #[validate]
    pub items: Vec<RefundItemInput>,

    #[validate]
    pub shipping_lines: Vec<RefundLineInput>,

    #[validate]
    pub fee_lines: Vec<RefundLineInput>,
}

impl ItemsRefundPayload {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.shipping_lines.is_empty() && self.fee_lines.is_empty()
    }

    /// Sum of every amount in the payload, at full precision.
    pub fn total(&self) -> Money {
        let items: Money = self
            .items
            .iter()
            .map(|i| i.refund_total + i.refund_tax)
            .sum();
        let shipping: Money = self
            .shipping_lines
            .iter()
            .map(|l| l.refund_total + l.refund_tax)
            .sum();
        let fees: Money = self
            .fee_lines
            .iter()
            .map(|l| l.refund_total + l.refund_tax)
            .sum();
        items + shipping + fees
    }
}

/// Validator used by commands: an itemized payload must cover something.
pub(crate) fn validate_payload_not_empty(
    payload: &ItemsRefundPayload,
) -> Result<(), ValidationError> {
    if payload.is_empty() {
        return Err(ValidationError::new("Refund payload covers no lines"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn payload_total_sums_every_bucket() {
        let payload = ItemsRefundPayload {
            items: vec![RefundItemInput {
                item_id: Uuid::new_v4(),
                quantity: 1,
                refund_total: Money::new(dec!(10.00)),
                refund_tax: Money::new(dec!(1.00)),
            }],
            shipping_lines: vec![RefundLineInput {
                line_id: Uuid::new_v4(),
                refund_total: Money::new(dec!(5.00)),
                refund_tax: Money::new(dec!(0.50)),
            }],
            fee_lines: vec![RefundLineInput {
                line_id: Uuid::new_v4(),
                refund_total: Money::new(dec!(2.00)),
                refund_tax: Money::new(dec!(0.20)),
            }],
        };

        assert_eq!(payload.total(), Money::new(dec!(18.70)));
        assert!(!payload.is_empty());
    }

    #[test]
    fn empty_payload_fails_validation() {
        let payload = ItemsRefundPayload::default();
        assert!(payload.is_empty());
        assert!(validate_payload_not_empty(&payload).is_err());
    }

    #[test]
    fn refund_record_validation() {
        let record = RefundRecord {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            amount: Money::new(dec!(-1.00)),
            reason: Some("Damaged in transit".to_string()),
            date_created: Utc::now(),
            items: vec![],
            shipping_line_ids: vec![],
            fee_line_ids: vec![],
            automatic_gateway_refund: true,
        };
        assert!(record.validate().is_err());
    }
}
