use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::money::Money;

/// One purchased product entry on an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderLineItem {
    /// Unique identifier for the line within its order.
    pub id: Uuid,

    /// Product the line refers to.
    pub product_id: Uuid,

    /// Product name as sold.
    #[validate(length(min = 1, message = "Item name cannot be empty"))]
    pub name: String,

    /// Price per unit before line-level discounts.
    #[validate(custom = "validate_money_non_negative")]
    pub unit_price: Money,

    /// Quantity ordered.
    pub quantity: i32,

    /// Line total with any line-level discount already applied.
    #[validate(custom = "validate_money_non_negative")]
    pub total: Money,

    /// Tax charged on the line total.
    #[validate(custom = "validate_money_non_negative")]
    pub total_tax: Money,
}

/// A shipping charge on an order. Refunded whole or not at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShippingLine {
    pub id: Uuid,

    /// Shipping method shown to the customer.
    pub method_title: String,

    #[validate(custom = "validate_money_non_negative")]
    pub total: Money,

    #[validate(custom = "validate_money_non_negative")]
    pub total_tax: Money,
}

/// A fee charge on an order. Refunded whole or not at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct FeeLine {
    pub id: Uuid,

    pub name: String,

    #[validate(custom = "validate_money_non_negative")]
    pub total: Money,

    #[validate(custom = "validate_money_non_negative")]
    pub total_tax: Money,
}

/// Payment identifiers recorded on the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderPayment {
    pub gateway_id: String,

    pub gateway_title: String,

    /// Present only when the payment processor recorded a charge.
    pub charge_id: Option<String>,
}

/// An order as loaded from the store, with its line collections and the
/// cumulative refund total already issued against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Order {
    pub id: Uuid,

    /// Customer-facing order number.
    pub number: String,

    /// ISO 4217 code, used for display formatting only.
    pub currency: String,

    /// Original order total.
    #[validate(custom = "validate_money_non_negative")]
    pub total: Money,

    /// Sum of all refunds already issued against this order.
    #[validate(custom = "validate_money_non_negative")]
    pub refund_total_to_date: Money,

    #[validate]
    pub line_items: Vec<OrderLineItem>,

    #[validate]
    pub shipping_lines: Vec<ShippingLine>,

    #[validate]
    pub fee_lines: Vec<FeeLine>,

    pub payment: OrderPayment,

    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn line_item(&self, item_id: Uuid) -> Option<&OrderLineItem> {
        self.line_items.iter().find(|i| i.id == item_id)
    }

    pub fn shipping_line(&self, line_id: Uuid) -> Option<&ShippingLine> {
        self.shipping_lines.iter().find(|l| l.id == line_id)
    }

    pub fn fee_line(&self, line_id: Uuid) -> Option<&FeeLine> {
        self.fee_lines.iter().find(|l| l.id == line_id)
    }
}

/// Gateway metadata fetched alongside the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub id: String,
    pub title: String,
    pub is_enabled: bool,
    pub supports_refunds: bool,
}

/// Payment method recorded on a charge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethodType {
    CardPresent,
    InteracPresent,
    Other,
}

/// Charge details, used for display enrichment and method classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeDetails {
    pub charge_id: String,
    pub method_type: PaymentMethodType,
    pub card_brand: Option<String>,
    pub card_last4: Option<String>,
}

/// Custom validator for money fields to ensure they are non-negative.
pub(crate) fn validate_money_non_negative(value: &Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        return Err(ValidationError::new("Amount must be non-negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line_item(quantity: i32, total: Money, tax: Money) -> OrderLineItem {
        OrderLineItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Blue T-Shirt".to_string(),
            unit_price: Money::new(dec!(10.00)),
            quantity,
            total,
            total_tax: tax,
        }
    }

    #[test]
    fn validation_rejects_negative_money() {
        let item = line_item(2, Money::new(dec!(-20.00)), Money::new(dec!(2.00)));
        assert!(item.validate().is_err());

        let ok = line_item(2, Money::new(dec!(20.00)), Money::new(dec!(2.00)));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn line_lookup_by_id() {
        let item = line_item(1, Money::new(dec!(10.00)), Money::new(dec!(1.00)));
        let item_id = item.id;
        let order = Order {
            id: Uuid::new_v4(),
            number: "1042".to_string(),
            currency: "USD".to_string(),
            total: Money::new(dec!(11.00)),
            refund_total_to_date: Money::ZERO,
            line_items: vec![item],
            shipping_lines: vec![],
            fee_lines: vec![],
            payment: OrderPayment {
                gateway_id: "stripe".to_string(),
                gateway_title: "Stripe".to_string(),
                charge_id: None,
            },
            created_at: Utc::now(),
        };

        assert!(order.line_item(item_id).is_some());
        assert!(order.line_item(Uuid::new_v4()).is_none());
        assert!(order.shipping_line(Uuid::new_v4()).is_none());
    }

    #[test]
    fn payment_method_type_display() {
        assert_eq!(
            PaymentMethodType::InteracPresent.to_string(),
            "interac_present"
        );
        assert_eq!(PaymentMethodType::CardPresent.to_string(), "card_present");
    }
}
