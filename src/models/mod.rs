// Core models
pub mod money;
pub mod order;
pub mod refund;

pub use money::Money;
pub use order::{
    ChargeDetails, FeeLine, GatewayInfo, Order, OrderLineItem, OrderPayment, PaymentMethodType,
    ShippingLine,
};
pub use refund::{
    ItemsRefundPayload, RefundItemInput, RefundLineInput, RefundRecord, RefundedItem,
};
