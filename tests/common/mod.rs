//! Shared fixtures for the refund engine integration tests.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use refund_engine::config::RefundConfig;
use refund_engine::events::Event;
use refund_engine::models::money::Money;
use refund_engine::models::order::{
    ChargeDetails, FeeLine, GatewayInfo, Order, OrderLineItem, OrderPayment, PaymentMethodType,
    ShippingLine,
};
use refund_engine::store_client::{
    AutoClientConfirmation, InMemoryStoreClient, StaticNetworkStatus,
};
use refund_engine::RefundEngine;

pub const GATEWAY_ID: &str = "store-payments";

/// Helper harness wiring the engine to an in-memory store with scriptable
/// collaborators.
pub struct TestEngine {
    pub engine: RefundEngine,
    pub store: Arc<InMemoryStoreClient>,
    pub network: Arc<StaticNetworkStatus>,
    pub confirmation: Arc<AutoClientConfirmation>,
    pub events: tokio::sync::mpsc::Receiver<Event>,
}

impl TestEngine {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStoreClient::new());
        store.seed_gateway(GatewayInfo {
            id: GATEWAY_ID.to_string(),
            title: "Store Payments".to_string(),
            is_enabled: true,
            supports_refunds: true,
        });

        let network = Arc::new(StaticNetworkStatus::new(true));
        let confirmation = Arc::new(AutoClientConfirmation::new());
        let (engine, events) = RefundEngine::new(
            RefundConfig::default(),
            store.clone(),
            network.clone(),
            confirmation.clone(),
        );

        Self {
            engine,
            store,
            network,
            confirmation,
            events,
        }
    }

    /// Drains currently queued events without blocking.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

pub struct OrderFixture {
    pub order: Order,
    pub item_ids: Vec<Uuid>,
    pub shipping_ids: Vec<Uuid>,
    pub fee_ids: Vec<Uuid>,
}

/// An order with `item_specs` line items given as
/// `(quantity, line_total, line_tax)`, plus optional shipping/fee lines.
pub fn build_order(
    item_specs: &[(i32, Money, Money)],
    shipping_specs: &[(Money, Money)],
    fee_specs: &[(Money, Money)],
    charge_id: Option<&str>,
) -> OrderFixture {
    let line_items: Vec<OrderLineItem> = item_specs
        .iter()
        .map(|(quantity, total, tax)| OrderLineItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Test product".to_string(),
            unit_price: Money::new(dec!(10.00)),
            quantity: *quantity,
            total: *total,
            total_tax: *tax,
        })
        .collect();

    let shipping_lines: Vec<ShippingLine> = shipping_specs
        .iter()
        .map(|(total, tax)| ShippingLine {
            id: Uuid::new_v4(),
            method_title: "Flat rate".to_string(),
            total: *total,
            total_tax: *tax,
        })
        .collect();

    let fee_lines: Vec<FeeLine> = fee_specs
        .iter()
        .map(|(total, tax)| FeeLine {
            id: Uuid::new_v4(),
            name: "Service fee".to_string(),
            total: *total,
            total_tax: *tax,
        })
        .collect();

    let order_total: Money = line_items
        .iter()
        .map(|i| i.total + i.total_tax)
        .chain(shipping_lines.iter().map(|l| l.total + l.total_tax))
        .chain(fee_lines.iter().map(|l| l.total + l.total_tax))
        .sum();

    let item_ids = line_items.iter().map(|i| i.id).collect();
    let shipping_ids = shipping_lines.iter().map(|l| l.id).collect();
    let fee_ids = fee_lines.iter().map(|l| l.id).collect();

    let order = Order {
        id: Uuid::new_v4(),
        number: "1042".to_string(),
        currency: "USD".to_string(),
        total: order_total,
        refund_total_to_date: Money::ZERO,
        line_items,
        shipping_lines,
        fee_lines,
        payment: OrderPayment {
            gateway_id: GATEWAY_ID.to_string(),
            gateway_title: "Store Payments".to_string(),
            charge_id: charge_id.map(str::to_string),
        },
        created_at: Utc::now(),
    };

    OrderFixture {
        order,
        item_ids,
        shipping_ids,
        fee_ids,
    }
}

/// Charge recorded as card-present Interac.
pub fn interac_charge(charge_id: &str) -> ChargeDetails {
    ChargeDetails {
        charge_id: charge_id.to_string(),
        method_type: PaymentMethodType::InteracPresent,
        card_brand: Some("interac".to_string()),
        card_last4: Some("0123".to_string()),
    }
}
