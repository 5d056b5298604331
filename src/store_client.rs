/*!
 * # Store Client
 *
 * The narrow read/write contract the refund engine has with the remote
 * commerce backend. The engine never talks to a transport directly; a host
 * application provides a `StoreClient` implementation, plus the small
 * `NetworkStatus` and `ClientConfirmation` collaborators used by the
 * submission path.
 */

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::money::Money;
use crate::models::order::{ChargeDetails, GatewayInfo, Order};
use crate::models::refund::{ItemsRefundPayload, RefundRecord, RefundedItem};

/// Store client errors
#[derive(Error, Debug)]
pub enum StoreClientError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Read/write contract with the commerce backend.
///
/// Write calls must be treated as non-idempotent; the submission
/// orchestrator guarantees at most one refund write per logical attempt.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn fetch_order(&self, order_id: Uuid) -> Result<Order, StoreClientError>;

    async fn fetch_refund_history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RefundRecord>, StoreClientError>;

    async fn fetch_payment_gateway(&self, order: &Order) -> Result<GatewayInfo, StoreClientError>;

    /// Looks up the recorded payment method for a charge. Used for display
    /// enrichment and Interac classification only.
    async fn fetch_charge(&self, charge_id: &str) -> Result<ChargeDetails, StoreClientError>;

    async fn create_items_refund(
        &self,
        order_id: Uuid,
        reason: &str,
        payload: &ItemsRefundPayload,
        auto_gateway_refund: bool,
        requires_confirmation: bool,
    ) -> Result<RefundRecord, StoreClientError>;

    async fn create_amount_refund(
        &self,
        order_id: Uuid,
        amount: Money,
        reason: &str,
        auto_gateway_refund: bool,
    ) -> Result<RefundRecord, StoreClientError>;

    /// Best-effort from the engine's perspective: a failure here never
    /// rolls back a refund.
    async fn add_order_note(
        &self,
        order_id: Uuid,
        note: &str,
        customer_visible: bool,
    ) -> Result<(), StoreClientError>;
}

/// Connectivity probe checked before any submission is attempted.
pub trait NetworkStatus: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Client-side completion signal for card-present Interac refunds. The
/// money movement happens on the client terminal; this signal reports
/// whether that completed.
#[async_trait]
pub trait ClientConfirmation: Send + Sync {
    async fn await_refund_confirmed(&self, order_id: Uuid) -> Result<(), StoreClientError>;
}

/// Fixed-state connectivity probe.
#[derive(Debug)]
pub struct StaticNetworkStatus {
    connected: AtomicBool,
}

impl StaticNetworkStatus {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl NetworkStatus for StaticNetworkStatus {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Confirmation source that resolves immediately, with a switchable
/// failure mode.
#[derive(Debug, Default)]
pub struct AutoClientConfirmation {
    fail: AtomicBool,
}

impl AutoClientConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientConfirmation for AutoClientConfirmation {
    async fn await_refund_confirmed(&self, order_id: Uuid) -> Result<(), StoreClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreClientError::Network(format!(
                "Client confirmation lost for order {}",
                order_id
            )));
        }
        Ok(())
    }
}

/// In-memory store client.
///
/// Reference implementation backing the integration tests: orders,
/// gateways and charges are seeded up front; refunds and notes accumulate
/// as writes land. Failure switches let tests script backend rejections.
#[derive(Debug, Default)]
pub struct InMemoryStoreClient {
    orders: Mutex<HashMap<Uuid, Order>>,
    refunds: Mutex<HashMap<Uuid, Vec<RefundRecord>>>,
    gateways: Mutex<HashMap<String, GatewayInfo>>,
    charges: Mutex<HashMap<String, ChargeDetails>>,
    notes: Mutex<Vec<(Uuid, String, bool)>>,
    fail_refund_writes: AtomicBool,
    fail_note_writes: AtomicBool,
    refund_write_calls: AtomicU32,
}

impl InMemoryStoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_order(&self, order: Order) {
        self.lock(&self.orders).insert(order.id, order);
    }

    pub fn seed_gateway(&self, gateway: GatewayInfo) {
        self.lock(&self.gateways).insert(gateway.id.clone(), gateway);
    }

    pub fn seed_charge(&self, charge: ChargeDetails) {
        self.lock(&self.charges)
            .insert(charge.charge_id.clone(), charge);
    }

    pub fn seed_refund(&self, refund: RefundRecord) {
        self.lock(&self.refunds)
            .entry(refund.order_id)
            .or_default()
            .push(refund);
    }

    pub fn set_fail_refund_writes(&self, fail: bool) {
        self.fail_refund_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_note_writes(&self, fail: bool) {
        self.fail_note_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of refund write calls received, successful or not.
    pub fn refund_write_calls(&self) -> u32 {
        self.refund_write_calls.load(Ordering::SeqCst)
    }

    pub fn notes_for(&self, order_id: Uuid) -> Vec<(String, bool)> {
        self.lock(&self.notes)
            .iter()
            .filter(|(id, _, _)| *id == order_id)
            .map(|(_, note, visible)| (note.clone(), *visible))
            .collect()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_refund_write(&self) -> Result<(), StoreClientError> {
        self.refund_write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refund_writes.load(Ordering::SeqCst) {
            return Err(StoreClientError::Rejected(
                "Refund rejected by store".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for InMemoryStoreClient {
    async fn fetch_order(&self, order_id: Uuid) -> Result<Order, StoreClientError> {
        self.lock(&self.orders)
            .get(&order_id)
            .cloned()
            .ok_or_else(|| StoreClientError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn fetch_refund_history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<RefundRecord>, StoreClientError> {
        Ok(self
            .lock(&self.refunds)
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_payment_gateway(&self, order: &Order) -> Result<GatewayInfo, StoreClientError> {
        self.lock(&self.gateways)
            .get(&order.payment.gateway_id)
            .cloned()
            .ok_or_else(|| {
                StoreClientError::NotFound(format!(
                    "Gateway {} not found",
                    order.payment.gateway_id
                ))
            })
    }

    async fn fetch_charge(&self, charge_id: &str) -> Result<ChargeDetails, StoreClientError> {
        self.lock(&self.charges)
            .get(charge_id)
            .cloned()
            .ok_or_else(|| StoreClientError::NotFound(format!("Charge {} not found", charge_id)))
    }

    async fn create_items_refund(
        &self,
        order_id: Uuid,
        reason: &str,
        payload: &ItemsRefundPayload,
        auto_gateway_refund: bool,
        _requires_confirmation: bool,
    ) -> Result<RefundRecord, StoreClientError> {
        self.record_refund_write()?;

        let record = RefundRecord {
            id: Uuid::new_v4(),
            order_id,
            amount: payload.total(),
            reason: if reason.trim().is_empty() {
                None
            } else {
                Some(reason.to_string())
            },
            date_created: Utc::now(),
            items: payload
                .items
                .iter()
                .map(|i| RefundedItem {
                    item_id: i.item_id,
                    quantity: i.quantity,
                    subtotal: i.refund_total,
                    total_tax: i.refund_tax,
                })
                .collect(),
            shipping_line_ids: payload.shipping_lines.iter().map(|l| l.line_id).collect(),
            fee_line_ids: payload.fee_lines.iter().map(|l| l.line_id).collect(),
            automatic_gateway_refund: auto_gateway_refund,
        };
        self.lock(&self.refunds)
            .entry(order_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn create_amount_refund(
        &self,
        order_id: Uuid,
        amount: Money,
        reason: &str,
        auto_gateway_refund: bool,
    ) -> Result<RefundRecord, StoreClientError> {
        self.record_refund_write()?;

        let record = RefundRecord {
            id: Uuid::new_v4(),
            order_id,
            amount,
            reason: if reason.trim().is_empty() {
                None
            } else {
                Some(reason.to_string())
            },
            date_created: Utc::now(),
            items: vec![],
            shipping_line_ids: vec![],
            fee_line_ids: vec![],
            automatic_gateway_refund: auto_gateway_refund,
        };
        self.lock(&self.refunds)
            .entry(order_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn add_order_note(
        &self,
        order_id: Uuid,
        note: &str,
        customer_visible: bool,
    ) -> Result<(), StoreClientError> {
        if self.fail_note_writes.load(Ordering::SeqCst) {
            return Err(StoreClientError::Network(
                "Note write failed".to_string(),
            ));
        }
        self.lock(&self.notes)
            .push((order_id, note.to_string(), customer_visible));
        Ok(())
    }
}
