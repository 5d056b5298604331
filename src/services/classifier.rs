use std::sync::Arc;
use strum::Display;
use tracing::{instrument, warn};

use crate::models::order::{GatewayInfo, Order, PaymentMethodType};
use crate::store_client::StoreClient;

/// How a refund for this order has to be carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum RefundMethod {
    /// The gateway moves the money when the refund is submitted.
    StandardGateway,
    /// Gateway disabled or without refund support: the refund is recorded
    /// against the order only, money moves offline.
    ManualOffline,
    /// Card-present Interac: money moves on the client terminal; the
    /// backend call is a completion notification.
    CardPresentInterac,
}

/// Classifies an order's payment into the branch the submission
/// orchestrator takes.
#[derive(Clone)]
pub struct RefundMethodClassifier {
    store: Arc<dyn StoreClient>,
}

impl RefundMethodClassifier {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Picks the refund method for `order`.
    ///
    /// A disabled or refund-incapable gateway is `ManualOffline` no matter
    /// what the charge says. With a charge id present, the recorded payment
    /// method decides between Interac and standard; a failed or
    /// inconclusive lookup falls back to `StandardGateway`; missing
    /// information never routes into the higher-friction Interac branch.
    #[instrument(skip(self, order, gateway), fields(order_id = %order.id))]
    pub async fn classify(&self, order: &Order, gateway: &GatewayInfo) -> RefundMethod {
        if !gateway.is_enabled || !gateway.supports_refunds {
            return RefundMethod::ManualOffline;
        }

        let Some(charge_id) = order.payment.charge_id.as_deref() else {
            return RefundMethod::StandardGateway;
        };

        match self.store.fetch_charge(charge_id).await {
            Ok(charge) if charge.method_type == PaymentMethodType::InteracPresent => {
                RefundMethod::CardPresentInterac
            }
            Ok(_) => RefundMethod::StandardGateway,
            Err(e) => {
                warn!(
                    "Charge lookup failed for order {}, defaulting to standard handling: {}",
                    order.id, e
                );
                RefundMethod::StandardGateway
            }
        }
    }
}
