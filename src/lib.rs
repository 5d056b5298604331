//! Refund Engine Library
//!
//! Partial-refund computation and submission for storefront order
//! management: resolves how much of an order remains refundable, aggregates
//! a user's selection into one authoritative total, and drives the refund
//! submission state machine against a pluggable commerce backend.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod store_client;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::RefundConfig;
use crate::errors::RefundError;
use crate::events::{Event, EventSender};
use crate::models::money::Money;
use crate::models::order::{ChargeDetails, GatewayInfo, Order};
use crate::services::reconciler;
use crate::services::refundable::{self, RemainingRefundable};
use crate::services::selection::{reduce, RefundSelection, SelectionAction};
use crate::services::submission::{RefundSubmissionService, SubmitOutcome};
use crate::store_client::{ClientConfirmation, NetworkStatus, StoreClient};

/// One interactive refund session over a loaded order.
///
/// `remaining` is computed once at load and stays fixed for the session's
/// lifetime; `selection` evolves through [`RefundEngine::apply_selection`].
#[derive(Clone, Debug)]
pub struct RefundSession {
    pub order: Order,
    pub gateway: GatewayInfo,
    pub remaining: RemainingRefundable,
    pub selection: RefundSelection,
}

impl RefundSession {
    /// The authoritative refund total for the current selection.
    pub fn refund_total(&self) -> Money {
        reconciler::refund_total(&self.order, &self.selection)
    }

    pub fn max_refundable(&self) -> Money {
        reconciler::max_refundable(&self.order)
    }

    /// Whether the flow's "next" action should be enabled.
    pub fn can_proceed(&self) -> bool {
        reconciler::can_proceed(&self.order, &self.selection)
    }
}

/// Engine state wiring config, the backend client, events and the
/// submission service together for a consumer.
#[derive(Clone)]
pub struct RefundEngine {
    pub config: RefundConfig,
    store: Arc<dyn StoreClient>,
    event_sender: Arc<EventSender>,
    submission: Arc<RefundSubmissionService>,
}

impl RefundEngine {
    /// Builds the engine and returns the receiving end of its event
    /// channel. Callers typically hand the receiver to
    /// [`events::process_events`] or drain it themselves.
    pub fn new(
        config: RefundConfig,
        store: Arc<dyn StoreClient>,
        network: Arc<dyn NetworkStatus>,
        confirmation: Arc<dyn ClientConfirmation>,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (event_sender, receiver) = events::event_channel(config.event_channel_capacity);
        let event_sender = Arc::new(event_sender);
        let submission = Arc::new(RefundSubmissionService::new(
            store.clone(),
            event_sender.clone(),
            network,
            confirmation,
            config.clone(),
        ));

        (
            Self {
                config,
                store,
                event_sender,
                submission,
            },
            receiver,
        )
    }

    pub fn event_sender(&self) -> Arc<EventSender> {
        self.event_sender.clone()
    }

    pub fn submission(&self) -> Arc<RefundSubmissionService> {
        self.submission.clone()
    }

    /// Loads everything a refund session needs: the order, its refund
    /// history and gateway metadata, with the remaining-refundable facts
    /// resolved from the history.
    #[instrument(skip(self))]
    pub async fn load_session(&self, order_id: Uuid) -> Result<RefundSession, RefundError> {
        let order = self.store.fetch_order(order_id).await?;
        let history = self.store.fetch_refund_history(order_id).await?;
        let gateway = self.store.fetch_payment_gateway(&order).await?;
        let remaining = refundable::resolve(&order, &history);

        Ok(RefundSession {
            order,
            gateway,
            remaining,
            selection: RefundSelection::default(),
        })
    }

    /// Charge details for display enrichment (card brand, last digits).
    /// Display-only: any failure degrades to `None`.
    pub async fn charge_details(&self, order: &Order) -> Option<ChargeDetails> {
        let charge_id = order.payment.charge_id.as_deref()?;
        self.store.fetch_charge(charge_id).await.ok()
    }

    /// Formats an amount at the configured currency scale. The only place
    /// an amount is rounded.
    pub fn format_amount(&self, amount: Money) -> String {
        amount.format(self.config.currency_decimals)
    }

    /// Applies one selection action to the session.
    ///
    /// Input is refused while a submission is in flight: mutations between
    /// `Submitting` and a terminal state are dropped at this boundary
    /// rather than by locking the selection itself.
    pub fn apply_selection(&self, session: &mut RefundSession, action: SelectionAction) {
        if self.submission.is_in_flight() {
            debug!("Selection input ignored while a submission is in flight");
            return;
        }
        session.selection = reduce(&session.selection, action, &session.remaining);
    }

    /// Submits the session's current selection.
    pub async fn submit(&self, session: &RefundSession) -> Result<SubmitOutcome, RefundError> {
        self.submission
            .submit(&session.order, &session.gateway, &session.selection)
            .await
    }
}

pub mod prelude {
    pub use crate::config::RefundConfig;
    pub use crate::errors::RefundError;
    pub use crate::events::{Event, EventSender};
    pub use crate::models::*;
    pub use crate::services::*;
    pub use crate::store_client::{
        ClientConfirmation, NetworkStatus, StoreClient, StoreClientError,
    };
    pub use crate::{RefundEngine, RefundSession};
}
