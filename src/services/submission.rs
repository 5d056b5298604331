use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use strum::Display;
use tracing::{info, instrument, warn};

use crate::commands::refunds::{
    AddOrderNoteCommand, CreateAmountRefundCommand, CreateItemsRefundCommand,
};
use crate::commands::Command;
use crate::config::RefundConfig;
use crate::errors::RefundError;
use crate::events::{Event, EventSender};
use crate::models::order::{GatewayInfo, Order};
use crate::models::refund::RefundRecord;
use crate::services::classifier::{RefundMethod, RefundMethodClassifier};
use crate::services::reconciler::{self, AmountValidation};
use crate::services::selection::{RefundMode, RefundSelection};
use crate::services::totals;
use crate::store_client::{ClientConfirmation, NetworkStatus, StoreClient};

/// Terminal result of one submission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum SubmissionResult {
    Success,
    Failure,
}

/// Where the orchestrator currently is. Both `Completed` states are
/// transient: the guard is released back to `Idle` before control returns
/// to the caller, so a retry is always possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum SubmissionState {
    Idle,
    Submitting,
    AwaitingInteracClientConfirmation,
    Completed(SubmissionResult),
}

/// What a call to [`RefundSubmissionService::submit`] produced.
#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(RefundRecord),
    /// Another submission was already in flight; nothing was dispatched.
    AlreadyInFlight,
}

/// Sequences one refund submission: lock, build payload, dispatch, branch
/// on payment-method class, record the result, release the lock.
///
/// At most one submission is in flight per service instance; a second
/// submit while one is running is a no-op. Selection input is expected to
/// be disabled by the caller while [`SubmissionState`] is not `Idle`;
/// [`is_in_flight`](Self::is_in_flight) is the boundary check.
pub struct RefundSubmissionService {
    store: Arc<dyn StoreClient>,
    event_sender: Arc<EventSender>,
    network: Arc<dyn NetworkStatus>,
    confirmation: Arc<dyn ClientConfirmation>,
    classifier: RefundMethodClassifier,
    config: RefundConfig,
    in_flight: AtomicBool,
    state: Mutex<SubmissionState>,
}

impl RefundSubmissionService {
    pub fn new(
        store: Arc<dyn StoreClient>,
        event_sender: Arc<EventSender>,
        network: Arc<dyn NetworkStatus>,
        confirmation: Arc<dyn ClientConfirmation>,
        config: RefundConfig,
    ) -> Self {
        let classifier = RefundMethodClassifier::new(store.clone());
        Self {
            store,
            event_sender,
            network,
            confirmation,
            classifier,
            config,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.lock_state()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one submission attempt for the given selection.
    ///
    /// Returns `AlreadyInFlight` without touching the backend when a
    /// previous attempt has not reached a terminal state yet. Otherwise
    /// exactly one backend refund write is dispatched and exactly one
    /// outcome (the returned value) is produced. The caller's selection
    /// is never consumed: on failure it can be resubmitted as-is.
    #[instrument(skip(self, order, gateway, selection), fields(order_id = %order.id))]
    pub async fn submit(
        &self,
        order: &Order,
        gateway: &GatewayInfo,
        selection: &RefundSelection,
    ) -> Result<SubmitOutcome, RefundError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Submission already in flight for order {}, ignoring", order.id);
            return Ok(SubmitOutcome::AlreadyInFlight);
        }

        let result = self.run_attempt(order, gateway, selection).await;

        match &result {
            Ok(record) => {
                self.set_state(SubmissionState::Completed(SubmissionResult::Success));
                info!(
                    order_id = %order.id,
                    refund_id = %record.id,
                    "Refund submission completed"
                );
            }
            Err(RefundError::InteracNotifyFailed(reason)) => {
                self.set_state(SubmissionState::Completed(SubmissionResult::Failure));
                self.event_sender
                    .send_logged(Event::InteracNotifyFailed {
                        order_id: order.id,
                        reason: reason.clone(),
                    })
                    .await;
            }
            Err(e) => {
                self.set_state(SubmissionState::Completed(SubmissionResult::Failure));
                self.event_sender
                    .send_logged(Event::RefundFailed {
                        order_id: order.id,
                        reason: e.to_string(),
                    })
                    .await;
            }
        }

        // Terminal states immediately hand the guard back so a retry after
        // failure is always possible.
        self.set_state(SubmissionState::Idle);
        self.in_flight.store(false, Ordering::Release);

        result.map(SubmitOutcome::Completed)
    }

    async fn run_attempt(
        &self,
        order: &Order,
        gateway: &GatewayInfo,
        selection: &RefundSelection,
    ) -> Result<RefundRecord, RefundError> {
        self.set_state(SubmissionState::Submitting);
        self.event_sender
            .send_logged(Event::RefundSubmissionStarted { order_id: order.id })
            .await;

        // Refused locally: an offline submission must not be attempted and
        // failed remotely.
        if !self.network.is_connected() {
            return Err(RefundError::NetworkUnavailable);
        }

        if selection.reason.len() as u64 > self.config.max_reason_length {
            return Err(RefundError::InvalidInput(format!(
                "Refund reason exceeds {} characters",
                self.config.max_reason_length
            )));
        }

        let total = reconciler::refund_total(order, selection);
        let validation = reconciler::validate_amount(total, reconciler::max_refundable(order));
        if validation != AmountValidation::Valid {
            return Err(RefundError::Validation(format!(
                "Refund total {} is {}",
                total, validation
            )));
        }

        let method = self.classifier.classify(order, gateway).await;
        let auto_gateway_refund = method == RefundMethod::StandardGateway;
        let interac = method == RefundMethod::CardPresentInterac;

        let record = self
            .dispatch(order, selection, auto_gateway_refund, interac)
            .await
            .map_err(|e| {
                if interac {
                    // The terminal already moved the money; this failure is
                    // only the backend not knowing about it.
                    RefundError::InteracNotifyFailed(e.to_string())
                } else {
                    e
                }
            })?;

        if interac {
            self.set_state(SubmissionState::AwaitingInteracClientConfirmation);
            self.confirmation
                .await_refund_confirmed(order.id)
                .await
                .map_err(|e| RefundError::InteracNotifyFailed(e.to_string()))?;
        }

        self.add_reason_note(order, selection, &record).await;

        Ok(record)
    }

    /// Builds the payload from the authoritative mode and dispatches the
    /// single backend write for this attempt.
    async fn dispatch(
        &self,
        order: &Order,
        selection: &RefundSelection,
        auto_gateway_refund: bool,
        requires_confirmation: bool,
    ) -> Result<RefundRecord, RefundError> {
        match &selection.mode {
            RefundMode::Items(items) => {
                let command = CreateItemsRefundCommand {
                    order_id: order.id,
                    reason: selection.reason.clone(),
                    payload: totals::items_refund_payload(order, items),
                    auto_gateway_refund,
                    requires_confirmation,
                };
                command
                    .execute(self.store.clone(), self.event_sender.clone())
                    .await
            }
            RefundMode::Amount(entry) => {
                let command = CreateAmountRefundCommand {
                    order_id: order.id,
                    amount: entry.amount,
                    reason: selection.reason.clone(),
                    auto_gateway_refund,
                };
                command
                    .execute(self.store.clone(), self.event_sender.clone())
                    .await
            }
        }
    }

    /// Best-effort reason note. Failure is tracked through events only and
    /// never rolls back or fails the refund.
    async fn add_reason_note(
        &self,
        order: &Order,
        selection: &RefundSelection,
        record: &RefundRecord,
    ) {
        let reason = selection.reason.trim();
        if reason.is_empty() {
            return;
        }

        let command = AddOrderNoteCommand {
            order_id: order.id,
            note: format!("Refunded: {} - Reason: {}", record.amount, reason),
            customer_visible: self.config.customer_visible_notes,
        };
        if let Err(e) = command
            .execute(self.store.clone(), self.event_sender.clone())
            .await
        {
            warn!("Refund note skipped for order {}: {}", order.id, e);
        }
    }

    fn set_state(&self, state: SubmissionState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SubmissionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
