use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::money::Money;

/// Events published by the refund engine.
///
/// Observability only: nothing in the engine's control flow depends on an
/// event having been delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Submission lifecycle
    RefundSubmissionStarted {
        order_id: Uuid,
    },
    RefundCreated {
        order_id: Uuid,
        refund_id: Uuid,
        amount: Money,
    },
    RefundFailed {
        order_id: Uuid,
        reason: String,
    },
    /// Card-present Interac: the client-side money movement succeeded but
    /// the backend was not notified.
    InteracNotifyFailed {
        order_id: Uuid,
        reason: String,
    },

    // Order notes
    OrderNoteAdded {
        order_id: Uuid,
    },
    NoteAddFailed {
        order_id: Uuid,
        reason: String,
    },

    /// Generic event data
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging on failure instead of surfacing it. Used on
    /// paths where a dropped event must not change the submission outcome.
    pub async fn send_logged(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping engine event: {}", e);
        }
    }
}

/// Creates a bounded event channel and its sender.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains and logs events until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match event {
            Event::RefundSubmissionStarted { order_id } => {
                info!("Refund submission started for order {}", order_id);
            }
            Event::RefundCreated {
                order_id,
                refund_id,
                amount,
            } => {
                info!(
                    "Refund {} of {} created for order {}",
                    refund_id, amount, order_id
                );
            }
            Event::RefundFailed { order_id, reason } => {
                warn!("Refund failed for order {}: {}", order_id, reason);
            }
            Event::InteracNotifyFailed { order_id, reason } => {
                warn!(
                    "Interac refund completed on client but notify failed for order {}: {}",
                    order_id, reason
                );
            }
            Event::OrderNoteAdded { order_id } => {
                info!("Refund note added to order {}", order_id);
            }
            Event::NoteAddFailed { order_id, reason } => {
                // Logged only: the refund itself already succeeded.
                warn!("Note add failed for order {}: {}", order_id, reason);
            }
            Event::Generic { message, .. } => {
                info!("Engine event: {}", message);
            }
        }
    }

    warn!("Event processing loop has ended");
}
