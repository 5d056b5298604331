use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store_client::StoreClientError;

/// Error taxonomy for the refund engine.
///
/// Exactly one of these is surfaced per submission attempt. Validation
/// errors are local and recoverable and are never sent to the backend;
/// `InteracNotifyFailed` is deliberately distinct from `RefundRejected`
/// because for card-present Interac the money has already moved
/// client-side and only the backend notification failed.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum RefundError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Refund rejected: {0}")]
    RefundRejected(String),

    #[error("Refund completed on client but backend notification failed: {0}")]
    InteracNotifyFailed(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Event error: {0}")]
    EventError(String),
}

impl RefundError {
    /// True when the form should be re-enabled for another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RefundError::Validation(_) | RefundError::InvalidInput(_)
        )
    }
}

impl From<StoreClientError> for RefundError {
    fn from(err: StoreClientError) -> Self {
        match err {
            StoreClientError::NotFound(msg) => RefundError::NotFound(msg),
            StoreClientError::Rejected(msg) => RefundError::RefundRejected(msg),
            StoreClientError::Network(msg) | StoreClientError::Serialization(msg) => {
                RefundError::ExternalService(msg)
            }
        }
    }
}
