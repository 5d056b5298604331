// Core services
pub mod classifier;
pub mod reconciler;
pub mod refundable;
pub mod selection;
pub mod submission;
pub mod totals;

pub use classifier::{RefundMethod, RefundMethodClassifier};
pub use refundable::RemainingRefundable;
pub use selection::{RefundMode, RefundSelection, SelectionAction};
pub use submission::{RefundSubmissionService, SubmissionState, SubmitOutcome};
pub use totals::{LineTotals, RefundBreakdown};
