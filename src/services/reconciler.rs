use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::money::Money;
use crate::models::order::Order;
use crate::services::selection::{RefundMode, RefundSelection};
use crate::services::totals;

/// Outcome of validating a free-form refund amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AmountValidation {
    Valid,
    TooHigh,
    TooLow,
}

/// What the caller should do with its validation surface after an input
/// change. Two-state toggle, no hysteresis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationTransition {
    /// Newly invalid (or invalid in a new way): show this error.
    Surface(AmountValidation),
    /// Was invalid, now valid: clear the surfaced error.
    Clear,
    NoChange,
}

/// The most the order can still refund: original total minus the refunds
/// already issued. Never negative.
pub fn max_refundable(order: &Order) -> Money {
    (order.total - order.refund_total_to_date).clamp_non_negative()
}

/// The one authoritative refund total, whichever entry mode is active.
///
/// Items mode derives it from the selection's aggregated breakdown;
/// amount mode uses the entered amount directly.
pub fn refund_total(order: &Order, selection: &RefundSelection) -> Money {
    match &selection.mode {
        RefundMode::Items(items) => totals::breakdown(order, items).grand_total(),
        RefundMode::Amount(entry) => entry.amount,
    }
}

/// Validates a by-amount entry against the refundable ceiling.
///
/// By-items selections are implicitly valid: quantities are pre-clamped to
/// remaining and line sets to refundable lines, so no equivalent check
/// exists for that mode.
pub fn validate_amount(amount: Money, max_refundable: Money) -> AmountValidation {
    if amount > max_refundable {
        AmountValidation::TooHigh
    } else if amount.is_zero() || amount.is_negative() {
        AmountValidation::TooLow
    } else {
        AmountValidation::Valid
    }
}

/// Computes the validation-surface transition between two inputs.
pub fn transition(previous: AmountValidation, current: AmountValidation) -> ValidationTransition {
    use AmountValidation::Valid;
    match (previous, current) {
        (Valid, Valid) => ValidationTransition::NoChange,
        (_, Valid) => ValidationTransition::Clear,
        (prev, next) if prev == next => ValidationTransition::NoChange,
        (_, next) => ValidationTransition::Surface(next),
    }
}

/// Gate for the flow's "next" action: the authoritative total must be a
/// valid refund amount for the order.
pub fn can_proceed(order: &Order, selection: &RefundSelection) -> bool {
    validate_amount(refund_total(order, selection), max_refundable(order)) == AmountValidation::Valid
}
