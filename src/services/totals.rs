use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::money::Money;
use crate::models::order::{Order, OrderLineItem};
use crate::models::refund::{ItemsRefundPayload, RefundItemInput, RefundLineInput};
use crate::services::selection::ItemsSelection;

/// Subtotal and tax of one selected bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub subtotal: Money,
    pub tax: Money,
}

impl LineTotals {
    pub fn total(&self) -> Money {
        self.subtotal + self.tax
    }
}

/// Per-bucket totals for the current selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBreakdown {
    pub products: LineTotals,
    pub shipping: LineTotals,
    pub fees: LineTotals,
}

impl RefundBreakdown {
    /// Grand total across all buckets, clamped at zero. Negative composites
    /// are not reachable through the reducer; the clamp holds regardless.
    pub fn grand_total(&self) -> Money {
        (self.products.total() + self.shipping.total() + self.fees.total()).clamp_non_negative()
    }
}

/// Prorates one line item's refund amounts for `selected_quantity` units.
///
/// Amounts come from the line's original total and tax, scaled by
/// `selected / ordered`, so a line-level discount baked into the total is
/// preserved proportionally. `unit_price * quantity` would lose it.
pub fn item_totals(item: &OrderLineItem, selected_quantity: i32) -> LineTotals {
    let selected = selected_quantity.clamp(0, item.quantity.max(0));
    LineTotals {
        subtotal: item.total.prorate(selected, item.quantity),
        tax: item.total_tax.prorate(selected, item.quantity),
    }
}

/// Sums the totals of exactly the selected shipping lines. No proration:
/// shipping lines are refunded whole.
pub fn shipping_totals(order: &Order, selected: &BTreeSet<Uuid>) -> LineTotals {
    order
        .shipping_lines
        .iter()
        .filter(|line| selected.contains(&line.id))
        .fold(LineTotals::default(), |acc, line| LineTotals {
            subtotal: acc.subtotal + line.total,
            tax: acc.tax + line.total_tax,
        })
}

/// Sums the totals of exactly the selected fee lines.
pub fn fee_totals(order: &Order, selected: &BTreeSet<Uuid>) -> LineTotals {
    order
        .fee_lines
        .iter()
        .filter(|line| selected.contains(&line.id))
        .fold(LineTotals::default(), |acc, line| LineTotals {
            subtotal: acc.subtotal + line.total,
            tax: acc.tax + line.total_tax,
        })
}

/// Full per-bucket breakdown for an items-mode selection.
pub fn breakdown(order: &Order, selection: &ItemsSelection) -> RefundBreakdown {
    let products = selection
        .quantities
        .iter()
        .filter_map(|(item_id, quantity)| {
            order.line_item(*item_id).map(|item| item_totals(item, *quantity))
        })
        .fold(LineTotals::default(), |acc, line| LineTotals {
            subtotal: acc.subtotal + line.subtotal,
            tax: acc.tax + line.tax,
        });

    RefundBreakdown {
        products,
        shipping: shipping_totals(order, &selection.shipping_lines),
        fees: fee_totals(order, &selection.fee_lines),
    }
}

/// Converts an items-mode selection into the submission payload: product
/// lines with prorated amounts, shipping/fee lines as whole-line entries.
pub fn items_refund_payload(order: &Order, selection: &ItemsSelection) -> ItemsRefundPayload {
    let items = selection
        .quantities
        .iter()
        .filter_map(|(item_id, quantity)| {
            order.line_item(*item_id).map(|item| {
                let totals = item_totals(item, *quantity);
                RefundItemInput {
                    item_id: *item_id,
                    quantity: (*quantity).clamp(0, item.quantity.max(0)),
                    refund_total: totals.subtotal,
                    refund_tax: totals.tax,
                }
            })
        })
        .collect();

    let shipping_lines = order
        .shipping_lines
        .iter()
        .filter(|line| selection.shipping_lines.contains(&line.id))
        .map(|line| RefundLineInput {
            line_id: line.id,
            refund_total: line.total,
            refund_tax: line.total_tax,
        })
        .collect();

    let fee_lines = order
        .fee_lines
        .iter()
        .filter(|line| selection.fee_lines.contains(&line.id))
        .map(|line| RefundLineInput {
            line_id: line.id,
            refund_total: line.total,
            refund_tax: line.total_tax,
        })
        .collect();

    ItemsRefundPayload {
        items,
        shipping_lines,
        fee_lines,
    }
}
