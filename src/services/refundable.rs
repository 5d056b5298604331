use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::models::order::Order;
use crate::models::refund::RefundRecord;

/// Per-line "remaining refundable" facts for one order, derived by diffing
/// the refund history against the original order.
///
/// Computed once per order load and immutable for the duration of a refund
/// session. Item quantities never go below zero; shipping and fee lines are
/// binary, refundable until any prior refund references them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemainingRefundable {
    item_quantities: HashMap<Uuid, i32>,
    refundable_shipping: BTreeSet<Uuid>,
    refundable_fees: BTreeSet<Uuid>,
}

impl RemainingRefundable {
    /// Quantity of `item_id` not yet covered by any prior refund. Unknown
    /// ids report zero remaining.
    pub fn max_quantity(&self, item_id: Uuid) -> i32 {
        self.item_quantities.get(&item_id).copied().unwrap_or(0)
    }

    pub fn is_shipping_refundable(&self, line_id: Uuid) -> bool {
        self.refundable_shipping.contains(&line_id)
    }

    pub fn is_fee_refundable(&self, line_id: Uuid) -> bool {
        self.refundable_fees.contains(&line_id)
    }

    /// Item ids with at least one refundable unit left.
    pub fn refundable_item_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.item_quantities
            .iter()
            .filter(|(_, qty)| **qty > 0)
            .map(|(id, _)| *id)
    }

    pub fn refundable_shipping_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.refundable_shipping.iter().copied()
    }

    pub fn refundable_fee_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.refundable_fees.iter().copied()
    }

    /// True when nothing on the order can still be refunded by items.
    pub fn is_exhausted(&self) -> bool {
        self.item_quantities.values().all(|qty| *qty <= 0)
            && self.refundable_shipping.is_empty()
            && self.refundable_fees.is_empty()
    }
}

/// Computes what remains refundable on `order` given its full refund
/// history.
///
/// Pure function: same inputs always produce the same output and nothing is
/// mutated. History entries referencing unknown item ids are ignored;
/// quantities saturate at zero.
pub fn resolve(order: &Order, history: &[RefundRecord]) -> RemainingRefundable {
    let mut item_quantities: HashMap<Uuid, i32> = order
        .line_items
        .iter()
        .map(|item| (item.id, item.quantity.max(0)))
        .collect();

    let mut refundable_shipping: BTreeSet<Uuid> =
        order.shipping_lines.iter().map(|l| l.id).collect();
    let mut refundable_fees: BTreeSet<Uuid> = order.fee_lines.iter().map(|l| l.id).collect();

    for refund in history {
        for entry in &refund.items {
            if let Some(remaining) = item_quantities.get_mut(&entry.item_id) {
                *remaining = remaining.saturating_sub(entry.quantity.max(0)).max(0);
            }
        }
        for line_id in &refund.shipping_line_ids {
            refundable_shipping.remove(line_id);
        }
        for line_id in &refund.fee_line_ids {
            refundable_fees.remove(line_id);
        }
    }

    RemainingRefundable {
        item_quantities,
        refundable_shipping,
        refundable_fees,
    }
}
