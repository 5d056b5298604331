use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::models::money::Money;
use crate::services::refundable::RemainingRefundable;

/// Item-mode selection: chosen quantities per line item plus the sets of
/// whole shipping/fee lines to refund.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsSelection {
    pub quantities: HashMap<Uuid, i32>,
    pub shipping_lines: BTreeSet<Uuid>,
    pub fee_lines: BTreeSet<Uuid>,
}

impl ItemsSelection {
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty() && self.shipping_lines.is_empty() && self.fee_lines.is_empty()
    }

    pub fn quantity_for(&self, item_id: Uuid) -> i32 {
        self.quantities.get(&item_id).copied().unwrap_or(0)
    }
}

/// Amount-mode entry: a single free-form total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountEntry {
    pub amount: Money,
}

/// Which entry mode is authoritative. Exactly one holds data at a time;
/// there is no shadow copy of the inactive mode to keep in sync.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RefundMode {
    Items(ItemsSelection),
    Amount(AmountEntry),
}

/// The user's current refund selection. Mutated only through [`reduce`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefundSelection {
    pub mode: RefundMode,
    pub reason: String,
}

impl RefundSelection {
    /// Fresh by-items selection, the flow's starting mode.
    pub fn by_items() -> Self {
        Self {
            mode: RefundMode::Items(ItemsSelection::default()),
            reason: String::new(),
        }
    }

    /// Fresh by-amount selection.
    pub fn by_amount() -> Self {
        Self {
            mode: RefundMode::Amount(AmountEntry::default()),
            reason: String::new(),
        }
    }

    pub fn items(&self) -> Option<&ItemsSelection> {
        match &self.mode {
            RefundMode::Items(items) => Some(items),
            RefundMode::Amount(_) => None,
        }
    }

    pub fn entered_amount(&self) -> Option<Money> {
        match &self.mode {
            RefundMode::Items(_) => None,
            RefundMode::Amount(entry) => Some(entry.amount),
        }
    }
}

impl Default for RefundSelection {
    fn default() -> Self {
        Self::by_items()
    }
}

/// A single user interaction with the refund form.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionAction {
    /// Set the chosen quantity for one item; clamped to what remains.
    SetItemQuantity { item_id: Uuid, quantity: i32 },
    ToggleShippingLine(Uuid),
    ToggleFeeLine(Uuid),
    /// Replace the free-form amount (by-amount mode only).
    EnterAmount(Money),
    SetReason(String),
    SwitchToItems,
    SwitchToAmount,
}

/// Applies one action to a selection snapshot, producing the next snapshot.
///
/// Pure: the previous snapshot is untouched. Quantities are clamped to
/// `[0, remaining]`; lines with nothing left to refund are not selectable;
/// actions belonging to the inactive mode leave the snapshot unchanged.
pub fn reduce(
    selection: &RefundSelection,
    action: SelectionAction,
    remaining: &RemainingRefundable,
) -> RefundSelection {
    let mut next = selection.clone();

    match action {
        SelectionAction::SetItemQuantity { item_id, quantity } => {
            if let RefundMode::Items(items) = &mut next.mode {
                let clamped = quantity.clamp(0, remaining.max_quantity(item_id));
                if clamped == 0 {
                    items.quantities.remove(&item_id);
                } else {
                    items.quantities.insert(item_id, clamped);
                }
            }
        }
        SelectionAction::ToggleShippingLine(line_id) => {
            if let RefundMode::Items(items) = &mut next.mode {
                if items.shipping_lines.contains(&line_id) {
                    items.shipping_lines.remove(&line_id);
                } else if remaining.is_shipping_refundable(line_id) {
                    items.shipping_lines.insert(line_id);
                }
            }
        }
        SelectionAction::ToggleFeeLine(line_id) => {
            if let RefundMode::Items(items) = &mut next.mode {
                if items.fee_lines.contains(&line_id) {
                    items.fee_lines.remove(&line_id);
                } else if remaining.is_fee_refundable(line_id) {
                    items.fee_lines.insert(line_id);
                }
            }
        }
        SelectionAction::EnterAmount(amount) => {
            if let RefundMode::Amount(entry) = &mut next.mode {
                entry.amount = amount;
            }
        }
        SelectionAction::SetReason(reason) => {
            next.reason = reason;
        }
        SelectionAction::SwitchToItems => {
            if !matches!(next.mode, RefundMode::Items(_)) {
                next.mode = RefundMode::Items(ItemsSelection::default());
            }
        }
        SelectionAction::SwitchToAmount => {
            if !matches!(next.mode, RefundMode::Amount(_)) {
                next.mode = RefundMode::Amount(AmountEntry::default());
            }
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::Money;
    use crate::models::order::{Order, OrderLineItem, OrderPayment};
    use crate::services::refundable;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn remaining_with_item(item_id: Uuid, quantity: i32) -> RemainingRefundable {
        let order = Order {
            id: Uuid::new_v4(),
            number: "1".to_string(),
            currency: "USD".to_string(),
            total: Money::new(dec!(50.00)),
            refund_total_to_date: Money::ZERO,
            line_items: vec![OrderLineItem {
                id: item_id,
                product_id: Uuid::new_v4(),
                name: "Widget".to_string(),
                unit_price: Money::new(dec!(10.00)),
                quantity,
                total: Money::new(dec!(50.00)),
                total_tax: Money::ZERO,
            }],
            shipping_lines: vec![],
            fee_lines: vec![],
            payment: OrderPayment {
                gateway_id: "g".to_string(),
                gateway_title: "G".to_string(),
                charge_id: None,
            },
            created_at: Utc::now(),
        };
        refundable::resolve(&order, &[])
    }

    #[test]
    fn quantity_is_clamped_to_remaining() {
        let item_id = Uuid::new_v4();
        let remaining = remaining_with_item(item_id, 2);
        let selection = RefundSelection::by_items();

        let next = reduce(
            &selection,
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 5,
            },
            &remaining,
        );
        assert_eq!(next.items().expect("items mode").quantity_for(item_id), 2);
    }

    #[test]
    fn zero_quantity_clears_the_entry() {
        let item_id = Uuid::new_v4();
        let remaining = remaining_with_item(item_id, 2);
        let selection = reduce(
            &RefundSelection::by_items(),
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 1,
            },
            &remaining,
        );

        let next = reduce(
            &selection,
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 0,
            },
            &remaining,
        );
        assert!(next.items().expect("items mode").quantities.is_empty());
    }

    #[test]
    fn exhausted_item_is_not_selectable() {
        let item_id = Uuid::new_v4();
        let remaining = remaining_with_item(Uuid::new_v4(), 2);

        let next = reduce(
            &RefundSelection::by_items(),
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 1,
            },
            &remaining,
        );
        assert_eq!(next.items().expect("items mode").quantity_for(item_id), 0);
    }

    #[test]
    fn amount_entry_ignored_in_items_mode() {
        let remaining = remaining_with_item(Uuid::new_v4(), 1);
        let selection = RefundSelection::by_items();

        let next = reduce(
            &selection,
            SelectionAction::EnterAmount(Money::new(dec!(5.00))),
            &remaining,
        );
        assert_eq!(next, selection);
    }

    #[test]
    fn mode_switch_resets_to_default_state() {
        let item_id = Uuid::new_v4();
        let remaining = remaining_with_item(item_id, 2);
        let selection = reduce(
            &RefundSelection::by_items(),
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 2,
            },
            &remaining,
        );

        let amount_mode = reduce(&selection, SelectionAction::SwitchToAmount, &remaining);
        assert_eq!(amount_mode.entered_amount(), Some(Money::ZERO));

        let back = reduce(&amount_mode, SelectionAction::SwitchToItems, &remaining);
        assert!(back.items().expect("items mode").is_empty());
    }

    #[test]
    fn switching_to_current_mode_is_a_noop() {
        let item_id = Uuid::new_v4();
        let remaining = remaining_with_item(item_id, 2);
        let selection = reduce(
            &RefundSelection::by_items(),
            SelectionAction::SetItemQuantity {
                item_id,
                quantity: 1,
            },
            &remaining,
        );

        let next = reduce(&selection, SelectionAction::SwitchToItems, &remaining);
        assert_eq!(next, selection);
    }

    #[test]
    fn reason_applies_in_either_mode() {
        let remaining = remaining_with_item(Uuid::new_v4(), 1);
        let next = reduce(
            &RefundSelection::by_amount(),
            SelectionAction::SetReason("Damaged box".to_string()),
            &remaining,
        );
        assert_eq!(next.reason, "Damaged box");
    }
}
