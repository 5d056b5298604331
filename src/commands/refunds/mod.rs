pub mod add_order_note_command;
pub mod create_amount_refund_command;
pub mod create_items_refund_command;

pub use add_order_note_command::AddOrderNoteCommand;
pub use create_amount_refund_command::CreateAmountRefundCommand;
pub use create_items_refund_command::CreateItemsRefundCommand;
