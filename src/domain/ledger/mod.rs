// Investment ledger
// Positions, their transactions and sell requests

pub mod events;
pub mod position;
pub mod records;
pub mod value_objects;

pub use events::LedgerEvent;
pub use position::{Position, Settlement, MIN_PURCHASE_QUANTITY};
pub use records::{PaymentReceipt, SaleRequest, SellRequest, Transaction};
pub use value_objects::{
    PaymentProvider, PositionStatus, SellRequestStatus, TransactionStatus, TransactionType,
};
