use rust_decimal::Decimal;
use uuid::Uuid;

/// Ledger movements produced by the [`Position`](super::Position) aggregate
///
/// Handlers log these after the repository commits the change.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    /// A checkout opened a new, still unpaid position
    Opened {
        position_id: Uuid,
        user_id: Uuid,
        opportunity_id: Uuid,
    },
    /// A confirmed payment added units to the position
    Credited {
        position_id: Uuid,
        quantity: i32,
        amount: Decimal,
    },
    /// A sell request set units aside until an admin decides
    Reserved { position_id: Uuid, quantity: i32 },
    /// An approved sale removed units; `closed` when nothing is left
    Settled {
        position_id: Uuid,
        quantity: i32,
        closed: bool,
    },
}

impl LedgerEvent {
    pub fn position_id(&self) -> Uuid {
        match self {
            LedgerEvent::Opened { position_id, .. } => *position_id,
            LedgerEvent::Credited { position_id, .. } => *position_id,
            LedgerEvent::Reserved { position_id, .. } => *position_id,
            LedgerEvent::Settled { position_id, .. } => *position_id,
        }
    }
}
