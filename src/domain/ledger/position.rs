use super::events::LedgerEvent;
use super::value_objects::{PositionStatus, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Smallest number of units a user may buy through a gateway checkout
pub const MIN_PURCHASE_QUANTITY: i32 = 10;

/// Outcome of settling an approved sale against a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Units remain; the position is kept
    Reduced,
    /// Nothing remains; the position must be deleted
    Closed,
}

/// Position aggregate root ("user investment")
///
/// Tracks the units a user holds in one investment opportunity.
/// There is at most one position per (user, opportunity) pair.
///
/// # Invariants
/// - `quantity >= 0`
/// - `0 <= sell_request_quantity <= quantity`
/// - `purchase_price` is the total cost basis of the units held
/// - Status only moves forward (see [`PositionStatus::can_transition_to`])
///
/// # Example
/// ```
/// use agrotrade_api::domain::ledger::Position;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let (mut position, _) = Position::open(Uuid::new_v4(), Uuid::new_v4());
/// position.credit(10, Decimal::from(15000)).expect("valid credit");
///
/// assert_eq!(position.quantity(), 10);
/// assert_eq!(position.available_quantity(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    id: Uuid,
    user_id: Uuid,
    opportunity_id: Uuid,
    quantity: i32,
    purchase_price: Decimal,
    total_investment: i32,
    sell_request_quantity: i32,
    status: PositionStatus,
    transaction_type: TransactionType,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Position {
    /// Opens an empty, pending position for a checkout that has not been paid yet
    ///
    /// # Returns
    /// The new position and the `Opened` event
    pub fn open(user_id: Uuid, opportunity_id: Uuid) -> (Self, LedgerEvent) {
        let now = Utc::now();
        let position = Self {
            id: Uuid::new_v4(),
            user_id,
            opportunity_id,
            quantity: 0,
            purchase_price: Decimal::ZERO,
            total_investment: 0,
            sell_request_quantity: 0,
            status: PositionStatus::Pending,
            transaction_type: TransactionType::Deposit,
            created_at: now,
            updated_at: now,
        };

        let event = LedgerEvent::Opened {
            position_id: position.id,
            user_id,
            opportunity_id,
        };

        (position, event)
    }

    /// Rebuilds a position from stored columns
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        user_id: Uuid,
        opportunity_id: Uuid,
        quantity: i32,
        purchase_price: Decimal,
        total_investment: i32,
        sell_request_quantity: i32,
        status: PositionStatus,
        transaction_type: TransactionType,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            opportunity_id,
            quantity,
            purchase_price,
            total_investment,
            sell_request_quantity,
            status,
            transaction_type,
            created_at,
            updated_at,
        }
    }

    /// Applies a confirmed purchase
    ///
    /// # Arguments
    /// * `quantity` - Units bought (must be positive)
    /// * `amount` - Money paid for those units (must not be negative)
    ///
    /// # Business Rules
    /// - Adds units and cost basis
    /// - Counts one more confirmed purchase
    /// - Marks the position completed
    pub fn credit(&mut self, quantity: i32, amount: Decimal) -> Result<LedgerEvent, String> {
        if quantity <= 0 {
            return Err("Quantity must be greater than 0".to_string());
        }
        if amount < Decimal::ZERO {
            return Err("Amount cannot be negative".to_string());
        }
        let next_status = PositionStatus::Completed;
        if !self.status.can_transition_to(next_status) {
            return Err(format!("Cannot credit position in {:?} status", self.status));
        }
        let new_quantity = self
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| "Quantity is too large".to_string())?;

        self.quantity = new_quantity;
        self.purchase_price += amount;
        self.total_investment += 1;
        self.status = next_status;
        self.transaction_type = TransactionType::Deposit;
        self.updated_at = Utc::now();

        Ok(LedgerEvent::Credited {
            position_id: self.id,
            quantity,
            amount,
        })
    }

    /// Sets units aside for a pending sell request
    ///
    /// # Business Rules
    /// - Only completed positions can be sold
    /// - Cannot reserve more than the unreserved quantity
    pub fn reserve(&mut self, quantity: i32) -> Result<LedgerEvent, String> {
        if quantity <= 0 {
            return Err("Quantity must be greater than 0".to_string());
        }
        if self.status != PositionStatus::Completed {
            return Err("Investment has not been paid for".to_string());
        }
        if quantity > self.available_quantity() {
            return Err(format!(
                "You can only sell up to {} units of this product",
                self.available_quantity()
            ));
        }

        self.sell_request_quantity += quantity;
        self.updated_at = Utc::now();

        Ok(LedgerEvent::Reserved {
            position_id: self.id,
            quantity,
        })
    }

    /// Removes sold units after an admin approves a sell request
    ///
    /// The cost basis shrinks in proportion to the units that leave and the
    /// reservation made by [`Position::reserve`] is released.
    ///
    /// # Returns
    /// * `Ok((Settlement::Closed, _))` - no units left, delete the position
    /// * `Ok((Settlement::Reduced, _))` - units remain
    /// * `Err(String)` - the sale would take the position below zero
    pub fn settle_sale(&mut self, quantity: i32) -> Result<(Settlement, LedgerEvent), String> {
        if quantity <= 0 {
            return Err("Quantity must be greater than 0".to_string());
        }
        if quantity > self.quantity {
            return Err("Product quantity cannot be less than 0".to_string());
        }

        let remaining = self.quantity - quantity;
        self.purchase_price = if remaining == 0 {
            Decimal::ZERO
        } else {
            (self.purchase_price * Decimal::from(remaining) / Decimal::from(self.quantity))
                .round_dp(2)
        };
        self.quantity = remaining;
        self.sell_request_quantity = (self.sell_request_quantity - quantity).clamp(0, remaining);
        self.transaction_type = TransactionType::Cashout;
        self.updated_at = Utc::now();

        let settlement = if remaining == 0 {
            Settlement::Closed
        } else {
            Settlement::Reduced
        };

        Ok((
            settlement,
            LedgerEvent::Settled {
                position_id: self.id,
                quantity,
                closed: settlement == Settlement::Closed,
            },
        ))
    }

    /// True when a failed payment should remove the position
    pub fn is_abandoned_checkout(&self) -> bool {
        self.status == PositionStatus::Pending && self.total_investment == 0
    }

    /// Units that are not reserved by a pending sell request
    pub fn available_quantity(&self) -> i32 {
        self.quantity - self.sell_request_quantity
    }

    /// A completed deposit position counts as an active investment
    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Completed
            && self.transaction_type == TransactionType::Deposit
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn opportunity_id(&self) -> Uuid {
        self.opportunity_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }

    pub fn total_investment(&self) -> i32 {
        self.total_investment
    }

    pub fn sell_request_quantity(&self) -> i32 {
        self.sell_request_quantity
    }

    pub fn status(&self) -> PositionStatus {
        self.status
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
