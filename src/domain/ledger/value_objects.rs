use serde::{Deserialize, Serialize};

/// Lifecycle of a position
///
/// # Status Transitions
/// ```text
/// Pending -> Completed -> Completed (further confirmed purchases)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "position_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    /// Checkout started, no confirmed payment yet
    Pending,
    /// At least one payment has been confirmed
    Completed,
}

impl PositionStatus {
    /// # Example
    /// ```
    /// use agrotrade_api::domain::ledger::PositionStatus;
    ///
    /// assert!(PositionStatus::Pending.can_transition_to(PositionStatus::Completed));
    /// assert!(!PositionStatus::Completed.can_transition_to(PositionStatus::Pending));
    /// ```
    pub fn can_transition_to(&self, next: PositionStatus) -> bool {
        use PositionStatus::*;
        matches!((self, next), (Pending, Completed) | (Completed, Completed))
    }
}

/// Direction of money for a transaction, and the last movement of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "PascalCase")]
pub enum TransactionType {
    Deposit,
    Cashout,
}

/// State of a ledger transaction
///
/// ```text
/// Invested
/// SellApprovalPending -> Sold
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    #[serde(rename = "Invested")]
    Invested,
    #[serde(rename = "Sell Approval Pending")]
    SellApprovalPending,
    #[serde(rename = "Sold")]
    Sold,
}

impl TransactionStatus {
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::SellApprovalPending, TransactionStatus::Sold)
        )
    }
}

/// Admin decision state of a sell request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sell_request_status", rename_all = "lowercase")]
#[serde(rename_all = "PascalCase")]
pub enum SellRequestStatus {
    Pending,
    Approved,
}

impl SellRequestStatus {
    pub fn can_transition_to(&self, next: SellRequestStatus) -> bool {
        matches!(
            (self, next),
            (SellRequestStatus::Pending, SellRequestStatus::Approved)
        )
    }
}

/// Gateway used to pay for a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Paystack,
    Flutterwave,
}

impl PaymentProvider {
    pub fn parse(value: &str) -> Option<PaymentProvider> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paystack" => Some(PaymentProvider::Paystack),
            "flutterwave" => Some(PaymentProvider::Flutterwave),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Paystack => "paystack",
            PaymentProvider::Flutterwave => "flutterwave",
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
