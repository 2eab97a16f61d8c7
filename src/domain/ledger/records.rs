use super::value_objects::{SellRequestStatus, TransactionStatus, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Money movement recorded for an account
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub opportunity_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn deposit(account_id: Uuid, opportunity_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            account_id,
            opportunity_id,
            TransactionType::Deposit,
            amount,
            TransactionStatus::Invested,
        )
    }

    pub fn cashout(account_id: Uuid, opportunity_id: Uuid, amount: Decimal) -> Self {
        Self::new(
            account_id,
            opportunity_id,
            TransactionType::Cashout,
            amount,
            TransactionStatus::SellApprovalPending,
        )
    }

    fn new(
        account_id: Uuid,
        opportunity_id: Uuid,
        transaction_type: TransactionType,
        amount: Decimal,
        status: TransactionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            opportunity_id,
            transaction_type,
            amount,
            status,
            created_at: Utc::now(),
        }
    }
}

/// A user's request to sell units back, awaiting admin approval
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub id: Uuid,
    pub position_id: Option<Uuid>,
    pub account_id: Uuid,
    pub opportunity_id: Uuid,
    pub transaction_id: Uuid,
    pub seller: String,
    pub email: String,
    pub phone_number: String,
    pub product: String,
    pub quantity: i32,
    pub amount: Decimal,
    pub status: SellRequestStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Input for [`LedgerRepository::request_sale`](crate::domain::repositories::LedgerRepository::request_sale)
#[derive(Debug, Clone)]
pub struct SaleRequest {
    pub account_id: Uuid,
    pub opportunity_id: Uuid,
    pub quantity: i32,
    pub amount: Decimal,
    pub seller: String,
    pub email: String,
    pub phone_number: String,
    pub product: String,
}

/// Gateway confirmation applied to the ledger; `(provider, reference)` is unique
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentReceipt {
    pub provider: String,
    pub reference: String,
}

impl PaymentReceipt {
    pub fn new(provider: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reference: reference.into(),
        }
    }
}
