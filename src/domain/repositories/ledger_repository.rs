use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::catalog::Opportunity;
use crate::domain::ledger::{
    LedgerEvent, PaymentReceipt, Position, SaleRequest, SellRequest, Settlement, Transaction,
};
use crate::domain::pagination::{Page, Pagination};

/// A position together with the opportunity it holds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(flatten)]
    pub position: Position,
    pub investment_opportunity: Opportunity,
}

/// A transaction joined with its opportunity and owner
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub transaction: Transaction,
    pub opportunity_title: String,
    pub opportunity_image: String,
    pub username: String,
    pub email: String,
}

/// A confirmed purchase to apply to a position
///
/// A transaction is recorded only for a positive `amount`. When a receipt
/// is given it is stored in the same database transaction and a repeat
/// fails with `AlreadyProcessed`.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub quantity: i32,
    pub amount: Decimal,
    pub receipt: Option<PaymentReceipt>,
}

#[derive(Debug, Clone)]
pub struct Credited {
    pub position: Position,
    pub transaction: Option<Transaction>,
    pub event: LedgerEvent,
}

#[derive(Debug, Clone)]
pub struct SaleRecorded {
    pub sell_request: SellRequest,
    pub transaction: Transaction,
    pub event: LedgerEvent,
}

#[derive(Debug, Clone)]
pub struct SaleApproved {
    pub sell_request: SellRequest,
    pub settlement: Settlement,
    pub event: LedgerEvent,
}

/// Repository trait for the investment ledger
///
/// Every mutating method runs as one unit: the position row is locked,
/// the aggregate transition is applied and all dependent rows are written
/// before anything becomes visible.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Return the user's position in an opportunity, opening a pending one if absent
    ///
    /// # Returns
    /// The position and the `Opened` event when a new one was created
    async fn open_position(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<(Position, Option<LedgerEvent>)>;

    async fn find_position(&self, id: Uuid) -> RepositoryResult<Option<Position>>;

    async fn find_position_for(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<Option<Position>>;

    /// Apply a confirmed payment to an existing position
    async fn confirm_purchase(&self, position_id: Uuid, purchase: Purchase)
        -> RepositoryResult<Credited>;

    /// Credit a user directly, opening the position if needed
    async fn credit_account(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
        purchase: Purchase,
    ) -> RepositoryResult<Credited>;

    /// Remove a position whose checkout was never paid
    ///
    /// # Returns
    /// `true` when the position was deleted
    async fn abandon_checkout(&self, position_id: Uuid) -> RepositoryResult<bool>;

    /// Reserve units and record the cashout transaction and sell request
    async fn request_sale(&self, request: SaleRequest) -> RepositoryResult<SaleRecorded>;

    /// Approve a pending sell request and settle it against the position
    async fn approve_sale(&self, sell_request_id: Uuid) -> RepositoryResult<SaleApproved>;

    async fn holdings_for(
        &self,
        user_id: Uuid,
        window: Pagination,
    ) -> RepositoryResult<Page<Holding>>;

    /// All holdings of a user, for statistics
    async fn all_holdings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Holding>>;

    /// Newest first
    async fn transactions_for(
        &self,
        account_id: Uuid,
        window: Pagination,
    ) -> RepositoryResult<Page<TransactionRecord>>;

    /// Newest first, across all accounts
    async fn all_transactions(&self, window: Pagination)
        -> RepositoryResult<Page<TransactionRecord>>;

    async fn transaction_amounts(
        &self,
        account_id: Uuid,
    ) -> RepositoryResult<Vec<(DateTime<Utc>, Decimal)>>;

    /// Newest first
    async fn sell_requests(&self, window: Pagination) -> RepositoryResult<Page<SellRequest>>;
}
