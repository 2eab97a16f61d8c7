use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use super::accounts::MemoryAccountRepository;
use super::catalog::MemoryOpportunityRepository;
use crate::domain::ledger::{
    LedgerEvent, PaymentReceipt, Position, SaleRequest, SellRequest, SellRequestStatus,
    Settlement, Transaction, TransactionStatus,
};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{
    Credited, Holding, LedgerRepository, Purchase, RepositoryError, RepositoryResult,
    SaleApproved, SaleRecorded, TransactionRecord,
};

#[derive(Default)]
struct LedgerState {
    positions: HashMap<Uuid, Position>,
    transactions: Vec<Transaction>,
    sell_requests: Vec<SellRequest>,
    receipts: HashSet<PaymentReceipt>,
}

impl LedgerState {
    fn position_for(&self, user_id: Uuid, opportunity_id: Uuid) -> Option<&Position> {
        self.positions
            .values()
            .find(|p| p.user_id() == user_id && p.opportunity_id() == opportunity_id)
    }

    /// Applies a purchase to a working copy and commits only on success
    fn credit(&mut self, mut position: Position, purchase: Purchase) -> RepositoryResult<Credited> {
        if let Some(receipt) = &purchase.receipt {
            if self.receipts.contains(receipt) {
                return Err(RepositoryError::AlreadyProcessed);
            }
        }

        let event = position
            .credit(purchase.quantity, purchase.amount)
            .map_err(RepositoryError::Rule)?;
        let transaction = (purchase.amount > Decimal::ZERO).then(|| {
            Transaction::deposit(
                position.user_id(),
                position.opportunity_id(),
                purchase.amount,
            )
        });

        self.positions.insert(position.id(), position.clone());
        if let Some(transaction) = &transaction {
            self.transactions.push(transaction.clone());
        }
        if let Some(receipt) = purchase.receipt {
            self.receipts.insert(receipt);
        }

        Ok(Credited {
            position,
            transaction,
            event,
        })
    }
}

/// Ledger kept in process memory
///
/// One mutex guards the whole ledger, so every operation is serialised the
/// way row locks serialise the Postgres adapter.
pub struct MemoryLedgerRepository {
    state: Mutex<LedgerState>,
    accounts: Arc<MemoryAccountRepository>,
    opportunities: Arc<MemoryOpportunityRepository>,
}

impl MemoryLedgerRepository {
    pub fn new(
        accounts: Arc<MemoryAccountRepository>,
        opportunities: Arc<MemoryOpportunityRepository>,
    ) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            accounts,
            opportunities,
        }
    }

    fn record(&self, transaction: &Transaction) -> Option<TransactionRecord> {
        let opportunity = self.opportunities.get(transaction.opportunity_id)?;
        let account = self.accounts.get(transaction.account_id)?;
        Some(TransactionRecord {
            transaction: transaction.clone(),
            opportunity_title: opportunity.title,
            opportunity_image: opportunity.image,
            username: account.username,
            email: account.email,
        })
    }

    fn holdings(&self, user_id: Uuid) -> Vec<Holding> {
        let mut positions: Vec<Position> = self
            .state
            .lock()
            .positions
            .values()
            .filter(|p| p.user_id() == user_id)
            .cloned()
            .collect();
        positions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        positions
            .into_iter()
            .filter_map(|position| {
                self.opportunities
                    .get(position.opportunity_id())
                    .map(|investment_opportunity| Holding {
                        position,
                        investment_opportunity,
                    })
            })
            .collect()
    }

    fn records<F>(&self, filter: F) -> Vec<TransactionRecord>
    where
        F: Fn(&Transaction) -> bool,
    {
        let transactions: Vec<Transaction> = self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|t| filter(t))
            .cloned()
            .collect();
        let mut records: Vec<TransactionRecord> =
            transactions.iter().filter_map(|t| self.record(t)).collect();
        records.sort_by(|a, b| b.transaction.created_at.cmp(&a.transaction.created_at));
        records
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn open_position(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<(Position, Option<LedgerEvent>)> {
        let mut state = self.state.lock();
        if let Some(existing) = state.position_for(user_id, opportunity_id) {
            return Ok((existing.clone(), None));
        }
        let (position, event) = Position::open(user_id, opportunity_id);
        state.positions.insert(position.id(), position.clone());
        Ok((position, Some(event)))
    }

    async fn find_position(&self, id: Uuid) -> RepositoryResult<Option<Position>> {
        Ok(self.state.lock().positions.get(&id).cloned())
    }

    async fn find_position_for(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<Option<Position>> {
        Ok(self.state.lock().position_for(user_id, opportunity_id).cloned())
    }

    async fn confirm_purchase(
        &self,
        position_id: Uuid,
        purchase: Purchase,
    ) -> RepositoryResult<Credited> {
        let mut state = self.state.lock();
        let position = state
            .positions
            .get(&position_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;
        state.credit(position, purchase)
    }

    async fn credit_account(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
        purchase: Purchase,
    ) -> RepositoryResult<Credited> {
        let mut state = self.state.lock();
        let position = match state.position_for(user_id, opportunity_id) {
            Some(existing) => existing.clone(),
            None => Position::open(user_id, opportunity_id).0,
        };
        state.credit(position, purchase)
    }

    async fn abandon_checkout(&self, position_id: Uuid) -> RepositoryResult<bool> {
        let mut state = self.state.lock();
        let abandoned = state
            .positions
            .get(&position_id)
            .map(|p| p.is_abandoned_checkout())
            .unwrap_or(false);
        if abandoned {
            state.positions.remove(&position_id);
        }
        Ok(abandoned)
    }

    async fn request_sale(&self, request: SaleRequest) -> RepositoryResult<SaleRecorded> {
        let mut state = self.state.lock();
        let mut position = state
            .position_for(request.account_id, request.opportunity_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;

        let event = position
            .reserve(request.quantity)
            .map_err(RepositoryError::Rule)?;
        let transaction =
            Transaction::cashout(request.account_id, request.opportunity_id, request.amount);
        let sell_request = SellRequest {
            id: Uuid::new_v4(),
            position_id: Some(position.id()),
            account_id: request.account_id,
            opportunity_id: request.opportunity_id,
            transaction_id: transaction.id,
            seller: request.seller,
            email: request.email,
            phone_number: request.phone_number,
            product: request.product,
            quantity: request.quantity,
            amount: request.amount,
            status: SellRequestStatus::Pending,
            created_at: Utc::now(),
            approved_at: None,
        };

        state.positions.insert(position.id(), position);
        state.transactions.push(transaction.clone());
        state.sell_requests.push(sell_request.clone());

        Ok(SaleRecorded {
            sell_request,
            transaction,
            event,
        })
    }

    async fn approve_sale(&self, sell_request_id: Uuid) -> RepositoryResult<SaleApproved> {
        let mut state = self.state.lock();
        let mut sell_request = state
            .sell_requests
            .iter()
            .find(|r| r.id == sell_request_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("Sell request".to_string()))?;
        if !sell_request.status.can_transition_to(SellRequestStatus::Approved) {
            return Err(RepositoryError::Conflict(
                "Sell request already approved".to_string(),
            ));
        }

        let mut position = sell_request
            .position_id
            .and_then(|id| state.positions.get(&id).cloned())
            .ok_or_else(|| RepositoryError::Rule("Investment no longer exists".to_string()))?;
        let (settlement, event) = position
            .settle_sale(sell_request.quantity)
            .map_err(RepositoryError::Rule)?;

        sell_request.status = SellRequestStatus::Approved;
        sell_request.approved_at = Some(Utc::now());

        match settlement {
            Settlement::Closed => {
                state.positions.remove(&position.id());
                for request in state
                    .sell_requests
                    .iter_mut()
                    .filter(|r| r.position_id == Some(position.id()))
                {
                    request.position_id = None;
                }
                sell_request.position_id = None;
            }
            Settlement::Reduced => {
                state.positions.insert(position.id(), position);
            }
        }
        if let Some(transaction) = state
            .transactions
            .iter_mut()
            .find(|t| t.id == sell_request.transaction_id)
        {
            if transaction.status.can_transition_to(TransactionStatus::Sold) {
                transaction.status = TransactionStatus::Sold;
            }
        }
        if let Some(slot) = state
            .sell_requests
            .iter_mut()
            .find(|r| r.id == sell_request.id)
        {
            *slot = sell_request.clone();
        }

        Ok(SaleApproved {
            sell_request,
            settlement,
            event,
        })
    }

    async fn holdings_for(
        &self,
        user_id: Uuid,
        window: Pagination,
    ) -> RepositoryResult<Page<Holding>> {
        let holdings = self.holdings(user_id);
        Ok(Page::new(
            window.slice(&holdings),
            holdings.len() as i64,
            window,
        ))
    }

    async fn all_holdings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Holding>> {
        Ok(self.holdings(user_id))
    }

    async fn transactions_for(
        &self,
        account_id: Uuid,
        window: Pagination,
    ) -> RepositoryResult<Page<TransactionRecord>> {
        let records = self.records(|t| t.account_id == account_id);
        Ok(Page::new(window.slice(&records), records.len() as i64, window))
    }

    async fn all_transactions(
        &self,
        window: Pagination,
    ) -> RepositoryResult<Page<TransactionRecord>> {
        let records = self.records(|_| true);
        Ok(Page::new(window.slice(&records), records.len() as i64, window))
    }

    async fn transaction_amounts(
        &self,
        account_id: Uuid,
    ) -> RepositoryResult<Vec<(DateTime<Utc>, Decimal)>> {
        Ok(self
            .state
            .lock()
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .map(|t| (t.created_at, t.amount))
            .collect())
    }

    async fn sell_requests(&self, window: Pagination) -> RepositoryResult<Page<SellRequest>> {
        let mut requests = self.state.lock().sell_requests.clone();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(
            window.slice(&requests),
            requests.len() as i64,
            window,
        ))
    }
}
