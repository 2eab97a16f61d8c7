use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::banking::{AccountDetails, Checkout, PaymentDetails};
use crate::domain::repositories::{BankingRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
struct BankingState {
    accounts: Vec<AccountDetails>,
    cards: Vec<PaymentDetails>,
    checkouts: Vec<Checkout>,
}

#[derive(Default)]
pub struct MemoryBankingRepository {
    state: RwLock<BankingState>,
}

impl MemoryBankingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(existing: &[AccountDetails], details: &AccountDetails) -> bool {
    existing.iter().any(|d| {
        d.id != details.id
            && d.bank_name == details.bank_name
            && d.account_number == details.account_number
    })
}

#[async_trait]
impl BankingRepository for MemoryBankingRepository {
    async fn create_account_details(&self, details: &AccountDetails) -> RepositoryResult<()> {
        let mut state = self.state.write();
        if duplicate(&state.accounts, details) {
            return Err(RepositoryError::Conflict("Account details already exist".to_string()));
        }
        state.accounts.push(details.clone());
        Ok(())
    }

    async fn account_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<AccountDetails>> {
        Ok(self
            .state
            .read()
            .accounts
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_account_details(&self, id: Uuid) -> RepositoryResult<Option<AccountDetails>> {
        Ok(self.state.read().accounts.iter().find(|d| d.id == id).cloned())
    }

    async fn update_account_details(&self, details: &AccountDetails) -> RepositoryResult<()> {
        let mut state = self.state.write();
        if duplicate(&state.accounts, details) {
            return Err(RepositoryError::Conflict("Account details already exist".to_string()));
        }
        let slot = state
            .accounts
            .iter_mut()
            .find(|d| d.id == details.id)
            .ok_or_else(|| RepositoryError::NotFound("Account details".to_string()))?;
        *slot = details.clone();
        Ok(())
    }

    async fn delete_account_details(&self, id: Uuid) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let before = state.accounts.len();
        state.accounts.retain(|d| d.id != id);
        if state.accounts.len() == before {
            return Err(RepositoryError::NotFound("Account details".to_string()));
        }
        Ok(())
    }

    async fn create_payment_details(&self, details: &PaymentDetails) -> RepositoryResult<()> {
        self.state.write().cards.push(details.clone());
        Ok(())
    }

    async fn payment_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentDetails>> {
        Ok(self
            .state
            .read()
            .cards
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_checkout(&self, checkout: &Checkout) -> RepositoryResult<()> {
        self.state.write().checkouts.push(checkout.clone());
        Ok(())
    }

    async fn find_checkout(&self, id: Uuid) -> RepositoryResult<Option<Checkout>> {
        Ok(self.state.read().checkouts.iter().find(|c| c.id == id).cloned())
    }

    async fn checkouts_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Checkout>> {
        Ok(self
            .state
            .read()
            .checkouts
            .iter()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }
}
