use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::banking::{AccountDetails, Checkout, PaymentDetails};

/// Repository trait for bank accounts, cards and checkout info
///
/// Bank account writes fail with `Conflict` on a duplicate
/// (bank name, account number) pair.
#[async_trait]
pub trait BankingRepository: Send + Sync {
    async fn create_account_details(&self, details: &AccountDetails) -> RepositoryResult<()>;

    async fn account_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<AccountDetails>>;

    async fn find_account_details(&self, id: Uuid) -> RepositoryResult<Option<AccountDetails>>;

    async fn update_account_details(&self, details: &AccountDetails) -> RepositoryResult<()>;

    async fn delete_account_details(&self, id: Uuid) -> RepositoryResult<()>;

    async fn create_payment_details(&self, details: &PaymentDetails) -> RepositoryResult<()>;

    async fn payment_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentDetails>>;

    async fn create_checkout(&self, checkout: &Checkout) -> RepositoryResult<()>;

    async fn find_checkout(&self, id: Uuid) -> RepositoryResult<Option<Checkout>>;

    async fn checkouts_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Checkout>>;
}
