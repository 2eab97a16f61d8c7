use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::account::{Account, Email, NewAccount};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{AccountRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: RwLock<Vec<Account>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.read().iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: NewAccount) -> RepositoryResult<Account> {
        let mut accounts = self.accounts.write();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict("Email already exists".to_string()));
        }
        if accounts.iter().any(|a| a.username == account.username) {
            return Err(RepositoryError::Conflict("Username already exists".to_string()));
        }
        let account = account.into_account();
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Account>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .iter()
            .find(|a| a.email == email.as_str())
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Account".to_string()))?;
        account.is_verified = true;
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| RepositoryError::NotFound("Account".to_string()))?;
        account.password_hash = password_hash.to_string();
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, updated: &Account) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write();
        if accounts
            .iter()
            .any(|a| a.id != updated.id && a.username == updated.username)
        {
            return Err(RepositoryError::Conflict("Username already exists".to_string()));
        }
        let account = accounts
            .iter_mut()
            .find(|a| a.id == updated.id)
            .ok_or_else(|| RepositoryError::NotFound("Account".to_string()))?;
        account.username = updated.username.clone();
        account.profile = updated.profile.clone();
        account.updated_at = updated.updated_at;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut accounts = self.accounts.write();
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        if accounts.len() == before {
            return Err(RepositoryError::NotFound("Account".to_string()));
        }
        Ok(())
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Account>> {
        let mut accounts = self.accounts.read().clone();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(
            window.slice(&accounts),
            accounts.len() as i64,
            window,
        ))
    }
}
