use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::banking::{AccountDetails, Checkout, PaymentDetails};
use crate::domain::repositories::{BankingRepository, RepositoryError, RepositoryResult};

fn details_conflict(err: sqlx::Error) -> RepositoryError {
    match RepositoryError::from(err) {
        RepositoryError::Conflict(_) => {
            RepositoryError::Conflict("Account details already exist".to_string())
        }
        other => other,
    }
}

/// PostgreSQL implementation of BankingRepository
pub struct PostgresBankingRepository {
    pool: PgPool,
}

impl PostgresBankingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BankingRepository for PostgresBankingRepository {
    async fn create_account_details(&self, details: &AccountDetails) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO account_details (
                id, user_id, bank_name, account_number, account_holder_name, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(details.id)
        .bind(details.user_id)
        .bind(&details.bank_name)
        .bind(&details.account_number)
        .bind(&details.account_holder_name)
        .bind(details.created_at)
        .execute(&self.pool)
        .await
        .map_err(details_conflict)?;
        Ok(())
    }

    async fn account_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<AccountDetails>> {
        let rows = sqlx::query_as::<_, AccountDetails>(
            r#"
            SELECT id, user_id, bank_name, account_number, account_holder_name, created_at
            FROM account_details
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_account_details(&self, id: Uuid) -> RepositoryResult<Option<AccountDetails>> {
        let row = sqlx::query_as::<_, AccountDetails>(
            r#"
            SELECT id, user_id, bank_name, account_number, account_holder_name, created_at
            FROM account_details
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_account_details(&self, details: &AccountDetails) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE account_details
            SET bank_name = $2, account_number = $3, account_holder_name = $4
            WHERE id = $1
            "#,
        )
        .bind(details.id)
        .bind(&details.bank_name)
        .bind(&details.account_number)
        .bind(&details.account_holder_name)
        .execute(&self.pool)
        .await
        .map_err(details_conflict)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account details".to_string()));
        }
        Ok(())
    }

    async fn delete_account_details(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM account_details WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account details".to_string()));
        }
        Ok(())
    }

    async fn create_payment_details(&self, details: &PaymentDetails) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_details (
                id, user_id, card_holder_name, card_last4, expiry_month, expiry_year, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(details.id)
        .bind(details.user_id)
        .bind(&details.card_holder_name)
        .bind(&details.card_last4)
        .bind(details.expiry_month)
        .bind(details.expiry_year)
        .bind(details.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn payment_details_for(&self, user_id: Uuid) -> RepositoryResult<Vec<PaymentDetails>> {
        let rows = sqlx::query_as::<_, PaymentDetails>(
            r#"
            SELECT id, user_id, card_holder_name, card_last4, expiry_month, expiry_year, created_at
            FROM payment_details
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_checkout(&self, checkout: &Checkout) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO checkouts (
                id, account_id, name, phone_number, email, address, accept_terms, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(checkout.id)
        .bind(checkout.account_id)
        .bind(&checkout.name)
        .bind(&checkout.phone_number)
        .bind(&checkout.email)
        .bind(&checkout.address)
        .bind(checkout.accept_terms)
        .bind(checkout.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_checkout(&self, id: Uuid) -> RepositoryResult<Option<Checkout>> {
        let row = sqlx::query_as::<_, Checkout>(
            r#"
            SELECT id, account_id, name, phone_number, email, address, accept_terms, created_at
            FROM checkouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn checkouts_for(&self, account_id: Uuid) -> RepositoryResult<Vec<Checkout>> {
        let rows = sqlx::query_as::<_, Checkout>(
            r#"
            SELECT id, account_id, name, phone_number, email, address, accept_terms, created_at
            FROM checkouts
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
