use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{Account, Email, NewAccount, Profile, Role};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{AccountRepository, RepositoryError, RepositoryResult};

const SELECT_ACCOUNT: &str = r#"
    SELECT a.id, a.email, a.username, a.password_hash, a.role, a.is_verified,
           a.created_at, a.updated_at,
           p.fullname, p.phone_number, p.profile_image
    FROM accounts a
    LEFT JOIN profiles p ON p.account_id = a.id
"#;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    role: Role,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    fullname: Option<String>,
    phone_number: Option<String>,
    profile_image: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role,
            is_verified: row.is_verified,
            profile: Profile {
                fullname: row.fullname,
                phone_number: row.phone_number,
                profile_image: row.profile_image,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Maps unique violations on the accounts table to readable conflicts
fn account_conflict(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        match db.constraint() {
            Some("accounts_email_key") => {
                return RepositoryError::Conflict("Email already exists".to_string())
            }
            Some("accounts_username_key") => {
                return RepositoryError::Conflict("Username already exists".to_string())
            }
            _ => {}
        }
    }
    RepositoryError::from(err)
}

/// PostgreSQL implementation of AccountRepository
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, clause: &str, value: &str) -> RepositoryResult<Option<Account>> {
        let sql = format!("{} WHERE {} = $1", SELECT_ACCOUNT, clause);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: NewAccount) -> RepositoryResult<Account> {
        let account = account.into_account();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, username, password_hash, role, is_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(account.is_verified)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(account_conflict)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (account_id, fullname, phone_number, profile_image)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(account.id)
        .bind(&account.profile.fullname)
        .bind(&account.profile.phone_number)
        .bind(&account.profile.profile_image)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Account>> {
        let sql = format!("{} WHERE a.id = $1", SELECT_ACCOUNT);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<Account>> {
        self.find_where("a.email", email.as_str()).await
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        self.find_where("a.username", username).await
    }

    async fn mark_verified(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET is_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account".to_string()));
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account".to_string()));
        }
        Ok(())
    }

    async fn update_profile(&self, account: &Account) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE accounts SET username = $2, updated_at = $3 WHERE id = $1")
            .bind(account.id)
            .bind(&account.username)
            .bind(account.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(account_conflict)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO profiles (account_id, fullname, phone_number, profile_image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id) DO UPDATE SET
                fullname = EXCLUDED.fullname,
                phone_number = EXCLUDED.phone_number,
                profile_image = EXCLUDED.profile_image
            "#,
        )
        .bind(account.id)
        .bind(&account.profile.fullname)
        .bind(&account.profile.phone_number)
        .bind(&account.profile.profile_image)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Account".to_string()));
        }
        Ok(())
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Account>> {
        let sql = format!(
            "{} ORDER BY a.created_at DESC LIMIT $1 OFFSET $2",
            SELECT_ACCOUNT
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Account::from).collect(),
            total,
            window,
        ))
    }
}
