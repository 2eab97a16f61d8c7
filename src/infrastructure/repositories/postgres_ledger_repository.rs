use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::catalog::Opportunity;
use crate::domain::ledger::{
    LedgerEvent, Position, PositionStatus, SaleRequest, SellRequest, SellRequestStatus,
    Settlement, Transaction, TransactionType,
};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{
    Credited, Holding, LedgerRepository, Purchase, RepositoryError, RepositoryResult,
    SaleApproved, SaleRecorded, TransactionRecord,
};

const POSITION_COLUMNS: &str = "id, user_id, opportunity_id, quantity, purchase_price, \
    total_investment, sell_request_quantity, status, transaction_type, created_at, updated_at";

const SELL_REQUEST_COLUMNS: &str = "id, position_id, account_id, opportunity_id, transaction_id, \
    seller, email, phone_number, product, quantity, amount, status, created_at, approved_at";

const SELECT_RECORD: &str = r#"
    SELECT t.id, t.account_id, t.opportunity_id, t.transaction_type, t.amount, t.status,
           t.created_at,
           o.title AS opportunity_title, o.image AS opportunity_image,
           a.username, a.email
    FROM transactions t
    JOIN investment_opportunities o ON o.id = t.opportunity_id
    JOIN accounts a ON a.id = t.account_id
"#;

#[derive(sqlx::FromRow)]
struct PositionRow {
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

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Position::from_persistence(
            row.id,
            row.user_id,
            row.opportunity_id,
            row.quantity,
            row.purchase_price,
            row.total_investment,
            row.sell_request_quantity,
            row.status,
            row.transaction_type,
            row.created_at,
            row.updated_at,
        )
    }
}

#[derive(sqlx::FromRow)]
struct HoldingRow {
    #[sqlx(flatten)]
    position: PositionRow,
    o_id: Uuid,
    o_title: String,
    o_amount: Decimal,
    o_old_amount: Option<Decimal>,
    o_image: String,
    o_growth_rate: Option<Decimal>,
    o_created_at: DateTime<Utc>,
    o_updated_at: DateTime<Utc>,
}

impl From<HoldingRow> for Holding {
    fn from(row: HoldingRow) -> Self {
        Holding {
            position: row.position.into(),
            investment_opportunity: Opportunity {
                id: row.o_id,
                title: row.o_title,
                amount: row.o_amount,
                old_amount: row.o_old_amount,
                image: row.o_image,
                growth_rate: row.o_growth_rate,
                created_at: row.o_created_at,
                updated_at: row.o_updated_at,
            },
        }
    }
}

async fn lock_position(conn: &mut PgConnection, id: Uuid) -> RepositoryResult<Option<Position>> {
    let sql = format!("SELECT {} FROM positions WHERE id = $1 FOR UPDATE", POSITION_COLUMNS);
    let row = sqlx::query_as::<_, PositionRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Position::from))
}

async fn lock_position_for(
    conn: &mut PgConnection,
    user_id: Uuid,
    opportunity_id: Uuid,
) -> RepositoryResult<Option<Position>> {
    let sql = format!(
        "SELECT {} FROM positions WHERE user_id = $1 AND opportunity_id = $2 FOR UPDATE",
        POSITION_COLUMNS
    );
    let row = sqlx::query_as::<_, PositionRow>(&sql)
        .bind(user_id)
        .bind(opportunity_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Position::from))
}

/// Inserts a pending position unless one exists for the pair
///
/// # Returns
/// The `Opened` event when a row was inserted
async fn insert_if_absent(
    conn: &mut PgConnection,
    user_id: Uuid,
    opportunity_id: Uuid,
) -> RepositoryResult<Option<LedgerEvent>> {
    let (position, event) = Position::open(user_id, opportunity_id);
    let result = sqlx::query(
        r#"
        INSERT INTO positions (
            id, user_id, opportunity_id, quantity, purchase_price, total_investment,
            sell_request_quantity, status, transaction_type, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (user_id, opportunity_id) DO NOTHING
        "#,
    )
    .bind(position.id())
    .bind(position.user_id())
    .bind(position.opportunity_id())
    .bind(position.quantity())
    .bind(position.purchase_price())
    .bind(position.total_investment())
    .bind(position.sell_request_quantity())
    .bind(position.status())
    .bind(position.transaction_type())
    .bind(position.created_at())
    .bind(position.updated_at())
    .execute(conn)
    .await?;
    Ok((result.rows_affected() == 1).then_some(event))
}

async fn update_position(conn: &mut PgConnection, position: &Position) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        UPDATE positions
        SET quantity = $2, purchase_price = $3, total_investment = $4,
            sell_request_quantity = $5, status = $6, transaction_type = $7, updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(position.id())
    .bind(position.quantity())
    .bind(position.purchase_price())
    .bind(position.total_investment())
    .bind(position.sell_request_quantity())
    .bind(position.status())
    .bind(position.transaction_type())
    .bind(position.updated_at())
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_transaction(
    conn: &mut PgConnection,
    transaction: &Transaction,
) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, account_id, opportunity_id, transaction_type, amount, status, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.account_id)
    .bind(transaction.opportunity_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount)
    .bind(transaction.status)
    .bind(transaction.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// PostgreSQL implementation of LedgerRepository
///
/// Mutations lock the position row with `SELECT ... FOR UPDATE` inside a
/// database transaction before applying the aggregate transition.
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies a purchase to a locked position
    async fn credit_locked(
        conn: &mut PgConnection,
        mut position: Position,
        purchase: Purchase,
    ) -> RepositoryResult<Credited> {
        if let Some(receipt) = &purchase.receipt {
            let inserted = sqlx::query(
                r#"
                INSERT INTO payment_receipts (provider, reference, position_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (provider, reference) DO NOTHING
                "#,
            )
            .bind(&receipt.provider)
            .bind(&receipt.reference)
            .bind(position.id())
            .execute(&mut *conn)
            .await?;
            if inserted.rows_affected() == 0 {
                return Err(RepositoryError::AlreadyProcessed);
            }
        }

        let event = position
            .credit(purchase.quantity, purchase.amount)
            .map_err(RepositoryError::Rule)?;
        update_position(&mut *conn, &position).await?;

        let transaction = if purchase.amount > Decimal::ZERO {
            let transaction = Transaction::deposit(
                position.user_id(),
                position.opportunity_id(),
                purchase.amount,
            );
            insert_transaction(&mut *conn, &transaction).await?;
            Some(transaction)
        } else {
            None
        };

        Ok(Credited {
            position,
            transaction,
            event,
        })
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn open_position(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<(Position, Option<LedgerEvent>)> {
        let mut tx = self.pool.begin().await?;
        let event = insert_if_absent(&mut *tx, user_id, opportunity_id).await?;
        let position = lock_position_for(&mut *tx, user_id, opportunity_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;
        tx.commit().await?;
        Ok((position, event))
    }

    async fn find_position(&self, id: Uuid) -> RepositoryResult<Option<Position>> {
        let sql = format!("SELECT {} FROM positions WHERE id = $1", POSITION_COLUMNS);
        let row = sqlx::query_as::<_, PositionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Position::from))
    }

    async fn find_position_for(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
    ) -> RepositoryResult<Option<Position>> {
        let sql = format!(
            "SELECT {} FROM positions WHERE user_id = $1 AND opportunity_id = $2",
            POSITION_COLUMNS
        );
        let row = sqlx::query_as::<_, PositionRow>(&sql)
            .bind(user_id)
            .bind(opportunity_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Position::from))
    }

    async fn confirm_purchase(
        &self,
        position_id: Uuid,
        purchase: Purchase,
    ) -> RepositoryResult<Credited> {
        let mut tx = self.pool.begin().await?;
        let position = lock_position(&mut *tx, position_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;
        let credited = Self::credit_locked(&mut *tx, position, purchase).await?;
        tx.commit().await?;
        Ok(credited)
    }

    async fn credit_account(
        &self,
        user_id: Uuid,
        opportunity_id: Uuid,
        purchase: Purchase,
    ) -> RepositoryResult<Credited> {
        let mut tx = self.pool.begin().await?;
        insert_if_absent(&mut *tx, user_id, opportunity_id).await?;
        let position = lock_position_for(&mut *tx, user_id, opportunity_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;
        let credited = Self::credit_locked(&mut *tx, position, purchase).await?;
        tx.commit().await?;
        Ok(credited)
    }

    async fn abandon_checkout(&self, position_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM positions
            WHERE id = $1 AND status = 'pending' AND total_investment = 0
            "#,
        )
        .bind(position_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn request_sale(&self, request: SaleRequest) -> RepositoryResult<SaleRecorded> {
        let mut tx = self.pool.begin().await?;
        let mut position = lock_position_for(&mut *tx, request.account_id, request.opportunity_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Investment".to_string()))?;

        let event = position
            .reserve(request.quantity)
            .map_err(RepositoryError::Rule)?;
        update_position(&mut *tx, &position).await?;

        let transaction =
            Transaction::cashout(request.account_id, request.opportunity_id, request.amount);
        insert_transaction(&mut *tx, &transaction).await?;

        let sql = format!(
            r#"
            INSERT INTO sell_requests (
                id, position_id, account_id, opportunity_id, transaction_id, seller, email,
                phone_number, product, quantity, amount, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            SELL_REQUEST_COLUMNS
        );
        let sell_request = sqlx::query_as::<_, SellRequest>(&sql)
            .bind(Uuid::new_v4())
            .bind(position.id())
            .bind(request.account_id)
            .bind(request.opportunity_id)
            .bind(transaction.id)
            .bind(&request.seller)
            .bind(&request.email)
            .bind(&request.phone_number)
            .bind(&request.product)
            .bind(request.quantity)
            .bind(request.amount)
            .bind(SellRequestStatus::Pending)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SaleRecorded {
            sell_request,
            transaction,
            event,
        })
    }

    async fn approve_sale(&self, sell_request_id: Uuid) -> RepositoryResult<SaleApproved> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM sell_requests WHERE id = $1 FOR UPDATE",
            SELL_REQUEST_COLUMNS
        );
        let pending = sqlx::query_as::<_, SellRequest>(&sql)
            .bind(sell_request_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Sell request".to_string()))?;
        if !pending.status.can_transition_to(SellRequestStatus::Approved) {
            return Err(RepositoryError::Conflict(
                "Sell request already approved".to_string(),
            ));
        }

        let mut position = match pending.position_id {
            Some(id) => lock_position(&mut *tx, id).await?,
            None => None,
        }
        .ok_or_else(|| RepositoryError::Rule("Investment no longer exists".to_string()))?;

        let (settlement, event) = position
            .settle_sale(pending.quantity)
            .map_err(RepositoryError::Rule)?;

        match settlement {
            Settlement::Closed => {
                sqlx::query("DELETE FROM positions WHERE id = $1")
                    .bind(position.id())
                    .execute(&mut *tx)
                    .await?;
            }
            Settlement::Reduced => update_position(&mut *tx, &position).await?,
        }

        let sql = format!(
            r#"
            UPDATE sell_requests
            SET status = $2, approved_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELL_REQUEST_COLUMNS
        );
        let sell_request = sqlx::query_as::<_, SellRequest>(&sql)
            .bind(sell_request_id)
            .bind(SellRequestStatus::Approved)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'sold'
            WHERE id = $1 AND status = 'sell_approval_pending'
            "#,
        )
        .bind(sell_request.transaction_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
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
        let rows = sqlx::query_as::<_, HoldingRow>(
            r#"
            SELECT p.id, p.user_id, p.opportunity_id, p.quantity, p.purchase_price,
                   p.total_investment, p.sell_request_quantity, p.status, p.transaction_type,
                   p.created_at, p.updated_at,
                   o.id AS o_id, o.title AS o_title, o.amount AS o_amount,
                   o.old_amount AS o_old_amount, o.image AS o_image,
                   o.growth_rate AS o_growth_rate, o.created_at AS o_created_at,
                   o.updated_at AS o_updated_at
            FROM positions p
            JOIN investment_opportunities o ON o.id = p.opportunity_id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(
            rows.into_iter().map(Holding::from).collect(),
            total,
            window,
        ))
    }

    async fn all_holdings_for(&self, user_id: Uuid) -> RepositoryResult<Vec<Holding>> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            r#"
            SELECT p.id, p.user_id, p.opportunity_id, p.quantity, p.purchase_price,
                   p.total_investment, p.sell_request_quantity, p.status, p.transaction_type,
                   p.created_at, p.updated_at,
                   o.id AS o_id, o.title AS o_title, o.amount AS o_amount,
                   o.old_amount AS o_old_amount, o.image AS o_image,
                   o.growth_rate AS o_growth_rate, o.created_at AS o_created_at,
                   o.updated_at AS o_updated_at
            FROM positions p
            JOIN investment_opportunities o ON o.id = p.opportunity_id
            WHERE p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Holding::from).collect())
    }

    async fn transactions_for(
        &self,
        account_id: Uuid,
        window: Pagination,
    ) -> RepositoryResult<Page<TransactionRecord>> {
        let sql = format!(
            "{} WHERE t.account_id = $1 ORDER BY t.created_at DESC LIMIT $2 OFFSET $3",
            SELECT_RECORD
        );
        let rows = sqlx::query_as::<_, TransactionRecord>(&sql)
            .bind(account_id)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(Page::new(rows, total, window))
    }

    async fn all_transactions(
        &self,
        window: Pagination,
    ) -> RepositoryResult<Page<TransactionRecord>> {
        let sql = format!(
            "{} ORDER BY t.created_at DESC LIMIT $1 OFFSET $2",
            SELECT_RECORD
        );
        let rows = sqlx::query_as::<_, TransactionRecord>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(rows, total, window))
    }

    async fn transaction_amounts(
        &self,
        account_id: Uuid,
    ) -> RepositoryResult<Vec<(DateTime<Utc>, Decimal)>> {
        let rows: Vec<(DateTime<Utc>, Decimal)> = sqlx::query_as(
            r#"
            SELECT created_at, amount
            FROM transactions
            WHERE account_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn sell_requests(&self, window: Pagination) -> RepositoryResult<Page<SellRequest>> {
        let sql = format!(
            "SELECT {} FROM sell_requests ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            SELL_REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, SellRequest>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sell_requests")
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(rows, total, window))
    }
}
