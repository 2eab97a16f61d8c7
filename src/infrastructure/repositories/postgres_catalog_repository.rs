use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{News, Opportunity, OpportunityTitle};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{
    NewsRepository, OpportunityRepository, RepositoryError, RepositoryResult,
};

/// PostgreSQL implementation of OpportunityRepository
pub struct PostgresOpportunityRepository {
    pool: PgPool,
}

impl PostgresOpportunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityRepository for PostgresOpportunityRepository {
    async fn create(&self, opportunity: &Opportunity) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO investment_opportunities (
                id, title, amount, old_amount, image, growth_rate, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(opportunity.id)
        .bind(&opportunity.title)
        .bind(opportunity.amount)
        .bind(opportunity.old_amount)
        .bind(&opportunity.image)
        .bind(opportunity.growth_rate)
        .bind(opportunity.created_at)
        .bind(opportunity.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Opportunity>> {
        let row = sqlx::query_as::<_, Opportunity>(
            r#"
            SELECT id, title, amount, old_amount, image, growth_rate, created_at, updated_at
            FROM investment_opportunities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Opportunity>> {
        let rows = sqlx::query_as::<_, Opportunity>(
            r#"
            SELECT id, title, amount, old_amount, image, growth_rate, created_at, updated_at
            FROM investment_opportunities
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investment_opportunities")
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(rows, total, window))
    }

    async fn titles(&self) -> RepositoryResult<Vec<OpportunityTitle>> {
        let rows = sqlx::query_as::<_, OpportunityTitle>(
            r#"
            SELECT title AS label, amount AS value
            FROM investment_opportunities
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(&self, opportunity: &Opportunity) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE investment_opportunities
            SET title = $2, amount = $3, old_amount = $4, image = $5,
                growth_rate = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(opportunity.id)
        .bind(&opportunity.title)
        .bind(opportunity.amount)
        .bind(opportunity.old_amount)
        .bind(&opportunity.image)
        .bind(opportunity.growth_rate)
        .bind(opportunity.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Investment opportunity".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM investment_opportunities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("Investment opportunity".to_string()));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of NewsRepository
pub struct PostgresNewsRepository {
    pool: PgPool,
}

impl PostgresNewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsRepository for PostgresNewsRepository {
    async fn create(&self, news: &News) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO investment_news (
                id, title, description, link, source, image, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.description)
        .bind(&news.link)
        .bind(&news.source)
        .bind(&news.image)
        .bind(news.created_at)
        .bind(news.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<News>> {
        let row = sqlx::query_as::<_, News>(
            r#"
            SELECT id, title, description, link, source, image, created_at, updated_at
            FROM investment_news
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<News>> {
        let rows = sqlx::query_as::<_, News>(
            r#"
            SELECT id, title, description, link, source, image, created_at, updated_at
            FROM investment_news
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investment_news")
            .fetch_one(&self.pool)
            .await?;
        Ok(Page::new(rows, total, window))
    }

    async fn update(&self, news: &News) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE investment_news
            SET title = $2, description = $3, link = $4, source = $5, image = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.description)
        .bind(&news.link)
        .bind(&news.source)
        .bind(&news.image)
        .bind(news.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("News".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM investment_news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("News".to_string()));
        }
        Ok(())
    }
}
