use async_trait::async_trait;
use uuid::Uuid;

use super::errors::RepositoryResult;
use crate::domain::catalog::{News, Opportunity, OpportunityTitle};
use crate::domain::pagination::{Page, Pagination};

/// Repository trait for investment opportunities
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    async fn create(&self, opportunity: &Opportunity) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Opportunity>>;

    /// Newest first
    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Opportunity>>;

    async fn titles(&self) -> RepositoryResult<Vec<OpportunityTitle>>;

    async fn update(&self, opportunity: &Opportunity) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// Repository trait for investor news
#[async_trait]
pub trait NewsRepository: Send + Sync {
    async fn create(&self, news: &News) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<News>>;

    /// Newest first
    async fn list(&self, window: Pagination) -> RepositoryResult<Page<News>>;

    async fn update(&self, news: &News) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}
