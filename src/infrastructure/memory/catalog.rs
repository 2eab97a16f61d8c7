use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::catalog::{News, Opportunity, OpportunityTitle};
use crate::domain::pagination::{Page, Pagination};
use crate::domain::repositories::{
    NewsRepository, OpportunityRepository, RepositoryError, RepositoryResult,
};

#[derive(Default)]
pub struct MemoryOpportunityRepository {
    opportunities: RwLock<Vec<Opportunity>>,
}

impl MemoryOpportunityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<Opportunity> {
        self.opportunities.read().iter().find(|o| o.id == id).cloned()
    }

    fn newest_first(&self) -> Vec<Opportunity> {
        let mut items = self.opportunities.read().clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

#[async_trait]
impl OpportunityRepository for MemoryOpportunityRepository {
    async fn create(&self, opportunity: &Opportunity) -> RepositoryResult<()> {
        self.opportunities.write().push(opportunity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Opportunity>> {
        Ok(self.get(id))
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<Opportunity>> {
        let items = self.newest_first();
        Ok(Page::new(window.slice(&items), items.len() as i64, window))
    }

    async fn titles(&self) -> RepositoryResult<Vec<OpportunityTitle>> {
        Ok(self
            .newest_first()
            .into_iter()
            .map(|o| OpportunityTitle {
                label: o.title,
                value: o.amount,
            })
            .collect())
    }

    async fn update(&self, opportunity: &Opportunity) -> RepositoryResult<()> {
        let mut items = self.opportunities.write();
        let slot = items
            .iter_mut()
            .find(|o| o.id == opportunity.id)
            .ok_or_else(|| RepositoryError::NotFound("Investment opportunity".to_string()))?;
        *slot = opportunity.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut items = self.opportunities.write();
        let before = items.len();
        items.retain(|o| o.id != id);
        if items.len() == before {
            return Err(RepositoryError::NotFound("Investment opportunity".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNewsRepository {
    news: RwLock<Vec<News>>,
}

impl MemoryNewsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NewsRepository for MemoryNewsRepository {
    async fn create(&self, news: &News) -> RepositoryResult<()> {
        self.news.write().push(news.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<News>> {
        Ok(self.news.read().iter().find(|n| n.id == id).cloned())
    }

    async fn list(&self, window: Pagination) -> RepositoryResult<Page<News>> {
        let mut items = self.news.read().clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(window.slice(&items), items.len() as i64, window))
    }

    async fn update(&self, news: &News) -> RepositoryResult<()> {
        let mut items = self.news.write();
        let slot = items
            .iter_mut()
            .find(|n| n.id == news.id)
            .ok_or_else(|| RepositoryError::NotFound("News".to_string()))?;
        *slot = news.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut items = self.news.write();
        let before = items.len();
        items.retain(|n| n.id != id);
        if items.len() == before {
            return Err(RepositoryError::NotFound("News".to_string()));
        }
        Ok(())
    }
}
