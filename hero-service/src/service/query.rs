//! Read-only filtered queries

use std::sync::Arc;

use tracing::debug;

use crate::criteria::SuperHeroCriteria;
use crate::domain::SuperHeroDto;
use crate::repository::{Page, PageRequest, RepositoryResult, SuperHeroRepository};

/// Executes [`SuperHeroCriteria`] against the store
///
/// Absent criteria match every record. Results are mapped to DTOs in store order.
pub struct SuperHeroQueryService<R> {
    repository: Arc<R>,
}

impl<R> Clone for SuperHeroQueryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn describe(criteria: Option<&SuperHeroCriteria>) -> String {
    criteria.map_or_else(|| "none".to_string(), ToString::to_string)
}

impl<R: SuperHeroRepository> SuperHeroQueryService<R> {
    /// Create a query service over a shared store
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Every matching record
    pub async fn find_by_criteria(
        &self,
        criteria: Option<&SuperHeroCriteria>,
    ) -> RepositoryResult<Vec<SuperHeroDto>> {
        debug!(criteria = %describe(criteria), "Find by criteria");
        let query = SuperHeroCriteria::to_query(criteria);
        let entities = self.repository.find_all(&query).await?;
        Ok(entities.into_iter().map(SuperHeroDto::from).collect())
    }

    /// One page of matching records
    pub async fn find_page_by_criteria(
        &self,
        criteria: Option<&SuperHeroCriteria>,
        page: &PageRequest,
    ) -> RepositoryResult<Page<SuperHeroDto>> {
        debug!(
            criteria = %describe(criteria),
            page = page.page,
            size = page.size,
            "Find page by criteria"
        );
        let query = SuperHeroCriteria::to_query(criteria);
        let page = self.repository.find_page(&query, page).await?;
        Ok(page.map(SuperHeroDto::from))
    }

    /// Number of matching records
    pub async fn count_by_criteria(
        &self,
        criteria: Option<&SuperHeroCriteria>,
    ) -> RepositoryResult<u64> {
        debug!(criteria = %describe(criteria), "Count by criteria");
        let query = SuperHeroCriteria::to_query(criteria);
        self.repository.count(&query).await
    }
}
