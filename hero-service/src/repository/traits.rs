//! Entity store trait
//!
//! Async methods use return-position `impl Future` so implementations can be
//! written with plain `async fn`, without `async_trait`. The trait is therefore
//! not object safe; services are generic over it.

use std::future::Future;

use super::error::RepositoryResult;
use super::filter::SuperHeroQuery;
use super::pagination::{Page, PageRequest};
use crate::domain::SuperHero;

/// Persistence port for SuperHero records
///
/// Every method is atomic on its own; no cross-call transaction is assumed.
pub trait SuperHeroRepository: Send + Sync + 'static {
    /// Load one record, `Ok(None)` when the id does not exist
    fn find_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<Option<SuperHero>>> + Send;

    /// Every record matching the query, ordered by id
    fn find_all(
        &self,
        query: &SuperHeroQuery,
    ) -> impl Future<Output = RepositoryResult<Vec<SuperHero>>> + Send;

    /// One page of records matching the query, with the total match count
    fn find_page(
        &self,
        query: &SuperHeroQuery,
        page: &PageRequest,
    ) -> impl Future<Output = RepositoryResult<Page<SuperHero>>> + Send;

    /// Number of records matching the query
    fn count(&self, query: &SuperHeroQuery) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Whether a record with this id exists
    fn exists_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Insert when `entity.id` is `None`, otherwise overwrite every column
    ///
    /// Returns the stored record with its id set.
    fn save(&self, entity: SuperHero) -> impl Future<Output = RepositoryResult<SuperHero>> + Send;

    /// Remove a record; deleting a missing id succeeds
    fn delete_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Check that the store is reachable
    fn ping(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}
