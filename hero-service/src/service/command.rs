//! Create, update, delete and single lookups with a read-through cache
//!
//! `find_one` reads through the entity cache. `update`, `partial_update` and
//! `delete` evict the id after the store call has returned. A failing cache
//! never fails a call: the error is logged and the store is used instead.
//!
//! A lookup that loaded its value before a concurrent write and caches it
//! after that write's eviction would keep a stale entry until the TTL. Each
//! write bumps a counter shared by clones of the service, and `find_one` drops
//! its own entry when the counter moved during the load. The counter is
//! per process; instances sharing a Redis cache are only bounded by the TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::SharedEntityCache;
use crate::domain::{SuperHero, SuperHeroDto, SuperHeroPatch};
use crate::repository::{Page, PageRequest, RepositoryResult, SuperHeroQuery, SuperHeroRepository};

/// Write operations and single-entity reads
pub struct SuperHeroService<R> {
    repository: Arc<R>,
    cache: SharedEntityCache,
    writes: Arc<AtomicU64>,
}

impl<R> Clone for SuperHeroService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            writes: Arc::clone(&self.writes),
        }
    }
}

impl<R: SuperHeroRepository> SuperHeroService<R> {
    /// Create a service over a shared store and cache
    pub fn new(repository: Arc<R>, cache: SharedEntityCache) -> Self {
        Self {
            repository,
            cache,
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Persist a new record; any id on the DTO is ignored
    pub async fn save(&self, dto: SuperHeroDto) -> RepositoryResult<SuperHeroDto> {
        debug!("Request to save SuperHero : {}", dto);
        let mut entity = SuperHero::from(dto);
        entity.id = None;
        let saved = self.repository.save(entity).await?;
        Ok(SuperHeroDto::from(saved))
    }

    /// Overwrite every field of an existing record, nulls included
    pub async fn update(&self, dto: SuperHeroDto) -> RepositoryResult<SuperHeroDto> {
        debug!("Request to update SuperHero : {}", dto);
        let saved = self.repository.save(SuperHero::from(dto)).await?;
        if let Some(id) = saved.id {
            self.written(id).await;
        }
        Ok(SuperHeroDto::from(saved))
    }

    /// Apply the `Set` fields of a patch; `None` when the id does not exist
    ///
    /// A patch without `Set` fields returns the stored record untouched.
    pub async fn partial_update(
        &self,
        id: i64,
        patch: SuperHeroPatch,
    ) -> RepositoryResult<Option<SuperHeroDto>> {
        debug!(id, ?patch, "Request to partially update SuperHero");
        let Some(mut entity) = self.repository.find_by_id(id).await? else {
            return Ok(None);
        };
        if !patch.has_updates() {
            return Ok(Some(SuperHeroDto::from(entity)));
        }
        entity.apply_patch(patch);
        let saved = self.repository.save(entity).await?;
        self.written(id).await;
        Ok(Some(SuperHeroDto::from(saved)))
    }

    /// One page of all records
    pub async fn find_all(&self, page: &PageRequest) -> RepositoryResult<Page<SuperHeroDto>> {
        debug!("Request to get all SuperHeroes");
        let page = self.repository.find_page(&SuperHeroQuery::all(), page).await?;
        Ok(page.map(SuperHeroDto::from))
    }

    /// Load one record through the cache; only found records are cached
    pub async fn find_one(&self, id: i64) -> RepositoryResult<Option<SuperHeroDto>> {
        debug!("Request to get SuperHero : {}", id);
        match self.cache.get(id).await {
            Ok(Some(hit)) => return Ok(Some(hit)),
            Ok(None) => {}
            Err(e) => warn!(id, backend = self.cache.backend(), error = %e, "Cache read failed"),
        }

        let seen = self.writes.load(Ordering::SeqCst);
        let Some(entity) = self.repository.find_by_id(id).await? else {
            return Ok(None);
        };
        let dto = SuperHeroDto::from(entity);
        if let Err(e) = self.cache.put(id, &dto).await {
            warn!(id, backend = self.cache.backend(), error = %e, "Cache write failed");
        }
        if self.writes.load(Ordering::SeqCst) != seen {
            debug!(id, "SuperHero written during lookup, dropping cached copy");
            self.evict(id).await;
        }
        Ok(Some(dto))
    }

    /// Delete a record; a missing id is not an error
    pub async fn delete(&self, id: i64) -> RepositoryResult<()> {
        debug!("Request to delete SuperHero : {}", id);
        self.repository.delete_by_id(id).await?;
        self.written(id).await;
        Ok(())
    }

    async fn written(&self, id: i64) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.evict(id).await;
    }

    async fn evict(&self, id: i64) {
        if let Err(e) = self.cache.evict(id).await {
            warn!(id, backend = self.cache.backend(), error = %e, "Cache eviction failed");
        }
    }
}
