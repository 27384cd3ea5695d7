//! Application state shared across handlers

use std::sync::Arc;

use crate::cache::SharedEntityCache;
use crate::config::Config;
use crate::repository::SuperHeroRepository;
use crate::service::{SuperHeroQueryService, SuperHeroService};

/// State handed to every handler through axum's `State` extractor
///
/// Generic over the store so tests can run the full router on the in-memory
/// repository. Cloning is cheap: every part sits behind an `Arc`.
pub struct AppState<R> {
    config: Arc<Config>,
    repository: Arc<R>,
    cache: SharedEntityCache,
    heroes: SuperHeroService<R>,
    queries: SuperHeroQueryService<R>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            heroes: self.heroes.clone(),
            queries: self.queries.clone(),
        }
    }
}

impl<R: SuperHeroRepository> AppState<R> {
    /// Wire the services over one store and cache
    pub fn new(config: Config, repository: R, cache: SharedEntityCache) -> Self {
        let repository = Arc::new(repository);
        Self {
            config: Arc::new(config),
            heroes: SuperHeroService::new(Arc::clone(&repository), Arc::clone(&cache)),
            queries: SuperHeroQueryService::new(Arc::clone(&repository)),
            repository,
            cache,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name used in `X-{app}-*` headers
    pub fn application_name(&self) -> &str {
        &self.config.service.application_name
    }

    /// Write and single-lookup service
    pub fn heroes(&self) -> &SuperHeroService<R> {
        &self.heroes
    }

    /// Criteria query service
    pub fn queries(&self) -> &SuperHeroQueryService<R> {
        &self.queries
    }

    /// The underlying store
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Name of the active cache backend
    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopEntityCache;
    use crate::repository::InMemorySuperHeroRepository;

    #[tokio::test]
    async fn test_clones_share_the_store() {
        let state = AppState::new(
            Config::default(),
            InMemorySuperHeroRepository::new(),
            Arc::new(NoopEntityCache),
        );
        let clone = state.clone();
        clone
            .heroes()
            .save(crate::domain::SuperHeroDto::default())
            .await
            .unwrap();

        assert!(state.repository().exists_by_id(1).await.unwrap());
        assert_eq!(state.application_name(), "heroApp");
        assert_eq!(state.cache_backend(), "none");
    }
}
