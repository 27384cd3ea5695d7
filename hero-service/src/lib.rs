//! # hero-service
//!
//! REST service for SuperHero records: criteria filtering, paging with
//! `Link` headers, partial updates and a read-through entity cache.
//!
//! ## Layers
//!
//! - [`handlers`]: axum routes under `/api/super-heroes`
//! - [`service`]: command and query services
//! - [`criteria`]: `<field>.<operator>=<value>` filters
//! - [`repository`]: store trait with in-memory and Postgres backends
//! - [`cache`]: entity cache (in-memory, none, Redis)
//!
//! ## Example
//!
//! ```rust,no_run
//! use hero_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let cache = build_entity_cache(&config).await?;
//!     let state = AppState::new(config.clone(), InMemorySuperHeroRepository::new(), cache);
//!
//!     Server::new(config).serve(app(state)).await
//! }
//! ```

pub mod cache;
pub mod config;
pub mod criteria;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod observability;
pub mod repository;
pub mod request_id;
pub mod server;
pub mod service;
pub mod state;

mod backoff;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "cache")]
pub mod redis_pool;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{
        build_entity_cache, EntityCache, InMemoryEntityCache, NoopEntityCache, SharedEntityCache,
    };

    #[cfg(feature = "cache")]
    pub use crate::cache::RedisEntityCache;

    pub use crate::config::{CacheBackend, Config};
    pub use crate::criteria::{CriteriaError, RangeFilter, StringFilter, SuperHeroCriteria};
    pub use crate::domain::{FieldPatch, SuperHero, SuperHeroDto, SuperHeroPatch};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        InMemorySuperHeroRepository, OrderDirection, Page, PageRequest, RepositoryError,
        RepositoryErrorKind, RepositoryResult, Sort, SuperHeroField, SuperHeroRepository,
    };

    #[cfg(feature = "database")]
    pub use crate::repository::PgSuperHeroRepository;

    pub use crate::request_id::RequestId;
    pub use crate::server::{app, Server};
    pub use crate::service::{SuperHeroQueryService, SuperHeroService};
    pub use crate::state::AppState;

    pub use axum::Router;

    // Re-export tracing macros
    pub use tracing::{debug, error, info, warn};
}
