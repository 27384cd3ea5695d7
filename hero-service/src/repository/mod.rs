//! SuperHero persistence
//!
//! - [`SuperHeroRepository`]: the store port, implemented with plain `async fn`
//! - [`InMemorySuperHeroRepository`]: process-local store used by tests and
//!   when no `[database]` section is configured
//! - [`PgSuperHeroRepository`]: sqlx Postgres store (feature `database`)
//! - [`Specification`] / [`FilterCondition`]: AND-combined filters over
//!   [`SuperHeroField`]s
//! - [`PageRequest`] / [`Page`]: 0-based paging with sort keys
//!
//! # Example
//!
//! ```rust
//! use hero_service::domain::SuperHero;
//! use hero_service::repository::{
//!     FilterCondition, InMemorySuperHeroRepository, Specification, SuperHeroField,
//!     SuperHeroQuery, SuperHeroRepository,
//! };
//!
//! # tokio_test_block_on(async {
//! let repo = InMemorySuperHeroRepository::new();
//! repo.save(SuperHero::new().with_name("Storm").with_age(30)).await?;
//!
//! let adults = SuperHeroQuery::new(
//!     Specification::all().and(FilterCondition::gte(SuperHeroField::Age, 18)),
//! );
//! assert_eq!(repo.count(&adults).await?, 1);
//! # Ok::<(), hero_service::repository::RepositoryError>(())
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod error;
mod filter;
mod memory;
mod pagination;
#[cfg(feature = "database")]
mod postgres;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult};
pub use filter::{
    FilterCondition, FilterOperator, FilterValue, Specification, SuperHeroField, SuperHeroQuery,
};
pub use memory::InMemorySuperHeroRepository;
pub use pagination::{compare_by, OrderDirection, Page, PageRequest, Sort, DEFAULT_PAGE_SIZE};
#[cfg(feature = "database")]
pub use postgres::PgSuperHeroRepository;
pub use traits::SuperHeroRepository;
