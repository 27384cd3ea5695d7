//! Application services over the SuperHero store
//!
//! - [`SuperHeroQueryService`]: read-only criteria queries
//! - [`SuperHeroService`]: writes and cached single lookups

mod command;
mod query;

pub use command::SuperHeroService;
pub use query::SuperHeroQueryService;
