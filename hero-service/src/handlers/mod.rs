//! HTTP surface for SuperHero records
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/super-heroes` | [`create_super_hero`] |
//! | `GET /api/super-heroes` | [`list_super_heroes`] |
//! | `GET /api/super-heroes/count` | [`count_super_heroes`] |
//! | `GET /api/super-heroes/{id}` | [`get_super_hero`] |
//! | `PUT /api/super-heroes/{id}` | [`update_super_hero`] |
//! | `PATCH /api/super-heroes/{id}` | [`partial_update_super_hero`] |
//! | `DELETE /api/super-heroes/{id}` | [`delete_super_hero`] |
//!
//! Failures are returned as [`ApiError`], which renders the status, a JSON
//! problem body and the alert headers.

mod error;
mod headers;
mod query;
mod super_hero;

use axum::{
    routing::{get, post},
    Router,
};

use crate::repository::SuperHeroRepository;
use crate::state::AppState;

pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use headers::{alert_headers, pagination_headers, EntityAlert, TOTAL_COUNT_HEADER};
pub use query::{page_request_from_pairs, MAX_PAGE_SIZE};
pub use super_hero::{
    count_super_heroes, create_super_hero, delete_super_hero, get_super_hero, list_super_heroes,
    partial_update_super_hero, update_super_hero, BASE_PATH,
};

/// SuperHero routes, ready to be merged and given state
pub fn routes<R: SuperHeroRepository>() -> Router<AppState<R>> {
    Router::new()
        .route(
            BASE_PATH,
            post(create_super_hero::<R>).get(list_super_heroes::<R>),
        )
        .route("/api/super-heroes/count", get(count_super_heroes::<R>))
        .route(
            "/api/super-heroes/{id}",
            get(get_super_hero::<R>)
                .put(update_super_hero::<R>)
                .patch(partial_update_super_hero::<R>)
                .delete(delete_super_hero::<R>),
        )
}
