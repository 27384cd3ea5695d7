//! REST handlers for `/api/super-heroes`

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::error::{ApiError, ApiOperation};
use super::headers::{alert_headers, pagination_headers, EntityAlert};
use super::query::page_request_from_pairs;
use crate::criteria::SuperHeroCriteria;
use crate::domain::{SuperHeroDto, SuperHeroPatch, ENTITY_NAME};
use crate::repository::SuperHeroRepository;
use crate::state::AppState;

/// Collection path
pub const BASE_PATH: &str = "/api/super-heroes";

type QueryPairs = Query<Vec<(String, String)>>;

fn invalid<R: SuperHeroRepository>(
    state: &AppState<R>,
    operation: ApiOperation,
    message: &str,
    key: &str,
) -> ApiError {
    ApiError::bad_request(operation, message, key).with_alert_app(state.application_name())
}

/// Reject a body id that is missing, differs from the path or names no record
async fn check_target<R: SuperHeroRepository>(
    state: &AppState<R>,
    operation: ApiOperation,
    path_id: i64,
    body_id: Option<i64>,
) -> Result<(), ApiError> {
    let Some(body_id) = body_id else {
        return Err(invalid(state, operation, "Invalid id", "idnull"));
    };
    if body_id != path_id {
        return Err(invalid(state, operation, "Invalid ID", "idinvalid"));
    }
    if !state.repository().exists_by_id(path_id).await? {
        return Err(invalid(state, operation, "Entity not found", "idnotfound"));
    }
    Ok(())
}

fn criteria_from<R: SuperHeroRepository>(
    state: &AppState<R>,
    pairs: &[(String, String)],
) -> Result<SuperHeroCriteria, ApiError> {
    SuperHeroCriteria::from_query_pairs(pairs)
        .map_err(|e| ApiError::from(e).with_alert_app(state.application_name()))
}

/// `POST /api/super-heroes`
pub async fn create_super_hero<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Json(dto): Json<SuperHeroDto>,
) -> Result<Response, ApiError> {
    debug!("REST request to save SuperHero : {}", dto);
    if dto.id.is_some() {
        return Err(invalid(
            &state,
            ApiOperation::Create,
            &format!("A new {} cannot already have an ID", ENTITY_NAME),
            "idexists",
        ));
    }

    let saved = state.heroes().save(dto).await?;
    let id = saved
        .id
        .ok_or_else(|| ApiError::internal(ApiOperation::Create))?;
    let mut headers = alert_headers(state.application_name(), EntityAlert::Created, id);
    let location = HeaderValue::try_from(format!("{}/{}", BASE_PATH, id))
        .map_err(|_| ApiError::internal(ApiOperation::Create))?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(saved)).into_response())
}

/// `PUT /api/super-heroes/{id}`: full overwrite, absent fields become null
pub async fn update_super_hero<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
    Json(dto): Json<SuperHeroDto>,
) -> Result<Response, ApiError> {
    debug!("REST request to update SuperHero : {}, {}", id, dto);
    check_target(&state, ApiOperation::Update, id, dto.id).await?;

    let saved = state.heroes().update(dto).await?;
    let headers = alert_headers(state.application_name(), EntityAlert::Updated, id);
    Ok((headers, Json(saved)).into_response())
}

/// `PATCH /api/super-heroes/{id}`: merge patch, absent or null fields are kept
pub async fn partial_update_super_hero<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
    Json(patch): Json<SuperHeroPatch>,
) -> Result<Response, ApiError> {
    debug!(id, ?patch, "REST request to partial update SuperHero partially");
    check_target(&state, ApiOperation::PartialUpdate, id, patch.id).await?;

    match state.heroes().partial_update(id, patch).await? {
        Some(saved) => {
            let headers = alert_headers(state.application_name(), EntityAlert::Updated, id);
            Ok((headers, Json(saved)).into_response())
        }
        None => Err(ApiError::not_found(ApiOperation::PartialUpdate, id)),
    }
}

/// `GET /api/super-heroes`: filtered page with `X-Total-Count` and `Link`
pub async fn list_super_heroes<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    uri: Uri,
    Query(pairs): QueryPairs,
) -> Result<Response, ApiError> {
    let criteria = criteria_from(&state, &pairs)?;
    let page_request = page_request_from_pairs(&pairs)
        .map_err(|e| ApiError::from(e).with_alert_app(state.application_name()))?;
    debug!("REST request to get SuperHeroes by criteria: {}", criteria);

    let page = state
        .queries()
        .find_page_by_criteria((!criteria.is_empty()).then_some(&criteria), &page_request)
        .await?;
    let headers = pagination_headers(uri.path(), uri.query(), &page);
    Ok((headers, Json(page.content)).into_response())
}

/// `GET /api/super-heroes/count`
pub async fn count_super_heroes<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Query(pairs): QueryPairs,
) -> Result<Json<u64>, ApiError> {
    let criteria = criteria_from(&state, &pairs)?;
    debug!("REST request to count SuperHeroes by criteria: {}", criteria);

    let count = state
        .queries()
        .count_by_criteria((!criteria.is_empty()).then_some(&criteria))
        .await?;
    Ok(Json(count))
}

/// `GET /api/super-heroes/{id}`
pub async fn get_super_hero<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
) -> Result<Json<SuperHeroDto>, ApiError> {
    debug!("REST request to get SuperHero : {}", id);
    state
        .heroes()
        .find_one(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ApiOperation::Get, id))
}

/// `DELETE /api/super-heroes/{id}`
pub async fn delete_super_hero<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    debug!("REST request to delete SuperHero : {}", id);
    state.heroes().delete(id).await?;
    let headers = alert_headers(state.application_name(), EntityAlert::Deleted, id);
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}
