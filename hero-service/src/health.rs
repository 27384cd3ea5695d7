//! Health check handlers

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::repository::SuperHeroRepository;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Deployment environment from `service.environment`
    pub environment: String,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: HashMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe; 200 whenever the process serves requests
pub async fn health<R: SuperHeroRepository>(State(state): State<AppState<R>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        environment: state.config().service.environment.clone(),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe
///
/// Pings the store; 503 when it is unreachable. The cache is reported but
/// never blocks readiness, since reads fall back to the store.
pub async fn readiness<R: SuperHeroRepository>(
    State(state): State<AppState<R>>,
) -> impl IntoResponse {
    let mut dependencies = HashMap::new();

    let store = match state.repository().ping().await {
        Ok(()) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            DependencyStatus {
                healthy: false,
                message: Some(if e.is_unavailable() {
                    "Unreachable".to_string()
                } else {
                    format!("{} failure", e.kind)
                }),
            }
        }
    };
    let ready = store.healthy;
    dependencies.insert("store".to_string(), store);
    dependencies.insert(
        "cache".to_string(),
        DependencyStatus {
            healthy: true,
            message: Some(state.cache_backend().to_string()),
        },
    );

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let response = ReadinessResponse {
        ready,
        service: state.config().service.name.clone(),
        dependencies,
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryEntityCache;
    use crate::config::Config;
    use crate::domain::SuperHero;
    use crate::repository::{
        InMemorySuperHeroRepository, Page, PageRequest, RepositoryError, RepositoryResult,
        SuperHeroQuery,
    };
    use axum::{body::Body, http::Request, routing::get, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct DownRepository;

    impl SuperHeroRepository for DownRepository {
        async fn find_by_id(&self, _id: i64) -> RepositoryResult<Option<SuperHero>> {
            Ok(None)
        }

        async fn find_all(&self, _query: &SuperHeroQuery) -> RepositoryResult<Vec<SuperHero>> {
            Ok(Vec::new())
        }

        async fn find_page(
            &self,
            _query: &SuperHeroQuery,
            page: &PageRequest,
        ) -> RepositoryResult<Page<SuperHero>> {
            Ok(Page::new(Vec::new(), page, 0))
        }

        async fn count(&self, _query: &SuperHeroQuery) -> RepositoryResult<u64> {
            Ok(0)
        }

        async fn exists_by_id(&self, _id: i64) -> RepositoryResult<bool> {
            Ok(false)
        }

        async fn save(&self, entity: SuperHero) -> RepositoryResult<SuperHero> {
            Ok(entity)
        }

        async fn delete_by_id(&self, _id: i64) -> RepositoryResult<()> {
            Ok(())
        }

        async fn ping(&self) -> RepositoryResult<()> {
            Err(RepositoryError::connection_failed("connection refused"))
        }
    }

    fn router<R: SuperHeroRepository>(repository: R) -> Router {
        let state = AppState::new(
            Config::default(),
            repository,
            Arc::new(InMemoryEntityCache::new()),
        );
        Router::new()
            .route("/health", get(health::<R>))
            .route("/ready", get(readiness::<R>))
            .with_state(state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_is_always_ok() {
        let (status, body) = get_json(router(DownRepository), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "hero-service");
        assert_eq!(body["environment"], "dev");
    }

    #[tokio::test]
    async fn test_ready_with_reachable_store() {
        let (status, body) = get_json(router(InMemorySuperHeroRepository::new()), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["dependencies"]["cache"]["message"], "memory");
    }

    #[tokio::test]
    async fn test_not_ready_when_store_is_down() {
        let (status, body) = get_json(router(DownRepository), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["ready"], false);
        assert_eq!(body["dependencies"]["store"]["healthy"], false);
        assert_eq!(body["dependencies"]["store"]["message"], "Unreachable");
    }
}
