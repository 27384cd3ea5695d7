//! HTTP server with graceful shutdown

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
};

use crate::{
    config::Config,
    error::Result,
    handlers,
    health::{health, readiness},
    observability::trace_layer,
    repository::SuperHeroRepository,
    request_id::{propagate_request_id_layer, sensitive_headers_layer, set_request_id_layer},
    state::AppState,
};

/// SuperHero and health routes bound to their state
pub fn app<R: SuperHeroRepository>(state: AppState<R>) -> Router {
    handlers::routes::<R>()
        .route("/health", get(health::<R>))
        .route("/ready", get(readiness::<R>))
        .with_state(state)
}

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wrap a router in the configured middleware stack
    ///
    /// Layers added later run first, so the request id is set before the
    /// trace span opens and panics are caught closest to the handler.
    pub fn with_middleware(&self, app: Router) -> Router {
        let middleware = &self.config.middleware;
        let tracking = &middleware.request_tracking;
        let body_limit = middleware.body_limit_mb * 1024 * 1024;

        let app = if middleware.catch_panic {
            app.layer(CatchPanicLayer::new())
        } else {
            app
        };
        let app = app
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.service.timeout(),
            ))
            .layer(RequestBodyLimitLayer::new(body_limit));
        let app = if middleware.compression {
            app.layer(CompressionLayer::new())
        } else {
            app
        };
        let app = if tracking.propagate_headers {
            app.layer(propagate_request_id_layer(tracking))
        } else {
            app
        };
        let app = app.layer(trace_layer(tracking));
        let app = if tracking.mask_sensitive_headers {
            app.layer(sensitive_headers_layer())
        } else {
            app
        };
        let app = if tracking.request_id_enabled {
            app.layer(set_request_id_layer(tracking))
        } else {
            app
        };
        app.layer(self.build_cors_layer())
    }

    /// Run the server with the given router until SIGINT or SIGTERM
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = self.with_middleware(app);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!(
            catch_panic = middleware.catch_panic,
            request_id = middleware.request_tracking.request_id_enabled,
            request_id_header = %middleware.request_tracking.request_id_header,
            mask_sensitive_headers = middleware.request_tracking.mask_sensitive_headers,
            body_limit_mb = middleware.body_limit_mb,
            compression = middleware.compression,
            cors_mode = %middleware.cors_mode,
            timeout_secs = self.config.service.timeout_secs,
            "Middleware configuration"
        );
    }

    fn build_cors_layer(&self) -> CorsLayer {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                CorsLayer::permissive()
            }
            "restrictive" | "disabled" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                CorsLayer::new()
            }
            other => {
                tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
                CorsLayer::permissive()
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM
///
/// A signal handler that cannot be installed never fires; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopEntityCache;
    use crate::repository::InMemorySuperHeroRepository;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn layered(config: Config) -> Router {
        let state = AppState::new(
            config.clone(),
            InMemorySuperHeroRepository::new(),
            Arc::new(NoopEntityCache),
        );
        Server::new(config).with_middleware(app(state))
    }

    #[test]
    fn test_server_creation() {
        let config = Config::default();
        let server = Server::new(config.clone());
        assert_eq!(server.config().service.port, config.service.port);
    }

    #[tokio::test]
    async fn test_generated_request_id_is_returned() {
        let response = layered(Config::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(id.starts_with("req_"));
    }

    #[tokio::test]
    async fn test_client_request_id_is_kept() {
        let response = layered(Config::default())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "client-chosen")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-chosen");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 0;
        let response = layered(config)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/super-heroes")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, "16")
                    .body(Body::from(r#"{"name":"Storm"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = layered(Config::default())
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
