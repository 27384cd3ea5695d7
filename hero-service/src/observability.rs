//! Structured logging and per-request timing

use std::time::Duration;

use axum::{
    http::{HeaderName, Request},
    response::Response,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, RequestTrackingConfig};
use crate::error::Result;
use crate::request_id::header_name;

/// Install the global JSON subscriber
///
/// `service.log_level` is parsed as an `EnvFilter` directive and falls back to
/// `info` when invalid. Calling this twice is an error.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| crate::error::Error::Internal(format!("Failed to install tracing: {}", e)))?;

    tracing::info!("Tracing initialized for service: {}", config.service.name);
    Ok(())
}

/// Span per request carrying method, path and request id
#[derive(Debug, Clone)]
pub struct RequestSpan {
    header: HeaderName,
}

impl RequestSpan {
    /// Span maker reading the id from the configured request id header
    pub fn new(config: &RequestTrackingConfig) -> Self {
        Self {
            header: header_name(config),
        }
    }

    fn request_id<'a, B>(&self, request: &'a Request<B>) -> &'a str {
        request
            .headers()
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %self.request_id(request),
        )
    }
}

/// Logs status and elapsed time once the response is ready
#[derive(Debug, Clone, Default)]
pub struct RequestTiming;

impl<B> OnResponse<B> for RequestTiming {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request Time : {} ms",
            latency.as_millis()
        );
    }
}

/// Trace layer wiring [`RequestSpan`] and [`RequestTiming`]
pub fn trace_layer(
    config: &RequestTrackingConfig,
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan, (), RequestTiming> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan::new(config))
        .on_request(())
        .on_response(RequestTiming)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_reports_error() {
        let config = Config::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[tokio::test]
    async fn test_trace_layer_wraps_router() {
        use axum::{body::Body, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(trace_layer(&RequestTrackingConfig::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "req_01h455vb4pex5vsknk084sn02q")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[test]
    fn test_span_reads_configured_request_id_header() {
        let config = RequestTrackingConfig {
            request_id_header: "x-correlation-id".to_string(),
            ..RequestTrackingConfig::default()
        };
        let span = RequestSpan::new(&config);
        let request = Request::builder()
            .header("x-correlation-id", "req_01h455vb4pex5vsknk084sn02q")
            .header("x-request-id", "other")
            .body(())
            .unwrap();
        assert_eq!(span.request_id(&request), "req_01h455vb4pex5vsknk084sn02q");

        let bare = Request::builder().body(()).unwrap();
        assert_eq!(span.request_id(&bare), "-");
    }
}
