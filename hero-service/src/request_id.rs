//! Request correlation ids
//!
//! Every request without an incoming id gets a TypeID of the form
//! `req_<base32 uuidv7>`; ids sort by creation time. The id is echoed back on
//! the response and recorded on the request span.
//!
//! ```rust
//! use hero_service::request_id::RequestId;
//!
//! let id = RequestId::new();
//! assert!(id.as_str().starts_with("req_"));
//! ```

use std::fmt;

use axum::http::{HeaderName, Request};
use mti::prelude::*;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId as TowerRequestId, SetRequestIdLayer,
};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;

use crate::config::RequestTrackingConfig;

/// Headers hidden from request logs
pub const SENSITIVE_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("authorization"),
    HeaderName::from_static("cookie"),
    HeaderName::from_static("set-cookie"),
    HeaderName::from_static("x-api-key"),
];

/// Time-sortable request identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// Prefix of every request id
    pub const PREFIX: &'static str = "req";

    /// Generate a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// The full id, prefix included
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates [`RequestId`]s for tower-http's request id layers
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let value = axum::http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(value))
    }
}

/// Configured request id header, `x-request-id` when the name is invalid
pub(crate) fn header_name(config: &RequestTrackingConfig) -> HeaderName {
    HeaderName::from_bytes(config.request_id_header.as_bytes())
        .unwrap_or_else(|_| HeaderName::from_static("x-request-id"))
}

/// Layer assigning an id to requests that carry none
pub fn set_request_id_layer(config: &RequestTrackingConfig) -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::new(header_name(config), MakeTypedRequestId)
}

/// Layer copying the request id onto the response
pub fn propagate_request_id_layer(config: &RequestTrackingConfig) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name(config))
}

/// Layer marking credentials as sensitive so traces omit them
pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_new() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        assert_eq!(id.as_str().len(), 30);
    }

    #[test]
    fn test_request_ids_are_time_ordered() {
        let first = RequestId::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = RequestId::new();
        assert!(first < second);
    }

    #[test]
    fn test_make_typed_request_id() {
        let request = Request::builder().body(()).unwrap();
        let id = MakeTypedRequestId.make_request_id(&request).unwrap();
        let value = id.into_header_value();
        assert!(value.to_str().unwrap().starts_with("req_"));
    }

    #[test]
    fn test_invalid_configured_header_falls_back() {
        let config = RequestTrackingConfig {
            request_id_header: "bad header".to_string(),
            ..RequestTrackingConfig::default()
        };
        assert_eq!(header_name(&config), "x-request-id");
    }
}
