//! API error type for the SuperHero endpoints
//!
//! Every failure leaves a handler as an [`ApiError`]. The response carries a
//! JSON problem body and, for bad requests, the `X-{app}-error` /
//! `X-{app}-params` alert headers.
//!
//! ```rust
//! use hero_service::handlers::{ApiError, ApiErrorKind, ApiOperation};
//!
//! let error = ApiError::bad_request(ApiOperation::Create, "A new superHero cannot already have an ID", "idexists");
//! assert_eq!(error.kind, ApiErrorKind::BadRequest);
//! assert_eq!(error.error_key, "idexists");
//! ```

use std::fmt;

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::criteria::CriteriaError;
use crate::domain::ENTITY_NAME;
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Endpoint operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Filtered, paged listing
    List,
    /// Filtered count
    Count,
    /// Single lookup
    Get,
    /// POST
    Create,
    /// PUT
    Update,
    /// PATCH
    PartialUpdate,
    /// DELETE
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Count => write!(f, "count"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::PartialUpdate => write!(f, "partial_update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl From<RepositoryOperation> for ApiOperation {
    fn from(op: RepositoryOperation) -> Self {
        match op {
            RepositoryOperation::FindById | RepositoryOperation::Exists => Self::Get,
            RepositoryOperation::FindAll | RepositoryOperation::FindPage => Self::List,
            RepositoryOperation::Count | RepositoryOperation::Ping => Self::Count,
            RepositoryOperation::Save => Self::Update,
            RepositoryOperation::Delete => Self::Delete,
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Invalid id, body or parameter
    BadRequest,
    /// Entity does not exist
    NotFound,
    /// Store failure
    InternalError,
    /// Store unreachable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// HTTP status for this kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Error key used when the caller supplies none
    #[must_use]
    pub const fn default_key(&self) -> &'static str {
        match self {
            Self::BadRequest => "badrequest",
            Self::NotFound => "notfound",
            Self::InternalError => "internal",
            Self::ServiceUnavailable => "unavailable",
        }
    }
}

/// Structured API error
///
/// `error_key` is the short machine key rendered as `error.<key>`.
/// `alert_app` names the application for the `X-{app}-*` headers; without it
/// no alert headers are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable message, safe to show to clients
    pub message: String,
    /// Entity the request addressed
    pub entity_name: String,
    /// Machine key, e.g. `idnull`
    pub error_key: String,
    /// Application name for alert headers
    pub alert_app: Option<String>,
}

impl ApiError {
    /// Create an error with the kind's default key
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_name: ENTITY_NAME.to_string(),
            error_key: kind.default_key().to_string(),
            alert_app: None,
        }
    }

    /// 400 with an explicit error key
    pub fn bad_request(
        operation: ApiOperation,
        message: impl Into<String>,
        error_key: impl Into<String>,
    ) -> Self {
        Self {
            error_key: error_key.into(),
            ..Self::new(operation, ApiErrorKind::BadRequest, message)
        }
    }

    /// 404 for a missing id
    pub fn not_found(operation: ApiOperation, id: i64) -> Self {
        Self::new(
            operation,
            ApiErrorKind::NotFound,
            format!("Entity not found [{}: {}]", ENTITY_NAME, id),
        )
    }

    /// 500 with a generic message
    pub fn internal(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::InternalError, "An internal error occurred")
    }

    /// 503 with a generic message
    pub fn service_unavailable(operation: ApiOperation) -> Self {
        Self::new(
            operation,
            ApiErrorKind::ServiceUnavailable,
            "Service temporarily unavailable",
        )
    }

    /// Attach the application name used in alert headers
    #[must_use]
    pub fn with_alert_app(mut self, app: impl Into<String>) -> Self {
        self.alert_app = Some(app.into());
        self
    }

    /// Transient failure that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }

    fn alert_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.kind != ApiErrorKind::BadRequest {
            return headers;
        }
        let Some(app) = &self.alert_app else {
            return headers;
        };
        let entries = [
            (format!("X-{}-error", app), format!("error.{}", self.error_key)),
            (format!("X-{}-params", app), self.entity_name.clone()),
        ];
        for (name, value) in entries {
            match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(app = %app, "Skipping alert header with invalid name or value"),
            }
        }
        headers
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {} (error.{})",
            self.kind, self.operation, self.message, self.error_key
        )
    }
}

impl std::error::Error for ApiError {}

/// Problem body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorBody {
    pub title: String,
    pub status: u16,
    pub entity_name: String,
    pub error_key: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                error_key = %self.error_key,
                "API error: {}", self.message
            );
        }

        let headers = self.alert_headers();
        let body = ApiErrorBody {
            message: format!("error.{}", self.error_key),
            title: self.message,
            status: status.as_u16(),
            entity_name: self.entity_name,
            error_key: self.error_key,
        };

        (status, headers, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        tracing::error!(error = %err, "Store operation failed");
        let operation = ApiOperation::from(err.operation);
        match err.kind {
            RepositoryErrorKind::NotFound => Self {
                error_key: "idnotfound".to_string(),
                ..Self::new(operation, ApiErrorKind::NotFound, "Entity not found")
            },
            _ if err.is_retriable() => Self::service_unavailable(operation),
            _ => Self::internal(operation),
        }
    }
}

impl From<CriteriaError> for ApiError {
    fn from(err: CriteriaError) -> Self {
        let key = match err {
            CriteriaError::InvalidPaging(_) => "invalidpaging",
            CriteriaError::InvalidValue { .. } | CriteriaError::UnsupportedOperator { .. } => {
                "invalidcriteria"
            }
        };
        Self::bad_request(ApiOperation::List, err.to_string(), key)
    }
}
