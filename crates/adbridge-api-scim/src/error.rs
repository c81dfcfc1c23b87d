//! SCIM-specific error types conforming to RFC 7644 Section 3.12.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adbridge_connector_ad::{classify, AdError, DirectoryErrorKind};

/// SCIM error types as defined in RFC 7644 Section 3.12.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScimErrorType {
    /// Uniqueness constraint violated (e.g., duplicate userName).
    Uniqueness,
    /// Target resource not found for operation.
    NoTarget,
    /// Attribute value is invalid.
    InvalidValue,
}

impl std::fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScimErrorType::Uniqueness => "uniqueness",
            ScimErrorType::NoTarget => "noTarget",
            ScimErrorType::InvalidValue => "invalidValue",
        };
        write!(f, "{s}")
    }
}

/// SCIM error response envelope as defined in RFC 7644.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimErrorResponse {
    /// Always `["urn:ietf:params:scim:api:messages:2.0:Error"]`.
    pub schemas: Vec<String>,
    /// Optional SCIM error subcode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scim_type: Option<String>,
    /// Human-readable error message. For directory failures this is the
    /// raw tool stderr so operators can diagnose domain-side problems
    /// through the identity provider's provisioning log.
    pub detail: String,
    /// HTTP status code.
    pub status: u16,
}

impl ScimErrorResponse {
    /// SCIM Error schema URI.
    pub const SCHEMA: &'static str = "urn:ietf:params:scim:api:messages:2.0:Error";

    /// Create a new SCIM error response.
    pub fn new(
        status: StatusCode,
        detail: impl Into<String>,
        scim_type: Option<ScimErrorType>,
    ) -> Self {
        Self {
            schemas: vec![Self::SCHEMA.to_string()],
            scim_type: scim_type.map(|t| t.to_string()),
            detail: detail.into(),
            status: status.as_u16(),
        }
    }
}

/// SCIM API errors.
#[derive(Debug, Error)]
pub enum ScimError {
    /// Invalid or missing bearer token.
    #[error("Invalid or missing bearer token")]
    Unauthorized,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violated.
    #[error("A user with {field} '{value}' already exists")]
    Conflict { field: String, value: String },

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A directory command failed; `detail` carries the tool stderr.
    #[error("{detail}")]
    Directory {
        kind: DirectoryErrorKind,
        detail: String,
    },
}

impl ScimError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScimError::Unauthorized => StatusCode::UNAUTHORIZED,
            ScimError::NotFound(_) => StatusCode::NOT_FOUND,
            ScimError::Conflict { .. } => StatusCode::CONFLICT,
            ScimError::Validation(_) => StatusCode::BAD_REQUEST,
            ScimError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScimError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ScimError::Directory { kind, .. } => match kind {
                DirectoryErrorKind::AlreadyExists => StatusCode::CONFLICT,
                DirectoryErrorKind::NotFound => StatusCode::NOT_FOUND,
                DirectoryErrorKind::PasswordPolicy | DirectoryErrorKind::InvalidRequest => {
                    StatusCode::BAD_REQUEST
                }
                DirectoryErrorKind::AccessDenied => StatusCode::FORBIDDEN,
                DirectoryErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the SCIM error subcode for this error.
    #[must_use]
    pub fn scim_type(&self) -> Option<ScimErrorType> {
        match self {
            ScimError::Conflict { .. } => Some(ScimErrorType::Uniqueness),
            ScimError::NotFound(_) => Some(ScimErrorType::NoTarget),
            ScimError::Validation(_) => Some(ScimErrorType::InvalidValue),
            ScimError::Directory { kind, .. } => match kind {
                DirectoryErrorKind::AlreadyExists => Some(ScimErrorType::Uniqueness),
                DirectoryErrorKind::NotFound => Some(ScimErrorType::NoTarget),
                DirectoryErrorKind::PasswordPolicy | DirectoryErrorKind::InvalidRequest => {
                    Some(ScimErrorType::InvalidValue)
                }
                DirectoryErrorKind::AccessDenied | DirectoryErrorKind::Unknown => None,
            },
            _ => None,
        }
    }

    /// Convert to a SCIM error response envelope.
    #[must_use]
    pub fn to_response(&self) -> ScimErrorResponse {
        ScimErrorResponse::new(self.status_code(), self.to_string(), self.scim_type())
    }
}

impl From<AdError> for ScimError {
    fn from(err: AdError) -> Self {
        let detail = err.stderr();
        ScimError::Directory {
            kind: classify(&detail),
            detail,
        }
    }
}

impl IntoResponse for ScimError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.to_response())).into_response();

        // Set SCIM content type
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/scim+json"),
        );

        response
    }
}

/// Result type alias for SCIM operations.
pub type ScimResult<T> = Result<T, ScimError>;
