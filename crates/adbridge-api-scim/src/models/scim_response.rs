//! SCIM response and message schemas (RFC 7644).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// SCIM List Response (RFC 7644 Section 3.4.2).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScimListResponse<T> {
    /// SCIM schemas.
    pub schemas: Vec<String>,

    /// Total number of results matching the query.
    pub total_results: i64,

    /// 1-based index of the first result in this page (the clamped value
    /// the client sent, echoed back).
    pub start_index: i64,

    /// Number of resources actually returned in this page.
    pub items_per_page: i64,

    /// The resources in this page.
    #[serde(rename = "Resources")]
    pub resources: Vec<T>,
}

impl<T> ScimListResponse<T> {
    /// SCIM List Response schema URI.
    pub const SCHEMA: &'static str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

    /// Create a new list response.
    #[must_use]
    pub fn new(resources: Vec<T>, total_results: i64, start_index: i64) -> Self {
        let items_per_page = resources.len() as i64;
        Self {
            schemas: vec![Self::SCHEMA.to_string()],
            total_results,
            start_index,
            items_per_page,
            resources,
        }
    }
}

/// Type alias for user list responses (dynamic resource bodies).
pub type ScimUserListResponse = ScimListResponse<serde_json::Value>;

/// SCIM PATCH operation (RFC 7644 Section 3.5.2).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScimPatchOp {
    /// Operation type: add, remove, or replace (case-insensitive).
    pub op: String,

    /// Attribute path (e.g., `displayName`, `emails[type eq \"work\"].value`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Value to set (for add/replace operations).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub value: Option<serde_json::Value>,
}

/// SCIM PATCH request (RFC 7644 Section 3.5.2).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScimPatchRequest {
    /// SCIM schemas.
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Operations to perform.
    #[serde(rename = "Operations", default)]
    pub operations: Vec<ScimPatchOp>,
}

impl ScimPatchRequest {
    /// SCIM Patch Operation schema URI.
    pub const SCHEMA: &'static str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
}

/// Pagination parameters from the query string.
#[derive(Debug, Clone, ToSchema)]
pub struct ScimPagination {
    /// 1-based start index.
    pub start_index: i64,
    /// Items per page.
    pub count: i64,
}

impl ScimPagination {
    /// Default items per page.
    pub const DEFAULT_COUNT: i64 = 100;

    /// Maximum items per page.
    pub const MAX_COUNT: i64 = 200;

    /// Create pagination from query parameters, clamping out-of-range
    /// values instead of rejecting them.
    #[must_use]
    pub fn from_query(start_index: Option<i64>, count: Option<i64>) -> Self {
        Self {
            start_index: start_index.unwrap_or(1).max(1),
            count: count
                .unwrap_or(Self::DEFAULT_COUNT)
                .clamp(1, Self::MAX_COUNT),
        }
    }

    /// SQL offset (0-based).
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.start_index - 1).max(0)
    }

    /// SQL limit.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.count
    }
}

impl Default for ScimPagination {
    fn default() -> Self {
        Self::from_query(None, None)
    }
}
