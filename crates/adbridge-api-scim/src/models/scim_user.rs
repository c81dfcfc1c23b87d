//! SCIM User resource pieces (RFC 7643).
//!
//! The User resource body itself is a dynamic JSON document: the identity
//! provider owns its shape, the cache stores it verbatim, and the patch
//! applier and attribute mapper read it with tolerant accessors. Only the
//! envelope metadata is typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// SCIM Core User schema URI.
pub const USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

/// SCIM resource metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScimMeta {
    /// Resource type; always `"User"` for this service.
    pub resource_type: String,

    /// When the resource was created.
    pub created: DateTime<Utc>,

    /// When the resource was last modified.
    pub last_modified: DateTime<Utc>,

    /// Resource location URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ScimMeta {
    /// Build the metadata block for a User resource.
    #[must_use]
    pub fn user(
        id: &str,
        base_url: &str,
        created: DateTime<Utc>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_type: "User".to_string(),
            created,
            last_modified,
            location: Some(format!("{base_url}/scim/v2/Users/{id}")),
        }
    }
}
