//! Provisioning cache entity model.
//!
//! Each row links a SCIM user `id` to its Active Directory counterpart and
//! carries two JSON documents: `scim_resource` (the SCIM view, what the
//! identity provider last told us) and `ad_resource` (the AD view, what
//! the directory last reported on read-back).
//!
//! Expected columns:
//! `id TEXT PRIMARY KEY`, `ad_object_guid TEXT`,
//! `sam_account_name TEXT UNIQUE`, `scim_resource JSONB NOT NULL`,
//! `ad_resource JSONB`, `sync_status TEXT NOT NULL`,
//! `last_error TEXT`, `created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()`,
//! `updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Maximum stored length of `last_error`.
const MAX_LAST_ERROR_CHARS: usize = 2000;

/// Synchronization state between the cache and the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// The directory reflects the SCIM view; `last_error` is clear.
    Synced,
    /// The SCIM view was written ahead of the directory call.
    Pending,
    /// The last directory write failed; `last_error` holds the reason.
    Error,
}

impl SyncStatus {
    /// Stored string form of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cache columns a SCIM filter may target.
///
/// Only attributes backed by a dedicated column are filterable; everything
/// else falls back to an unfiltered page at the processor level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheColumn {
    Id,
    SamAccountName,
}

impl CacheColumn {
    /// The SQL identifier for this column. Values come from this fixed set,
    /// never from request input.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            CacheColumn::Id => "id",
            CacheColumn::SamAccountName => "sam_account_name",
        }
    }
}

/// An equality predicate over a dedicated cache column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFilter {
    pub column: CacheColumn,
    pub value: String,
}

/// A provisioning cache row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserMapping {
    /// SCIM resource id (primary key). Equals the IdP's `externalId` when
    /// one was supplied at creation, else a generated UUID.
    pub id: String,

    /// AD `objectGUID`. Once set to a non-null value it is never cleared;
    /// losing it would orphan the mapping.
    pub ad_object_guid: Option<String>,

    /// Derived `sAMAccountName` (unique, ≤ 20 chars, no `@`).
    pub sam_account_name: Option<String>,

    /// The SCIM view as last accepted from the identity provider.
    pub scim_resource: serde_json::Value,

    /// The AD view from the last successful directory read-back.
    pub ad_resource: Option<serde_json::Value>,

    /// Stored form of [`SyncStatus`].
    pub sync_status: String,

    /// Reason for the last failed directory write, cleared on success.
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new cache row.
#[derive(Debug, Clone)]
pub struct CreateUserMapping {
    pub id: String,
    pub ad_object_guid: Option<String>,
    pub sam_account_name: Option<String>,
    pub scim_resource: serde_json::Value,
    pub sync_status: SyncStatus,
}

impl UserMapping {
    /// Parse the stored status string.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        match self.sync_status.as_str() {
            "pending" => SyncStatus::Pending,
            "error" => SyncStatus::Error,
            _ => SyncStatus::Synced,
        }
    }

    /// AD identity for directory calls: the `objectGUID` when known, else
    /// the `sAMAccountName`.
    #[must_use]
    pub fn ad_identity(&self) -> Option<String> {
        self.ad_object_guid
            .clone()
            .or_else(|| self.sam_account_name.clone())
    }

    /// Find a row by SCIM id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM user_mappings
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find a row by derived `sAMAccountName`.
    pub async fn find_by_sam(pool: &PgPool, sam: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM user_mappings
            WHERE sam_account_name = $1
            ",
        )
        .bind(sam)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new cache row.
    ///
    /// A unique violation on `sam_account_name` must be translated by the
    /// caller into a SCIM 409 (see [`crate::is_unique_violation`]).
    pub async fn insert(pool: &PgPool, row: CreateUserMapping) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO user_mappings (
                id, ad_object_guid, sam_account_name, scim_resource, sync_status
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(&row.id)
        .bind(&row.ad_object_guid)
        .bind(&row.sam_account_name)
        .bind(&row.scim_resource)
        .bind(row.sync_status.as_str())
        .fetch_one(pool)
        .await
    }

    /// Write a new SCIM view ahead of the directory call, marking the row
    /// `pending` so a crash between the two writes is recoverable.
    ///
    /// When the new view changes `userName`, the derived sAM is passed so
    /// the row and the view do not drift.
    pub async fn set_view_pending(
        pool: &PgPool,
        id: &str,
        scim_resource: &serde_json::Value,
        sam_account_name: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE user_mappings SET
                scim_resource = $2,
                sam_account_name = COALESCE($3, sam_account_name),
                sync_status = 'pending',
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(scim_resource)
        .bind(sam_account_name)
        .fetch_one(pool)
        .await
    }

    /// Mark the row reconciled: status `synced`, `last_error` cleared.
    ///
    /// `ad_object_guid` is applied through COALESCE so a known GUID is
    /// never overwritten with null (AD is the ground truth).
    pub async fn mark_synced(
        pool: &PgPool,
        id: &str,
        ad_object_guid: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE user_mappings SET
                sync_status = 'synced',
                last_error = NULL,
                ad_object_guid = COALESCE($2, ad_object_guid),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(ad_object_guid)
        .fetch_one(pool)
        .await
    }

    /// Record a failed directory write.
    pub async fn mark_error(pool: &PgPool, id: &str, message: &str) -> Result<Self, sqlx::Error> {
        let truncated: String = message.chars().take(MAX_LAST_ERROR_CHARS).collect();
        sqlx::query_as(
            r"
            UPDATE user_mappings SET
                sync_status = 'error',
                last_error = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&truncated)
        .fetch_one(pool)
        .await
    }

    /// Store the AD view from a directory read-back.
    pub async fn set_ad_resource(
        pool: &PgPool,
        id: &str,
        ad_resource: &serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE user_mappings SET
                ad_resource = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(ad_resource)
        .fetch_one(pool)
        .await
    }

    /// Delete a row, returning whether it existed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            DELETE FROM user_mappings
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count rows matching an optional predicate.
    pub async fn count(pool: &PgPool, filter: Option<&CacheFilter>) -> Result<i64, sqlx::Error> {
        match filter {
            Some(f) => {
                let query = format!(
                    "SELECT COUNT(*) FROM user_mappings WHERE {} = $1",
                    f.column.as_sql()
                );
                sqlx::query_scalar::<_, i64>(&query)
                    .bind(&f.value)
                    .fetch_one(pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_mappings")
                    .fetch_one(pool)
                    .await
            }
        }
    }

    /// Fetch a page of rows ordered by creation time ascending.
    pub async fn page(
        pool: &PgPool,
        filter: Option<&CacheFilter>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match filter {
            Some(f) => {
                let query = format!(
                    "SELECT * FROM user_mappings WHERE {} = $1 \
                     ORDER BY created_at ASC LIMIT $2 OFFSET $3",
                    f.column.as_sql()
                );
                sqlx::query_as::<_, Self>(&query)
                    .bind(&f.value)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                sqlx::query_as(
                    r"
                    SELECT * FROM user_mappings
                    ORDER BY created_at ASC
                    LIMIT $1 OFFSET $2
                    ",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_display() {
        assert_eq!(SyncStatus::Synced.to_string(), "synced");
        assert_eq!(SyncStatus::Pending.to_string(), "pending");
        assert_eq!(SyncStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_cache_column_sql() {
        assert_eq!(CacheColumn::Id.as_sql(), "id");
        assert_eq!(CacheColumn::SamAccountName.as_sql(), "sam_account_name");
    }

    fn test_row() -> UserMapping {
        UserMapping {
            id: "abc".to_string(),
            ad_object_guid: None,
            sam_account_name: Some("alice".to_string()),
            scim_resource: serde_json::json!({"id": "abc", "userName": "alice@ex.com"}),
            ad_resource: None,
            sync_status: "synced".to_string(),
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parse() {
        let mut row = test_row();
        assert_eq!(row.status(), SyncStatus::Synced);
        row.sync_status = "pending".to_string();
        assert_eq!(row.status(), SyncStatus::Pending);
        row.sync_status = "error".to_string();
        assert_eq!(row.status(), SyncStatus::Error);
    }

    #[test]
    fn test_ad_identity_prefers_guid() {
        let mut row = test_row();
        assert_eq!(row.ad_identity().as_deref(), Some("alice"));

        row.ad_object_guid = Some("11111111-1111-1111-1111-111111111111".to_string());
        assert_eq!(
            row.ad_identity().as_deref(),
            Some("11111111-1111-1111-1111-111111111111")
        );

        row.ad_object_guid = None;
        row.sam_account_name = None;
        assert!(row.ad_identity().is_none());
    }
}
