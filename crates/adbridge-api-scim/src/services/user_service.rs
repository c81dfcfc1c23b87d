//! SCIM user provisioning service.
//!
//! Orchestrates the six User operations: each one sequences cache writes
//! around the external directory command so that a crash at any
//! suspension point leaves the system recoverable.
//!
//! Ordering rules:
//! - **create**: directory first, cache second. A failed create must not
//!   leave an orphan row.
//! - **replace/patch**: cache first (`sync_status = pending`), directory
//!   second. The pending row plus the audit log reconstruct intent.
//! - **delete**: directory first, cache second. A failure must not lose
//!   the mapping.

use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use adbridge_connector_ad::{extract_object_guid, is_already_gone, AdClient, AdUserParams};
use adbridge_db::is_unique_violation;
use adbridge_db::models::{CreateUserMapping, SyncStatus, UserMapping};

use crate::error::{ScimError, ScimResult};
use crate::models::{ScimMeta, ScimPagination, ScimPatchRequest, ScimUserListResponse, USER_SCHEMA};
use crate::services::attribute_mapper::{
    derive_sam, get_str, params_from_changed, scim_to_params,
};
use crate::services::filter_parser::{parse_filter, to_cache_filter};
use crate::services::patch::apply_operations;

/// Service for SCIM user operations.
pub struct UserService {
    pool: PgPool,
    ad: AdClient,
    base_url: String,
    base_ou: String,
    default_password: String,
}

impl UserService {
    /// Create a new user service.
    pub fn new(
        pool: PgPool,
        ad: AdClient,
        base_url: impl Into<String>,
        base_ou: impl Into<String>,
        default_password: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            ad,
            base_url: base_url.into(),
            base_ou: base_ou.into(),
            default_password: default_password.into(),
        }
    }

    /// List users with optional filtering and pagination.
    ///
    /// An unsupported filter is not an error: the page is served
    /// unfiltered so provisioning integrations keep working.
    pub async fn list_users(
        &self,
        filter: Option<&str>,
        pagination: ScimPagination,
    ) -> ScimResult<ScimUserListResponse> {
        let predicate = filter
            .map(parse_filter)
            .as_ref()
            .and_then(to_cache_filter);

        let total_results = UserMapping::count(&self.pool, predicate.as_ref()).await?;
        let rows = UserMapping::page(
            &self.pool,
            predicate.as_ref(),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;

        let resources: Vec<Value> = rows.iter().map(|row| self.to_scim_user(row)).collect();
        Ok(ScimUserListResponse::new(
            resources,
            total_results,
            pagination.start_index,
        ))
    }

    /// Get a user by SCIM id.
    pub async fn get_user(&self, id: &str) -> ScimResult<Value> {
        let row = self.find_row(id).await?;
        Ok(self.to_scim_user(&row))
    }

    /// Create a new user.
    ///
    /// The directory is written first; the cache row is only inserted
    /// after the create succeeded, so a directory failure leaves no
    /// orphan mapping. Returns the formatted user and its Location.
    pub async fn create_user(&self, body: Value) -> ScimResult<(Value, String)> {
        let view = body
            .as_object()
            .cloned()
            .ok_or_else(|| ScimError::Validation("Request body must be a JSON object".to_string()))?;

        let user_name = get_str(&view, "userName")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScimError::Validation("userName is required".to_string()))?
            .to_string();
        let sam = derive_sam(&user_name);

        // Pre-check is an optimization; the unique constraint below is the
        // authoritative guard against a concurrent create.
        if UserMapping::find_by_sam(&self.pool, &sam).await?.is_some() {
            return Err(ScimError::Conflict {
                field: "userName".to_string(),
                value: user_name,
            });
        }

        let id = get_str(&view, "externalId")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let params = scim_to_params(&view, Some(&self.base_ou));
        let output = self
            .ad
            .create_user(&params, &self.default_password, &id)
            .await?;
        let guid = output.json.as_ref().and_then(extract_object_guid);
        if guid.is_none() {
            tracing::warn!(id, "created AD user but could not extract objectGUID");
        }

        let mut stored = view;
        stored.insert("id".to_string(), json!(id));

        let row = match UserMapping::insert(
            &self.pool,
            CreateUserMapping {
                id: id.clone(),
                ad_object_guid: guid,
                sam_account_name: Some(sam),
                scim_resource: Value::Object(stored),
                sync_status: SyncStatus::Synced,
            },
        )
        .await
        {
            Ok(row) => row,
            Err(ref err) if is_unique_violation(err) => {
                return Err(ScimError::Conflict {
                    field: "userName".to_string(),
                    value: user_name,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let row = self.refresh_ad_view(row).await;
        let location = format!("{}/scim/v2/Users/{}", self.base_url, row.id);
        Ok((self.to_scim_user(&row), location))
    }

    /// Replace a user (full update).
    pub async fn replace_user(&self, id: &str, body: Value) -> ScimResult<Value> {
        let existing = self.find_row(id).await?;

        let mut view = body
            .as_object()
            .cloned()
            .ok_or_else(|| ScimError::Validation("Request body must be a JSON object".to_string()))?;
        view.insert("id".to_string(), json!(id));

        self.write_pending_view(id, view.clone()).await?;

        // Identity comes from the row as fetched: a renamed userName has
        // already moved the sAM column, but the directory still knows the
        // object under its old name (or, preferably, its GUID).
        let identity = self.require_identity(&existing)?;

        let mut params = scim_to_params(&view, None);
        params.strip_create_only();

        self.run_update(id, &identity, &params).await
    }

    /// Patch a user (partial update).
    pub async fn patch_user(&self, id: &str, request: ScimPatchRequest) -> ScimResult<Value> {
        if request.operations.is_empty() {
            return Err(ScimError::Validation(
                "Operations must be a non-empty list".to_string(),
            ));
        }

        let existing = self.find_row(id).await?;
        let stored = existing
            .scim_resource
            .as_object()
            .cloned()
            .unwrap_or_default();

        let outcome = apply_operations(&stored, &request.operations)?;
        let mut view = outcome.resource;
        view.insert("id".to_string(), json!(id));

        self.write_pending_view(id, view).await?;

        // Only the touched fields go to the directory.
        let mut params = params_from_changed(&outcome.changed);
        params.strip_create_only();

        if params.is_empty() {
            // Nothing the directory cares about changed.
            let row = UserMapping::mark_synced(&self.pool, id, None).await?;
            let row = self.refresh_ad_view(row).await;
            return Ok(self.to_scim_user(&row));
        }

        let identity = self.require_identity(&existing)?;
        self.run_update(id, &identity, &params).await
    }

    /// Delete (deprovision) a user.
    ///
    /// A "cannot find" / "not found" stderr from the directory counts as
    /// already gone; any other failure aborts before the cache row is
    /// removed so the mapping is not lost.
    pub async fn delete_user(&self, id: &str) -> ScimResult<()> {
        let row = self.find_row(id).await?;

        if let Some(identity) = row.ad_identity() {
            if let Err(err) = self.ad.delete_user(&identity, id).await {
                let stderr = err.stderr();
                if !is_already_gone(&stderr) {
                    return Err(err.into());
                }
                tracing::info!(id, "AD object already gone, removing cache row");
            }
        }

        UserMapping::delete(&self.pool, id).await?;
        Ok(())
    }

    /// Fetch a row or fail with 404 `noTarget`.
    async fn find_row(&self, id: &str) -> ScimResult<UserMapping> {
        UserMapping::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ScimError::NotFound(format!("User {id} not found")))
    }

    /// Persist a new SCIM view ahead of the directory call, keeping the
    /// derived sAM column in step with the view's `userName`.
    async fn write_pending_view(
        &self,
        id: &str,
        view: Map<String, Value>,
    ) -> ScimResult<UserMapping> {
        let sam = get_str(&view, "userName")
            .filter(|s| !s.is_empty())
            .map(derive_sam);
        let user_name = get_str(&view, "userName").unwrap_or_default().to_string();

        match UserMapping::set_view_pending(
            &self.pool,
            id,
            &Value::Object(view),
            sam.as_deref(),
        )
        .await
        {
            Ok(row) => Ok(row),
            Err(ref err) if is_unique_violation(err) => Err(ScimError::Conflict {
                field: "userName".to_string(),
                value: user_name,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// The AD identity for directory calls; a row with neither GUID nor
    /// sAM is unreachable in the directory and an invariant violation.
    fn require_identity(&self, row: &UserMapping) -> ScimResult<String> {
        row.ad_identity().ok_or_else(|| {
            ScimError::Internal(format!(
                "cache row {} has neither objectGUID nor sAMAccountName",
                row.id
            ))
        })
    }

    /// Run a directory update with the shared replace/patch failure
    /// handling: on failure the row transitions to `error` with the tool
    /// stderr, on success it is marked `synced` and refreshed.
    async fn run_update(
        &self,
        id: &str,
        identity: &str,
        params: &AdUserParams,
    ) -> ScimResult<Value> {
        match self.ad.update_user(identity, params, id).await {
            Ok(_) => {
                let row = UserMapping::mark_synced(&self.pool, id, None).await?;
                let row = self.refresh_ad_view(row).await;
                Ok(self.to_scim_user(&row))
            }
            Err(err) => {
                let stderr = err.stderr();
                if let Err(db_err) = UserMapping::mark_error(&self.pool, id, &stderr).await {
                    tracing::warn!(id, error = %db_err, "failed to record sync error");
                }
                Err(err.into())
            }
        }
    }

    /// Best-effort read-back populating the AD view. Never fails the
    /// caller; the SCIM response reports success regardless.
    async fn refresh_ad_view(&self, row: UserMapping) -> UserMapping {
        let Some(identity) = row.ad_identity() else {
            return row;
        };
        let Some(record) = self.ad.read_user(&identity, &row.id).await else {
            return row;
        };

        let existing = row.scim_resource.as_object().cloned().unwrap_or_default();
        let ad_view = Value::Object(crate::services::attribute_mapper::ad_to_scim(
            &existing, &record,
        ));

        match UserMapping::set_ad_resource(&self.pool, &row.id, &ad_view).await {
            Ok(updated) => updated,
            Err(err) => {
                tracing::warn!(id = %row.id, error = %err, "failed to store AD view");
                row
            }
        }
    }

    /// Format a cache row as a SCIM User envelope.
    ///
    /// The stored view is copied wholesale (unknown fields included);
    /// `schemas`, `id`, and `meta` come from the row, and `userName`
    /// falls back to the sAM column when the view lacks it.
    fn to_scim_user(&self, row: &UserMapping) -> Value {
        let mut view = row.scim_resource.as_object().cloned().unwrap_or_default();

        view.insert("schemas".to_string(), json!([USER_SCHEMA]));
        view.insert("id".to_string(), json!(row.id));

        if get_str(&view, "userName").is_none() {
            if let Some(sam) = &row.sam_account_name {
                view.insert("userName".to_string(), json!(sam));
            }
        }

        let meta = ScimMeta::user(&row.id, &self.base_url, row.created_at, row.updated_at);
        view.insert(
            "meta".to_string(),
            serde_json::to_value(meta).unwrap_or_default(),
        );

        Value::Object(view)
    }
}
