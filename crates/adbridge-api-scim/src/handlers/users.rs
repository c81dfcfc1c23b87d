//! SCIM User resource handlers.

use axum::{
    extract::{Path, Query},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ScimError;
use crate::handlers::common::scim_response;
use crate::models::{ScimPagination, ScimPatchRequest};
use crate::services::UserService;

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    filter: Option<String>,
    start_index: Option<i64>,
    count: Option<i64>,
}

/// List users with optional filtering.
///
/// GET /scim/v2/Users
#[utoipa::path(
    get,
    path = "/scim/v2/Users",
    responses(
        (status = 200, description = "SCIM ListResponse of users"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "SCIM Users"
)]
pub async fn list_users(
    Extension(service): Extension<Arc<UserService>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Response, ScimError> {
    let pagination = ScimPagination::from_query(query.start_index, query.count);
    let response = service
        .list_users(query.filter.as_deref(), pagination)
        .await?;
    Ok(scim_response(StatusCode::OK, response))
}

/// Get a user by id.
///
/// GET /scim/v2/Users/{id}
#[utoipa::path(
    get,
    path = "/scim/v2/Users/{id}",
    responses(
        (status = 200, description = "SCIM User"),
        (status = 404, description = "User not found"),
    ),
    tag = "SCIM Users"
)]
pub async fn get_user(
    Extension(service): Extension<Arc<UserService>>,
    Path(id): Path<String>,
) -> Result<Response, ScimError> {
    let user = service.get_user(&id).await?;
    Ok(scim_response(StatusCode::OK, user))
}

/// Create a new user.
///
/// POST /scim/v2/Users
#[utoipa::path(
    post,
    path = "/scim/v2/Users",
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "User already exists"),
    ),
    tag = "SCIM Users"
)]
pub async fn create_user(
    Extension(service): Extension<Arc<UserService>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ScimError> {
    let (user, location) = service.create_user(body).await?;

    let mut response = scim_response(StatusCode::CREATED, user);
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

/// Replace a user.
///
/// PUT /scim/v2/Users/{id}
#[utoipa::path(
    put,
    path = "/scim/v2/Users/{id}",
    responses(
        (status = 200, description = "User replaced"),
        (status = 404, description = "User not found"),
    ),
    tag = "SCIM Users"
)]
pub async fn replace_user(
    Extension(service): Extension<Arc<UserService>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ScimError> {
    let user = service.replace_user(&id, body).await?;
    Ok(scim_response(StatusCode::OK, user))
}

/// Patch a user.
///
/// PATCH /scim/v2/Users/{id}
#[utoipa::path(
    patch,
    path = "/scim/v2/Users/{id}",
    responses(
        (status = 200, description = "User patched"),
        (status = 400, description = "Invalid patch request"),
        (status = 404, description = "User not found"),
    ),
    tag = "SCIM Users"
)]
pub async fn update_user(
    Extension(service): Extension<Arc<UserService>>,
    Path(id): Path<String>,
    Json(request): Json<ScimPatchRequest>,
) -> Result<Response, ScimError> {
    let user = service.patch_user(&id, request).await?;
    Ok(scim_response(StatusCode::OK, user))
}

/// Delete a user.
///
/// DELETE /scim/v2/Users/{id}
#[utoipa::path(
    delete,
    path = "/scim/v2/Users/{id}",
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
    ),
    tag = "SCIM Users"
)]
pub async fn delete_user(
    Extension(service): Extension<Arc<UserService>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ScimError> {
    service.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
