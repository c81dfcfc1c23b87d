//! SCIM 2.0 API router configuration.

use axum::{routing::get, Extension, Router};
use sqlx::PgPool;
use std::sync::Arc;

use adbridge_connector_ad::AdClient;

use crate::handlers::users;
use crate::middleware::ApiKeyLayer;
use crate::services::UserService;

/// Configuration for the SCIM router.
pub struct ScimConfig {
    /// Database pool for the cache and audit tables.
    pub pool: PgPool,
    /// Base URL for SCIM resource locations
    /// (e.g. `https://bridge.example.com`).
    pub base_url: String,
    /// Distinguished name of the OU new users are created under.
    pub base_ou: String,
    /// Initial password assigned on the create path.
    pub default_password: String,
    /// Service-level API key the identity provider authenticates with.
    pub api_key: String,
    /// Explicit domain controller hostname, when discovery should be
    /// bypassed.
    pub ad_server: Option<String>,
    /// PowerShell executable to invoke (resolved through PATH).
    pub powershell: String,
}

impl ScimConfig {
    /// Create a config with the default PowerShell executable.
    pub fn new(
        pool: PgPool,
        base_url: impl Into<String>,
        base_ou: impl Into<String>,
        default_password: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            base_url: base_url.into(),
            base_ou: base_ou.into(),
            default_password: default_password.into(),
            api_key: api_key.into(),
            ad_server: None,
            powershell: "powershell.exe".to_string(),
        }
    }

    /// Set an explicit domain controller.
    #[must_use]
    pub fn with_ad_server(mut self, server: impl Into<String>) -> Self {
        self.ad_server = Some(server.into());
        self
    }

    /// Override the PowerShell executable.
    #[must_use]
    pub fn with_powershell(mut self, program: impl Into<String>) -> Self {
        self.powershell = program.into();
        self
    }
}

/// Create the SCIM 2.0 resource router.
///
/// Mount at `/scim/v2`:
/// - GET/POST /Users
/// - GET/PUT/PATCH/DELETE /Users/:id
///
/// All routes sit behind bearer-key authentication.
pub fn scim_resource_router(config: ScimConfig) -> Router {
    let ad = AdClient::new(
        config.pool.clone(),
        config.powershell,
        config.ad_server,
    );
    let user_service = Arc::new(UserService::new(
        config.pool,
        ad,
        config.base_url,
        config.base_ou,
        config.default_password,
    ));

    Router::new()
        .route("/Users", get(users::list_users).post(users::create_user))
        .route(
            "/Users/:id",
            get(users::get_user)
                .put(users::replace_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        // Layers apply in reverse order: the auth layer is innermost so the
        // service extension is visible to it and to the handlers.
        .layer(ApiKeyLayer::new(config.api_key))
        .layer(Extension(user_service))
}
