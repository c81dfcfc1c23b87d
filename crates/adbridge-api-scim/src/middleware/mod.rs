//! Middleware for the SCIM routes.

pub mod auth;

pub use auth::ApiKeyLayer;
