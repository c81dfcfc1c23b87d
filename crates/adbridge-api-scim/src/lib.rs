//! SCIM 2.0 API for the adbridge provisioning gateway.
//!
//! This crate implements the User subset of the SCIM 2.0 protocol
//! (RFC 7644) for automated provisioning from an enterprise identity
//! provider into an Active Directory domain.
//!
//! # Features
//!
//! - User provisioning (create, read, replace, patch, delete) translated
//!   into AD cmdlet invocations
//! - SCIM filter subset parsing against the local provisioning cache
//! - PATCH path resolution over the dynamic SCIM view
//! - Bearer token authentication
//! - Audit logging of every directory command
//!
//! # Usage
//!
//! ```rust,ignore
//! use adbridge_api_scim::{scim_resource_router, ScimConfig};
//!
//! let router = scim_resource_router(config);
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;

pub use error::{ScimError, ScimResult};
pub use router::{scim_resource_router, ScimConfig};
