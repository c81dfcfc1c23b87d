//! Storage layer for the adbridge SCIM gateway.
//!
//! Two tables back the bridge:
//!
//! - `user_mappings`: the provisioning cache. One row per SCIM user,
//!   holding the SCIM view (what the identity provider last sent us), the
//!   AD view (what the directory last reported), and the link between the
//!   SCIM `id` and the AD object (`sam_account_name`, `ad_object_guid`).
//! - `command_audit_log`: an append-only record of every directory
//!   command execution, with sensitive parameter values redacted before
//!   they reach this crate.
//!
//! Cache mutations are fatal to the enclosing request when they fail;
//! audit writes are fire-and-forget at the call site.

pub mod error;
pub mod models;
pub mod pool;

pub use error::{is_unique_violation, DbError};
pub use pool::connect;
