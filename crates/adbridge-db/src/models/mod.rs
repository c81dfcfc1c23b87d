//! Row models for the adbridge cache and audit tables.

pub mod command_audit;
pub mod user_mapping;

pub use command_audit::{CommandAudit, CreateCommandAudit};
pub use user_mapping::{CacheColumn, CacheFilter, CreateUserMapping, SyncStatus, UserMapping};
