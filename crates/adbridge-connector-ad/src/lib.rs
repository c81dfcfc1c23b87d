//! Active Directory connector for the adbridge SCIM gateway.
//!
//! Translates user-lifecycle operations into PowerShell AD cmdlet
//! invocations (`New-ADUser`, `Set-ADUser`, `Remove-ADUser`,
//! `Get-ADUser`) executed on the Windows host the bridge runs on.
//!
//! # Safety contract
//!
//! - The PowerShell executable is spawned directly with discrete argv
//!   entries, never through a shell interpreter.
//! - Every value originating from SCIM input is rendered as a
//!   single-quoted PowerShell literal with embedded quotes doubled.
//! - Passwords travel as secure strings and are redacted, together with
//!   any other sensitive parameter, before audit serialization.
//!
//! # Execution contract
//!
//! Each run is bounded by a 30 second wall-clock timeout and a 10 MiB
//! per-stream output cap. Every run, success or failure, appends one
//! audit row, fire-and-forget.

pub mod classify;
pub mod client;
pub mod error;
pub mod executor;
pub mod params;
pub mod script;

pub use classify::{classify, is_already_gone, DirectoryErrorKind};
pub use client::{extract_object_guid, AdClient};
pub use error::AdError;
pub use executor::{CommandOutput, PsExecutor};
pub use params::AdUserParams;
pub use script::{PsCommand, PsValue, REDACTION_MARKER};
