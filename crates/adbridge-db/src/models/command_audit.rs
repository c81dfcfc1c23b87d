//! Command audit log entity model.
//!
//! Append-only trail of every directory command execution. Insert is the
//! only operation the bridge performs; operators query the table out of
//! band when diagnosing directory-side failures.
//!
//! Expected columns:
//! `id UUID PRIMARY KEY DEFAULT gen_random_uuid()`, `cmdlet TEXT NOT NULL`,
//! `parameters JSONB NOT NULL`, `stdout TEXT NOT NULL`,
//! `stderr TEXT NOT NULL`, `exit_code INT NOT NULL`,
//! `duration_ms BIGINT NOT NULL`, `scim_user_id TEXT`,
//! `created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Maximum stored length of captured stdout/stderr.
const MAX_STREAM_CHARS: usize = 65_535;

/// One recorded directory command execution.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommandAudit {
    pub id: Uuid,

    /// Logical cmdlet name (e.g. `New-ADUser`).
    pub cmdlet: String,

    /// Rendered parameters with sensitive values already redacted.
    pub parameters: serde_json::Value,

    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,

    /// Wall-clock execution time in milliseconds.
    pub duration_ms: i64,

    /// The SCIM user the command acted on, when known.
    pub scim_user_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Fields for appending an audit entry.
#[derive(Debug, Clone)]
pub struct CreateCommandAudit {
    pub cmdlet: String,
    pub parameters: serde_json::Value,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: i64,
    pub scim_user_id: Option<String>,
}

impl CommandAudit {
    /// Append an audit entry.
    ///
    /// Captured streams are truncated to the column width here so callers
    /// never have to care about oversized tool output.
    pub async fn create(pool: &PgPool, entry: CreateCommandAudit) -> Result<Self, sqlx::Error> {
        let stdout = truncate_chars(&entry.stdout, MAX_STREAM_CHARS);
        let stderr = truncate_chars(&entry.stderr, MAX_STREAM_CHARS);

        sqlx::query_as(
            r"
            INSERT INTO command_audit_log (
                cmdlet, parameters, stdout, stderr, exit_code, duration_ms, scim_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(&entry.cmdlet)
        .bind(&entry.parameters)
        .bind(&stdout)
        .bind(&stderr)
        .bind(entry.exit_code)
        .bind(entry.duration_ms)
        .bind(&entry.scim_user_id)
        .fetch_one(pool)
        .await
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let long = "x".repeat(70_000);
        let truncated = truncate_chars(&long, MAX_STREAM_CHARS);
        assert_eq!(truncated.chars().count(), MAX_STREAM_CHARS);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let s = "é".repeat(10);
        let truncated = truncate_chars(&s, 4);
        assert_eq!(truncated, "éééé");
    }
}
