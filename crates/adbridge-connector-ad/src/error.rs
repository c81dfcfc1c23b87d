//! Error types for directory command execution.

use thiserror::Error;

/// Errors surfaced by the command executor.
#[derive(Debug, Error)]
pub enum AdError {
    /// The PowerShell executable could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while collecting command output.
    #[error("command I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The command exceeded the wall-clock timeout and was killed.
    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    /// A captured stream exceeded the output buffer cap.
    #[error("command output exceeded {0} bytes")]
    OutputOverflow(usize),

    /// The command exited with a nonzero status.
    #[error("{stderr}")]
    Command { stderr: String, exit_code: i32 },
}

impl AdError {
    /// The error text in the role the directory tool's stderr plays:
    /// the actual stderr for command failures, a synthesized message for
    /// everything else. This is what the error classifier consumes and
    /// what ends up in the SCIM error `detail`.
    #[must_use]
    pub fn stderr(&self) -> String {
        match self {
            AdError::Command { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}
