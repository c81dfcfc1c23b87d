//! Bounded execution of PowerShell commands with audit logging.

use std::process::Stdio;
use std::time::{Duration, Instant};

use sqlx::PgPool;
use tokio::process::Command;

use adbridge_db::models::{CommandAudit, CreateCommandAudit};

use crate::error::AdError;
use crate::script::PsCommand;

/// Wall-clock limit for a single command.
const TIMEOUT_SECS: u64 = 30;

/// Per-stream output cap.
const MAX_STREAM_BYTES: usize = 10 * 1024 * 1024;

/// Result of a completed (exit 0) command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Trimmed stdout.
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: i64,
    /// Parsed stdout when it was valid JSON; `None` keeps the raw text in
    /// `stdout` available.
    pub json: Option<serde_json::Value>,
}

/// Executes rendered cmdlet scripts under the execution contract and
/// appends one audit row per run.
#[derive(Debug, Clone)]
pub struct PsExecutor {
    pool: PgPool,
    program: String,
    timeout: Duration,
}

impl PsExecutor {
    /// Create an executor spawning the given PowerShell executable
    /// (resolved through PATH).
    #[must_use]
    pub fn new(pool: PgPool, program: impl Into<String>) -> Self {
        Self {
            pool,
            program: program.into(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    /// Run a command to completion.
    ///
    /// The script is passed as a single argv entry to the executable;
    /// there is no intermediate shell. Nonzero exit, timeout, and output
    /// overflow all produce an [`AdError`]; in every case (including
    /// success) an audit row is written fire-and-forget.
    pub async fn run(
        &self,
        command: &PsCommand,
        scim_user_id: Option<&str>,
    ) -> Result<CommandOutput, AdError> {
        let script = command.render();
        let started = Instant::now();

        tracing::debug!(cmdlet = command.cmdlet(), "executing directory command");

        let child = Command::new(&self.program)
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(source) => {
                let stderr = format!("failed to spawn {}: {source}", self.program);
                self.audit(command, "", &stderr, -1, elapsed_ms(started), scim_user_id);
                return Err(AdError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        // On timeout the future is dropped and kill_on_drop reaps the child.
        let waited = tokio::time::timeout(self.timeout, child.wait_with_output()).await;
        let duration_ms = elapsed_ms(started);

        let output = match waited {
            Err(_) => {
                let secs = self.timeout.as_secs();
                let stderr = format!("command timed out after {secs} seconds");
                self.audit(command, "", &stderr, -1, duration_ms, scim_user_id);
                return Err(AdError::Timeout(secs));
            }
            Ok(Err(err)) => {
                let stderr = format!("command I/O failed: {err}");
                self.audit(command, "", &stderr, -1, duration_ms, scim_user_id);
                return Err(AdError::Io(err));
            }
            Ok(Ok(output)) => output,
        };

        if output.stdout.len() > MAX_STREAM_BYTES || output.stderr.len() > MAX_STREAM_BYTES {
            let stderr = format!("command output exceeded {MAX_STREAM_BYTES} bytes");
            self.audit(command, "", &stderr, -1, duration_ms, scim_user_id);
            return Err(AdError::OutputOverflow(MAX_STREAM_BYTES));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        self.audit(command, &stdout, &stderr, exit_code, duration_ms, scim_user_id);

        if exit_code != 0 {
            let message = if stderr.trim().is_empty() {
                format!("command exited with status {exit_code}")
            } else {
                stderr.clone()
            };
            tracing::warn!(
                cmdlet = command.cmdlet(),
                exit_code,
                "directory command failed"
            );
            return Err(AdError::Command {
                stderr: message,
                exit_code,
            });
        }

        let trimmed = stdout.trim().to_string();
        let json = if trimmed.is_empty() {
            None
        } else {
            serde_json::from_str(&trimmed).ok()
        };

        Ok(CommandOutput {
            stdout: trimmed,
            stderr,
            exit_code,
            duration_ms,
            json,
        })
    }

    /// Append an audit row without blocking or failing the caller.
    fn audit(
        &self,
        command: &PsCommand,
        stdout: &str,
        stderr: &str,
        exit_code: i32,
        duration_ms: i64,
        scim_user_id: Option<&str>,
    ) {
        let entry = CreateCommandAudit {
            cmdlet: command.cmdlet().to_string(),
            parameters: command.audit_parameters(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            duration_ms,
            scim_user_id: scim_user_id.map(str::to_string),
        };
        let pool = self.pool.clone();
        tokio::spawn(async move {
            if let Err(err) = CommandAudit::create(&pool, entry).await {
                tracing::warn!(error = %err, "failed to write command audit row");
            }
        });
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}
