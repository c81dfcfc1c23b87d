//! Connection handling for the cache and audit tables.

use crate::error::DbError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Provisioning traffic is a trickle of requests from a single identity
/// provider, and a request that reaches the directory spends its time in
/// the external command, not in SQL. A handful of connections is plenty.
const MAX_CONNECTIONS: u32 = 5;

/// Maximum time to wait when acquiring a connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the connection pool backing the provisioning cache and the
/// command audit log.
///
/// # Errors
///
/// Returns `DbError::ConnectionFailed` if the connection cannot be
/// established.
pub async fn connect(database_url: &str) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(DbError::ConnectionFailed)
}
