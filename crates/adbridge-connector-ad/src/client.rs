//! High-level AD user lifecycle operations.

use serde_json::Value;
use sqlx::PgPool;

use crate::error::AdError;
use crate::executor::{CommandOutput, PsExecutor};
use crate::params::AdUserParams;
use crate::script::{PsCommand, PsValue};

/// Client for AD user provisioning through the PowerShell cmdlets.
#[derive(Debug, Clone)]
pub struct AdClient {
    executor: PsExecutor,
    /// Explicit domain controller hostname; when unset the cmdlets pick
    /// one through the default discovery.
    server: Option<String>,
}

impl AdClient {
    /// Create a client.
    #[must_use]
    pub fn new(pool: PgPool, program: impl Into<String>, server: Option<String>) -> Self {
        Self {
            executor: PsExecutor::new(pool, program),
            server,
        }
    }

    fn with_server(&self, cmd: PsCommand) -> PsCommand {
        match &self.server {
            Some(server) => cmd.param("Server", PsValue::Text(server.clone())),
            None => cmd,
        }
    }

    /// Provision a new user.
    ///
    /// The initial password travels as a secure string, password change at
    /// logon is forced off, and `-PassThru` returns the created object so
    /// the caller can extract its `objectGUID`.
    pub async fn create_user(
        &self,
        params: &AdUserParams,
        password: &str,
        scim_user_id: &str,
    ) -> Result<CommandOutput, AdError> {
        let cmd = params
            .apply_to(PsCommand::new("New-ADUser"))
            .param("AccountPassword", PsValue::Secret(password.to_string()))
            .param("ChangePasswordAtLogon", PsValue::Bool(false))
            .switch("-PassThru")
            .json_output();
        self.executor
            .run(&self.with_server(cmd), Some(scim_user_id))
            .await
    }

    /// Update attributes on an existing user.
    ///
    /// `identity` is the AD `objectGUID` when known, else the
    /// `sAMAccountName`. The caller strips creation-only parameters.
    pub async fn update_user(
        &self,
        identity: &str,
        params: &AdUserParams,
        scim_user_id: &str,
    ) -> Result<CommandOutput, AdError> {
        let cmd = params
            .apply_to(PsCommand::new("Set-ADUser"))
            .param("Identity", PsValue::Text(identity.to_string()));
        self.executor
            .run(&self.with_server(cmd), Some(scim_user_id))
            .await
    }

    /// Deprovision a user with non-interactive confirmation.
    pub async fn delete_user(
        &self,
        identity: &str,
        scim_user_id: &str,
    ) -> Result<CommandOutput, AdError> {
        let cmd = PsCommand::new("Remove-ADUser")
            .param("Identity", PsValue::Text(identity.to_string()))
            .switch("-Confirm:$false");
        self.executor
            .run(&self.with_server(cmd), Some(scim_user_id))
            .await
    }

    /// Full attribute read-back.
    ///
    /// Returns the parsed record, or `None` on any failure; read-backs
    /// hydrate the AD view for operators and never fail the caller.
    pub async fn read_user(&self, identity: &str, scim_user_id: &str) -> Option<Value> {
        let cmd = PsCommand::new("Get-ADUser")
            .param("Identity", PsValue::Text(identity.to_string()))
            .switch("-Properties *")
            .json_output();
        match self
            .executor
            .run(&self.with_server(cmd), Some(scim_user_id))
            .await
        {
            Ok(output) => output.json,
            Err(err) => {
                tracing::warn!(identity, error = %err, "directory read-back failed");
                None
            }
        }
    }
}

/// Extract the `objectGUID` from a cmdlet JSON result.
///
/// `ConvertTo-Json` emits the GUID either as a bare string or, depending
/// on the serialized type, as a wrapper object `{ "value": "<guid>" }`.
#[must_use]
pub fn extract_object_guid(value: &Value) -> Option<String> {
    let guid = value.get("ObjectGUID")?;
    match guid {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("value")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
