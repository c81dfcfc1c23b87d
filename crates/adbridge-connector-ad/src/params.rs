//! The directory parameter set.
//!
//! Intermediate form between a SCIM user and an AD cmdlet invocation. The
//! struct fields are exactly the parameter names the AD cmdlets accept for
//! user provisioning; an unknown key cannot appear by construction.

use crate::script::{PsCommand, PsValue};

/// Parameters for `New-ADUser` / `Set-ADUser`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdUserParams {
    pub sam_account_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub email_address: Option<String>,
    pub display_name: Option<String>,
    /// The CN. Required for creation, not accepted by `Set-ADUser`.
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub employee_id: Option<String>,
    /// Target OU distinguished name. Creation only.
    pub path: Option<String>,
    pub user_principal_name: Option<String>,
}

impl AdUserParams {
    /// Whether no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sam_account_name.is_none()
            && self.given_name.is_none()
            && self.surname.is_none()
            && self.email_address.is_none()
            && self.display_name.is_none()
            && self.name.is_none()
            && self.enabled.is_none()
            && self.employee_id.is_none()
            && self.path.is_none()
            && self.user_principal_name.is_none()
    }

    /// Drop the parameters only `New-ADUser` accepts (`Name`, `Path`).
    pub fn strip_create_only(&mut self) {
        self.name = None;
        self.path = None;
    }

    /// Apply every set parameter to a cmdlet under construction.
    #[must_use]
    pub fn apply_to(&self, mut cmd: PsCommand) -> PsCommand {
        if let Some(v) = &self.sam_account_name {
            cmd = cmd.param("SamAccountName", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.given_name {
            cmd = cmd.param("GivenName", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.surname {
            cmd = cmd.param("Surname", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.email_address {
            cmd = cmd.param("EmailAddress", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.display_name {
            cmd = cmd.param("DisplayName", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.name {
            cmd = cmd.param("Name", PsValue::Text(v.clone()));
        }
        if let Some(v) = self.enabled {
            cmd = cmd.param("Enabled", PsValue::Bool(v));
        }
        if let Some(v) = &self.employee_id {
            cmd = cmd.param("EmployeeID", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.path {
            cmd = cmd.param("Path", PsValue::Text(v.clone()));
        }
        if let Some(v) = &self.user_principal_name {
            cmd = cmd.param("UserPrincipalName", PsValue::Text(v.clone()));
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params() {
        assert!(AdUserParams::default().is_empty());

        let params = AdUserParams {
            enabled: Some(false),
            ..Default::default()
        };
        assert!(!params.is_empty());
    }

    #[test]
    fn test_strip_create_only() {
        let mut params = AdUserParams {
            sam_account_name: Some("alice".to_string()),
            name: Some("Alice Example".to_string()),
            path: Some("OU=Staff,DC=example,DC=com".to_string()),
            ..Default::default()
        };
        params.strip_create_only();
        assert!(params.name.is_none());
        assert!(params.path.is_none());
        assert_eq!(params.sam_account_name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_apply_to_renders_only_set_params() {
        let params = AdUserParams {
            sam_account_name: Some("alice".to_string()),
            enabled: Some(true),
            ..Default::default()
        };
        let cmd = params.apply_to(PsCommand::new("Set-ADUser"));
        assert_eq!(cmd.render(), "Set-ADUser -Enabled $true -SamAccountName 'alice'");
    }
}
