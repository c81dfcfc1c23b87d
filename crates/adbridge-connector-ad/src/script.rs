//! PowerShell command rendering.
//!
//! Cmdlet invocations are assembled from typed values and rendered into a
//! single script string handed to the PowerShell executable as one argv
//! entry. No part of a value ever reaches a shell interpreter.

use std::collections::BTreeMap;

/// Marker substituted for sensitive values in audit records.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Parameter names whose values never appear in audit records
/// (matched case-insensitively).
const SENSITIVE_KEYS: &[&str] = &["accountpassword", "password", "secret", "token"];

/// A typed PowerShell parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsValue {
    /// Rendered as a single-quoted literal with embedded quotes doubled.
    Text(String),
    /// Rendered as `$true` / `$false`.
    Bool(bool),
    /// Rendered through `ConvertTo-SecureString`; always redacted in audit
    /// output regardless of the parameter name.
    Secret(String),
}

impl PsValue {
    fn render(&self) -> String {
        match self {
            PsValue::Text(s) => quote(s),
            PsValue::Bool(true) => "$true".to_string(),
            PsValue::Bool(false) => "$false".to_string(),
            PsValue::Secret(s) => {
                format!("(ConvertTo-SecureString {} -AsPlainText -Force)", quote(s))
            }
        }
    }

    fn audit_value(&self, key: &str) -> serde_json::Value {
        if SENSITIVE_KEYS.contains(&key.to_lowercase().as_str()) {
            return serde_json::Value::String(REDACTION_MARKER.to_string());
        }
        match self {
            PsValue::Text(s) => serde_json::Value::String(s.clone()),
            PsValue::Bool(b) => serde_json::Value::Bool(*b),
            // secure strings are redacted regardless of the key name
            PsValue::Secret(_) => serde_json::Value::String(REDACTION_MARKER.to_string()),
        }
    }
}

/// Quote a string as a PowerShell single-quoted literal.
///
/// Inside single quotes PowerShell performs no interpolation; the only
/// character needing escape is the quote itself, doubled.
#[must_use]
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// A single cmdlet invocation under construction.
///
/// Parameters are kept sorted so rendered scripts (and their audit
/// records) are deterministic.
#[derive(Debug, Clone)]
pub struct PsCommand {
    cmdlet: &'static str,
    params: BTreeMap<String, PsValue>,
    switches: Vec<&'static str>,
    json_output: bool,
}

impl PsCommand {
    /// Start building an invocation of the given cmdlet.
    #[must_use]
    pub fn new(cmdlet: &'static str) -> Self {
        Self {
            cmdlet,
            params: BTreeMap::new(),
            switches: Vec::new(),
            json_output: false,
        }
    }

    /// The logical cmdlet name (used for audit rows).
    #[must_use]
    pub fn cmdlet(&self) -> &'static str {
        self.cmdlet
    }

    /// Add a named parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: PsValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Add a raw switch such as `-Confirm:$false` or `-PassThru`.
    /// Switches are fixed strings chosen by this crate, never user data.
    #[must_use]
    pub fn switch(mut self, switch: &'static str) -> Self {
        self.switches.push(switch);
        self
    }

    /// Pipe the cmdlet output through `ConvertTo-Json`.
    #[must_use]
    pub fn json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Render the full script string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut script = String::from(self.cmdlet);
        for (key, value) in &self.params {
            script.push_str(&format!(" -{} {}", key, value.render()));
        }
        for switch in &self.switches {
            script.push(' ');
            script.push_str(switch);
        }
        if self.json_output {
            script.push_str(" | ConvertTo-Json -Depth 4");
        }
        script
    }

    /// Parameters as JSON for the audit log, with sensitive values
    /// replaced by [`REDACTION_MARKER`] before serialization.
    #[must_use]
    pub fn audit_parameters(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.audit_value(k)))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("alice"), "'alice'");
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(quote("'; Remove-Item C:\\"), "'''; Remove-Item C:\\'");
    }

    #[test]
    fn test_bool_rendering() {
        let cmd = PsCommand::new("Set-ADUser")
            .param("Identity", PsValue::Text("alice".to_string()))
            .param("Enabled", PsValue::Bool(false));
        assert_eq!(cmd.render(), "Set-ADUser -Enabled $false -Identity 'alice'");
    }

    #[test]
    fn test_secure_string_rendering() {
        let cmd = PsCommand::new("New-ADUser")
            .param("AccountPassword", PsValue::Secret("p'w".to_string()));
        assert_eq!(
            cmd.render(),
            "New-ADUser -AccountPassword (ConvertTo-SecureString 'p''w' -AsPlainText -Force)"
        );
    }

    #[test]
    fn test_switches_and_json_pipe() {
        let cmd = PsCommand::new("Get-ADUser")
            .param("Identity", PsValue::Text("alice".to_string()))
            .switch("-Properties *")
            .json_output();
        assert_eq!(
            cmd.render(),
            "Get-ADUser -Identity 'alice' -Properties * | ConvertTo-Json -Depth 4"
        );
    }

    #[test]
    fn test_params_render_sorted() {
        let cmd = PsCommand::new("New-ADUser")
            .param("Surname", PsValue::Text("Ice".to_string()))
            .param("GivenName", PsValue::Text("Al".to_string()));
        assert_eq!(cmd.render(), "New-ADUser -GivenName 'Al' -Surname 'Ice'");
    }

    #[test]
    fn test_audit_redacts_secret_values() {
        let cmd = PsCommand::new("New-ADUser")
            .param("SamAccountName", PsValue::Text("alice".to_string()))
            .param("AccountPassword", PsValue::Secret("hunter2".to_string()));
        let audit = cmd.audit_parameters();
        assert_eq!(audit["SamAccountName"], "alice");
        assert_eq!(audit["AccountPassword"], REDACTION_MARKER);
        assert!(!audit.to_string().contains("hunter2"));
    }

    #[test]
    fn test_audit_redacts_sensitive_keys_case_insensitively() {
        let cmd = PsCommand::new("Set-Thing")
            .param("Password", PsValue::Text("plain".to_string()))
            .param("TOKEN", PsValue::Text("tok".to_string()))
            .param("Secret", PsValue::Text("sec".to_string()));
        let audit = cmd.audit_parameters();
        assert_eq!(audit["Password"], REDACTION_MARKER);
        assert_eq!(audit["TOKEN"], REDACTION_MARKER);
        assert_eq!(audit["Secret"], REDACTION_MARKER);
    }

    #[test]
    fn test_audit_keeps_booleans() {
        let cmd = PsCommand::new("Set-ADUser").param("Enabled", PsValue::Bool(true));
        let audit = cmd.audit_parameters();
        assert_eq!(audit["Enabled"], serde_json::Value::Bool(true));
    }
}
