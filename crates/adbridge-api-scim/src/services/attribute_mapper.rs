//! Bidirectional mapping between the SCIM view and AD cmdlet parameters.
//!
//! The SCIM view is a dynamic JSON document owned by the identity
//! provider; every read here is tolerant, treating a field of the wrong
//! type as absent rather than failing the request.

use serde_json::{json, Map, Value};

use adbridge_connector_ad::AdUserParams;

/// AD's pre-2000 logon name limit.
const MAX_SAM_CHARS: usize = 20;

/// Derive the `sAMAccountName` from a SCIM `userName`: the portion before
/// the first `@`, truncated to 20 characters.
#[must_use]
pub fn derive_sam(user_name: &str) -> String {
    user_name
        .split('@')
        .next()
        .unwrap_or(user_name)
        .chars()
        .take(MAX_SAM_CHARS)
        .collect()
}

/// Map a SCIM view to directory parameters.
///
/// `base_ou` is supplied on the creation path only and becomes `Path`.
/// Unset inputs produce unset outputs.
#[must_use]
pub fn scim_to_params(view: &Map<String, Value>, base_ou: Option<&str>) -> AdUserParams {
    let mut params = AdUserParams::default();

    if let Some(user_name) = get_str(view, "userName") {
        params.sam_account_name = Some(derive_sam(user_name));
        if user_name.contains('@') {
            params.user_principal_name = Some(user_name.to_string());
        }
    }

    if let Some(name) = get_obj(view, "name") {
        params.given_name = get_str(name, "givenName").map(str::to_string);
        params.surname = get_str(name, "familyName").map(str::to_string);
    }

    params.email_address = primary_email(view).map(str::to_string);
    params.display_name = get_str(view, "displayName").map(str::to_string);
    params.enabled = get_bool(view, "active");
    params.employee_id = get_str(view, "externalId").map(str::to_string);

    // The CN, required for creation.
    params.name = params
        .display_name
        .clone()
        .or_else(|| params.sam_account_name.clone());

    if let Some(ou) = base_ou {
        params.path = Some(ou.to_string());
    }

    params
}

/// Map only the fields a PATCH touched to directory parameters.
///
/// Removed fields arrive as `null` and stay unset; the directory keeps
/// its current value rather than receiving an empty one.
#[must_use]
pub fn params_from_changed(changed: &Map<String, Value>) -> AdUserParams {
    let mut params = AdUserParams::default();

    for (key, value) in changed {
        match key.as_str() {
            "userName" => {
                if let Some(user_name) = value.as_str() {
                    params.sam_account_name = Some(derive_sam(user_name));
                    if user_name.contains('@') {
                        params.user_principal_name = Some(user_name.to_string());
                    }
                }
            }
            "displayName" => {
                params.display_name = value.as_str().map(str::to_string);
            }
            "active" => {
                params.enabled = value.as_bool();
            }
            "externalId" => {
                params.employee_id = value.as_str().map(str::to_string);
            }
            "name" => {
                if let Some(name) = value.as_object() {
                    params.given_name = get_str(name, "givenName").map(str::to_string);
                    params.surname = get_str(name, "familyName").map(str::to_string);
                }
            }
            "emails" => {
                if let Some(emails) = value.as_array() {
                    params.email_address = pick_email(emails).map(str::to_string);
                }
            }
            _ => {}
        }
    }

    params
}

/// Merge a directory read-back into an existing SCIM view, producing the
/// AD view stored alongside it.
#[must_use]
pub fn ad_to_scim(existing: &Map<String, Value>, ad_record: &Value) -> Map<String, Value> {
    let mut view = existing.clone();
    let Some(record) = ad_record.as_object() else {
        return view;
    };

    if let Some(sam) = get_str(record, "SamAccountName") {
        view.insert("userName".to_string(), json!(sam));
    }
    if let Some(display) = get_str(record, "DisplayName") {
        view.insert("displayName".to_string(), json!(display));
    }

    let given = get_str(record, "GivenName");
    let surname = get_str(record, "Surname");
    if given.is_some() || surname.is_some() {
        let mut name = match view.get("name") {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };
        if let Some(given) = given {
            name.insert("givenName".to_string(), json!(given));
        }
        if let Some(surname) = surname {
            name.insert("familyName".to_string(), json!(surname));
        }
        view.insert("name".to_string(), Value::Object(name));
    }

    if let Some(mail) = get_str(record, "EmailAddress") {
        view.insert(
            "emails".to_string(),
            json!([{"value": mail, "type": "work", "primary": true}]),
        );
    }
    if let Some(enabled) = get_bool(record, "Enabled") {
        view.insert("active".to_string(), json!(enabled));
    }

    view
}

/// The email to provision: the first entry flagged primary, else the
/// first entry.
#[must_use]
pub fn primary_email(view: &Map<String, Value>) -> Option<&str> {
    let emails = view.get("emails")?.as_array()?;
    pick_email(emails)
}

fn pick_email(emails: &[Value]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.get("primary").and_then(Value::as_bool) == Some(true))
        .or_else(|| emails.first())
        .and_then(|e| e.get("value"))
        .and_then(Value::as_str)
}

/// Tolerant string accessor: absent or type-mismatched fields are `None`.
#[must_use]
pub fn get_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Tolerant boolean accessor.
#[must_use]
pub fn get_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

/// Tolerant object accessor.
#[must_use]
pub fn get_obj<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_derive_sam_strips_domain() {
        assert_eq!(derive_sam("alice@example.com"), "alice");
        assert_eq!(derive_sam("bob"), "bob");
    }

    #[test]
    fn test_derive_sam_truncates_to_twenty() {
        let sam = derive_sam("aaaaaaaaaaaaaaaaaaaaaaaaa@b");
        assert_eq!(sam, "aaaaaaaaaaaaaaaaaaaa");
        assert_eq!(sam.chars().count(), 20);
    }

    #[test]
    fn test_derive_sam_first_at_wins() {
        assert_eq!(derive_sam("a@b@c"), "a");
    }

    #[test]
    fn test_scim_to_params_full() {
        let view = view(json!({
            "userName": "alice@example.com",
            "name": {"givenName": "Al", "familyName": "Ice"},
            "displayName": "Al Ice",
            "active": true,
            "externalId": "emp-42",
            "emails": [
                {"value": "other@example.com", "primary": false},
                {"value": "alice@example.com", "type": "work", "primary": true}
            ]
        }));

        let params = scim_to_params(&view, Some("OU=Staff,DC=example,DC=com"));

        assert_eq!(params.sam_account_name.as_deref(), Some("alice"));
        assert_eq!(params.user_principal_name.as_deref(), Some("alice@example.com"));
        assert_eq!(params.given_name.as_deref(), Some("Al"));
        assert_eq!(params.surname.as_deref(), Some("Ice"));
        assert_eq!(params.email_address.as_deref(), Some("alice@example.com"));
        assert_eq!(params.display_name.as_deref(), Some("Al Ice"));
        assert_eq!(params.enabled, Some(true));
        assert_eq!(params.employee_id.as_deref(), Some("emp-42"));
        assert_eq!(params.name.as_deref(), Some("Al Ice"));
        assert_eq!(params.path.as_deref(), Some("OU=Staff,DC=example,DC=com"));
    }

    #[test]
    fn test_scim_to_params_unset_stays_unset() {
        let view = view(json!({"userName": "bob"}));
        let params = scim_to_params(&view, None);

        assert_eq!(params.sam_account_name.as_deref(), Some("bob"));
        assert!(params.user_principal_name.is_none());
        assert!(params.given_name.is_none());
        assert!(params.email_address.is_none());
        assert!(params.enabled.is_none());
        assert!(params.path.is_none());
        // CN falls back to the sAM when there is no display name
        assert_eq!(params.name.as_deref(), Some("bob"));
    }

    #[test]
    fn test_scim_to_params_tolerates_type_mismatches() {
        let view = view(json!({
            "userName": "carol",
            "active": "yes",
            "name": "not-an-object",
            "emails": {"value": "not-a-list"}
        }));
        let params = scim_to_params(&view, None);

        assert!(params.enabled.is_none());
        assert!(params.given_name.is_none());
        assert!(params.email_address.is_none());
    }

    #[test]
    fn test_first_email_when_none_primary() {
        let view = view(json!({
            "emails": [
                {"value": "first@example.com"},
                {"value": "second@example.com"}
            ]
        }));
        assert_eq!(primary_email(&view), Some("first@example.com"));
    }

    #[test]
    fn test_params_from_changed_active_only() {
        let changed = view(json!({"active": false}));
        let params = params_from_changed(&changed);

        assert_eq!(params.enabled, Some(false));
        assert!(params.sam_account_name.is_none());
        assert!(params.display_name.is_none());
        assert!(params.name.is_none());
    }

    #[test]
    fn test_params_from_changed_emails() {
        let changed = view(json!({"emails": [{"type": "work", "value": "a@b"}]}));
        let params = params_from_changed(&changed);
        assert_eq!(params.email_address.as_deref(), Some("a@b"));
    }

    #[test]
    fn test_params_from_changed_removed_field_stays_unset() {
        let changed = view(json!({"displayName": null}));
        let params = params_from_changed(&changed);
        assert!(params.display_name.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_params_from_changed_ignores_unmapped_keys() {
        let changed = view(json!({"nickName": "Ali", "active": true}));
        let params = params_from_changed(&changed);
        assert_eq!(params.enabled, Some(true));
    }

    #[test]
    fn test_ad_to_scim_merges_and_preserves() {
        let existing = view(json!({
            "userName": "alice",
            "name": {"givenName": "Old", "honorificPrefix": "Dr."},
            "externalId": "emp-42"
        }));
        let record = json!({
            "SamAccountName": "alice",
            "GivenName": "Al",
            "Surname": "Ice",
            "DisplayName": "Al Ice",
            "EmailAddress": "alice@example.com",
            "Enabled": true
        });

        let merged = ad_to_scim(&existing, &record);

        assert_eq!(merged["userName"], json!("alice"));
        assert_eq!(merged["displayName"], json!("Al Ice"));
        assert_eq!(
            merged["name"],
            json!({"givenName": "Al", "familyName": "Ice", "honorificPrefix": "Dr."})
        );
        assert_eq!(
            merged["emails"],
            json!([{"value": "alice@example.com", "type": "work", "primary": true}])
        );
        assert_eq!(merged["active"], json!(true));
        // untouched fields survive the merge
        assert_eq!(merged["externalId"], json!("emp-42"));
    }

    #[test]
    fn test_ad_to_scim_non_object_record_is_noop() {
        let existing = view(json!({"userName": "alice"}));
        let merged = ad_to_scim(&existing, &json!(null));
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_map_round_trip_on_mapped_subset() {
        // A user whose fields sit inside the mapped set survives
        // scim→params followed by ad→scim unchanged.
        let original = view(json!({
            "userName": "jdoe",
            "name": {"givenName": "J", "familyName": "Doe"},
            "displayName": "J Doe",
            "active": true,
            "emails": [{"value": "j@example.com", "type": "work", "primary": true}]
        }));

        let params = scim_to_params(&original, None);
        let record = json!({
            "SamAccountName": params.sam_account_name,
            "GivenName": params.given_name,
            "Surname": params.surname,
            "DisplayName": params.display_name,
            "EmailAddress": params.email_address,
            "Enabled": params.enabled
        });

        let round_tripped = ad_to_scim(&Map::new(), &record);

        assert_eq!(round_tripped["userName"], original["userName"]);
        assert_eq!(round_tripped["name"], original["name"]);
        assert_eq!(round_tripped["displayName"], original["displayName"]);
        assert_eq!(round_tripped["active"], original["active"]);
        assert_eq!(round_tripped["emails"], original["emails"]);
    }
}
