//! SCIM PATCH application (RFC 7644 Section 3.5.2) over the dynamic
//! SCIM view.
//!
//! Supports the path shapes identity providers actually send: no path,
//! simple attribute names, one level of multi-valued selection
//! (`emails[type eq "work"].value`), and depth-2 dotted paths
//! (`name.givenName`). The input resource is never mutated; the caller
//! receives the new document plus the set of top-level fields that were
//! touched, which is what drives the directory update.

use serde_json::{Map, Value};

use crate::error::{ScimError, ScimResult};
use crate::models::ScimPatchOp;

/// Result of applying a list of patch operations.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patched resource.
    pub resource: Map<String, Value>,
    /// Top-level fields that were touched, with their post-update values
    /// (`null` for removed fields).
    pub changed: Map<String, Value>,
}

/// Apply a list of patch operations to a resource.
pub fn apply_operations(
    resource: &Map<String, Value>,
    ops: &[ScimPatchOp],
) -> ScimResult<PatchOutcome> {
    let mut result = resource.clone();
    let mut changed = Map::new();

    for op in ops {
        apply_one(&mut result, &mut changed, op)?;
    }

    Ok(PatchOutcome {
        resource: result,
        changed,
    })
}

fn apply_one(
    resource: &mut Map<String, Value>,
    changed: &mut Map<String, Value>,
    op: &ScimPatchOp,
) -> ScimResult<()> {
    let kind = op.op.to_lowercase();
    if !matches!(kind.as_str(), "add" | "remove" | "replace") {
        return Err(ScimError::Validation(format!(
            "Unknown PATCH operation '{}'",
            op.op
        )));
    }
    let remove = kind == "remove";

    let path = op.path.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let Some(path) = path else {
        // No path: the value is an object of top-level attributes.
        // A remove without a path is a no-op.
        if remove {
            return Ok(());
        }
        let value = required_value(op)?;
        let Some(obj) = value.as_object() else {
            return Err(ScimError::Validation(
                "PATCH value without a path must be an object".to_string(),
            ));
        };
        for (key, val) in obj {
            resource.insert(key.clone(), val.clone());
            changed.insert(key.clone(), val.clone());
        }
        return Ok(());
    };

    if let Some(value_path) = parse_value_path(path) {
        return apply_value_path(resource, changed, remove, &value_path, op);
    }

    if let Some((parent, child)) = split_dotted(path) {
        let mut obj = match resource.get(parent) {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };
        if remove {
            obj.remove(child);
        } else {
            let value = required_value(op)?;
            obj.insert(child.to_string(), value.clone());
        }
        let new = Value::Object(obj);
        resource.insert(parent.to_string(), new.clone());
        changed.insert(parent.to_string(), new);
        return Ok(());
    }

    // Simple name, or anything unrecognized treated as a single key.
    if remove {
        resource.remove(path);
        changed.insert(path.to_string(), Value::Null);
    } else {
        let value = required_value(op)?;
        resource.insert(path.to_string(), value.clone());
        changed.insert(path.to_string(), value.clone());
    }
    Ok(())
}

/// A parsed multi-valued path: `attr[name eq value]` or
/// `attr[name eq value].sub`.
struct ValuePath<'a> {
    attr: &'a str,
    filter_name: &'a str,
    filter_value: Value,
    sub: Option<&'a str>,
}

fn parse_value_path(path: &str) -> Option<ValuePath<'_>> {
    let open = path.find('[')?;
    let close = open + path[open..].find(']')?;
    let attr = &path[..open];
    if attr.is_empty() {
        return None;
    }

    let sub = match &path[close + 1..] {
        "" => None,
        after => {
            let sub = after.strip_prefix('.')?;
            if sub.is_empty() {
                return None;
            }
            Some(sub)
        }
    };

    let inner = &path[open + 1..close];
    let mut parts = inner.splitn(2, " eq ");
    let filter_name = parts.next()?.trim();
    let raw = parts.next()?.trim();
    if filter_name.is_empty() || raw.is_empty() {
        return None;
    }

    let filter_value = if let Some(stripped) = raw.strip_prefix('"') {
        Value::String(stripped.strip_suffix('"')?.to_string())
    } else if raw == "true" {
        Value::Bool(true)
    } else if raw == "false" {
        Value::Bool(false)
    } else {
        Value::String(raw.to_string())
    };

    Some(ValuePath {
        attr,
        filter_name,
        filter_value,
        sub,
    })
}

fn apply_value_path(
    resource: &mut Map<String, Value>,
    changed: &mut Map<String, Value>,
    remove: bool,
    path: &ValuePath<'_>,
    op: &ScimPatchOp,
) -> ScimResult<()> {
    let mut list: Vec<Value> = match resource.get(path.attr) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    if remove {
        list.retain(|item| !element_matches(item, path.filter_name, &path.filter_value));
    } else {
        let value = required_value(op)?;
        match list
            .iter()
            .position(|item| element_matches(item, path.filter_name, &path.filter_value))
        {
            Some(index) => set_element(&mut list[index], path.sub, value)?,
            None => {
                // No element matched: synthesize one from the filter
                // predicate and append it. Not RFC-mandated, but it is
                // what Okta-style traffic expects when it patches a
                // sub-attribute of a not-yet-existing email.
                let mut element = Map::new();
                element.insert(path.filter_name.to_string(), path.filter_value.clone());
                let mut element = Value::Object(element);
                set_element(&mut element, path.sub, value)?;
                list.push(element);
            }
        }
    }

    let new = Value::Array(list);
    resource.insert(path.attr.to_string(), new.clone());
    changed.insert(path.attr.to_string(), new);
    Ok(())
}

fn element_matches(element: &Value, name: &str, value: &Value) -> bool {
    element
        .as_object()
        .and_then(|obj| obj.get(name))
        .is_some_and(|found| found == value)
}

fn set_element(element: &mut Value, sub: Option<&str>, value: &Value) -> ScimResult<()> {
    let Some(obj) = element.as_object_mut() else {
        return Ok(());
    };
    match sub {
        Some(sub) => {
            obj.insert(sub.to_string(), value.clone());
        }
        None => {
            let Some(source) = value.as_object() else {
                return Err(ScimError::Validation(
                    "PATCH value for a multi-valued element must be an object".to_string(),
                ));
            };
            for (key, val) in source {
                obj.insert(key.clone(), val.clone());
            }
        }
    }
    Ok(())
}

/// Depth-2 dotted path; deeper paths fall through to single-key handling.
fn split_dotted(path: &str) -> Option<(&str, &str)> {
    if path.contains('[') {
        return None;
    }
    let (parent, child) = path.split_once('.')?;
    if parent.is_empty() || child.is_empty() || child.contains('.') {
        return None;
    }
    Some((parent, child))
}

fn required_value(op: &ScimPatchOp) -> ScimResult<&Value> {
    op.value.as_ref().ok_or_else(|| {
        ScimError::Validation(format!("PATCH operation '{}' requires a value", op.op))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn op(kind: &str, path: Option<&str>, value: Option<Value>) -> ScimPatchOp {
        ScimPatchOp {
            op: kind.to_string(),
            path: path.map(str::to_string),
            value,
        }
    }

    #[test]
    fn test_empty_operations_is_identity() {
        let original = resource(json!({"userName": "alice", "active": true}));
        let outcome = apply_operations(&original, &[]).unwrap();

        assert_eq!(outcome.resource, original);
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_replace_simple_path() {
        let original = resource(json!({"userName": "alice", "active": true}));
        let ops = [op("replace", Some("active"), Some(json!(false)))];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["active"], json!(false));
        assert_eq!(outcome.changed["active"], json!(false));
        // input untouched
        assert_eq!(original["active"], json!(true));
    }

    #[test]
    fn test_replace_is_idempotent() {
        let original = resource(json!({"displayName": "Old"}));
        let ops = [op("replace", Some("displayName"), Some(json!("New")))];

        let once = apply_operations(&original, &ops).unwrap();
        let twice = apply_operations(&once.resource, &ops).unwrap();

        assert_eq!(once.resource, twice.resource);
        assert_eq!(once.changed["displayName"], json!("New"));
        assert_eq!(twice.changed["displayName"], json!("New"));
    }

    #[test]
    fn test_op_name_case_insensitive() {
        let original = resource(json!({}));
        let ops = [op("Replace", Some("active"), Some(json!(false)))];
        let outcome = apply_operations(&original, &ops).unwrap();
        assert_eq!(outcome.resource["active"], json!(false));
    }

    #[test]
    fn test_add_without_path_merges_object() {
        let original = resource(json!({"userName": "alice"}));
        let ops = [op(
            "add",
            None,
            Some(json!({"displayName": "Alice", "active": false})),
        )];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["userName"], json!("alice"));
        assert_eq!(outcome.resource["displayName"], json!("Alice"));
        assert_eq!(outcome.changed.len(), 2);
    }

    #[test]
    fn test_no_path_non_object_value_rejected() {
        let original = resource(json!({}));
        let ops = [op("replace", None, Some(json!("scalar")))];
        let err = apply_operations(&original, &ops).unwrap_err();
        assert!(matches!(err, ScimError::Validation(_)));
    }

    #[test]
    fn test_remove_without_path_is_noop() {
        let original = resource(json!({"userName": "alice"}));
        let ops = [op("remove", None, None)];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource, original);
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_remove_simple_path() {
        let original = resource(json!({"displayName": "Alice", "userName": "alice"}));
        let ops = [op("remove", Some("displayName"), None)];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert!(!outcome.resource.contains_key("displayName"));
        assert_eq!(outcome.changed["displayName"], Value::Null);
    }

    #[test]
    fn test_dotted_path_upserts_parent() {
        let original = resource(json!({"userName": "alice"}));
        let ops = [op("replace", Some("name.givenName"), Some(json!("Alice")))];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["name"], json!({"givenName": "Alice"}));
        assert_eq!(outcome.changed["name"], json!({"givenName": "Alice"}));
    }

    #[test]
    fn test_dotted_path_preserves_siblings() {
        let original = resource(json!({"name": {"givenName": "Al", "familyName": "Ice"}}));
        let ops = [op("replace", Some("name.givenName"), Some(json!("Alice")))];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["name"],
            json!({"givenName": "Alice", "familyName": "Ice"})
        );
    }

    #[test]
    fn test_dotted_remove_deletes_child() {
        let original = resource(json!({"name": {"givenName": "Al", "familyName": "Ice"}}));
        let ops = [op("remove", Some("name.givenName"), None)];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["name"], json!({"familyName": "Ice"}));
    }

    #[test]
    fn test_value_path_synthesizes_missing_element() {
        // emails is empty: the filter predicate becomes the new element
        let original = resource(json!({"userName": "alice", "emails": []}));
        let ops = [op(
            "add",
            Some(r#"emails[type eq "work"].value"#),
            Some(json!("a@b")),
        )];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["emails"],
            json!([{"type": "work", "value": "a@b"}])
        );
        assert_eq!(
            outcome.changed["emails"],
            json!([{"type": "work", "value": "a@b"}])
        );
    }

    #[test]
    fn test_value_path_updates_matching_element() {
        let original = resource(json!({
            "emails": [
                {"type": "home", "value": "h@b"},
                {"type": "work", "value": "old@b"}
            ]
        }));
        let ops = [op(
            "replace",
            Some(r#"emails[type eq "work"].value"#),
            Some(json!("new@b")),
        )];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["emails"],
            json!([
                {"type": "home", "value": "h@b"},
                {"type": "work", "value": "new@b"}
            ])
        );
    }

    #[test]
    fn test_value_path_merge_without_sub_attr() {
        let original = resource(json!({
            "emails": [{"type": "work", "value": "old@b"}]
        }));
        let ops = [op(
            "replace",
            Some(r#"emails[type eq "work"]"#),
            Some(json!({"value": "new@b", "primary": true})),
        )];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["emails"],
            json!([{"type": "work", "value": "new@b", "primary": true}])
        );
    }

    #[test]
    fn test_value_path_remove_drops_all_matches() {
        let original = resource(json!({
            "emails": [
                {"type": "work", "value": "a@b"},
                {"type": "home", "value": "h@b"},
                {"type": "work", "value": "c@b"}
            ]
        }));
        let ops = [op("remove", Some(r#"emails[type eq "work"]"#), None)];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["emails"],
            json!([{"type": "home", "value": "h@b"}])
        );
    }

    #[test]
    fn test_value_path_boolean_filter() {
        let original = resource(json!({
            "emails": [
                {"primary": false, "value": "a@b"},
                {"primary": true, "value": "p@b"}
            ]
        }));
        let ops = [op(
            "replace",
            Some("emails[primary eq true].value"),
            Some(json!("new@b")),
        )];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(
            outcome.resource["emails"][1],
            json!({"primary": true, "value": "new@b"})
        );
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let original = resource(json!({}));
        let ops = [op("move", Some("active"), Some(json!(false)))];
        let err = apply_operations(&original, &ops).unwrap_err();
        assert!(matches!(err, ScimError::Validation(_)));
    }

    #[test]
    fn test_missing_value_rejected() {
        let original = resource(json!({}));
        let ops = [op("replace", Some("active"), None)];
        let err = apply_operations(&original, &ops).unwrap_err();
        assert!(matches!(err, ScimError::Validation(_)));
    }

    #[test]
    fn test_deep_dotted_path_falls_back_to_single_key() {
        let original = resource(json!({}));
        let ops = [op("replace", Some("a.b.c"), Some(json!(1)))];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["a.b.c"], json!(1));
        assert_eq!(outcome.changed["a.b.c"], json!(1));
    }

    #[test]
    fn test_operations_apply_in_order() {
        let original = resource(json!({}));
        let ops = [
            op("add", Some("displayName"), Some(json!("First"))),
            op("replace", Some("displayName"), Some(json!("Second"))),
        ];
        let outcome = apply_operations(&original, &ops).unwrap();

        assert_eq!(outcome.resource["displayName"], json!("Second"));
        assert_eq!(outcome.changed["displayName"], json!("Second"));
    }
}
