//! Shallow merge for `update` with `merge: true`

use serde_json::Value;

/// Overlays `patch` on `existing`, one level deep.
///
/// Patch fields win, fields only in `existing` are kept. If either side
/// is missing or not an object the result is the patch.
pub fn shallow_merge(existing: Option<&Value>, patch: &Value) -> Value {
    match (existing, patch) {
        (Some(Value::Object(base)), Value::Object(overlay)) => {
            let mut merged = base.clone();
            for (field, value) in overlay {
                merged.insert(field.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_wins_and_existing_kept() {
        let existing = json!({"id": 1, "name": "a", "role": "user"});
        let merged = shallow_merge(Some(&existing), &json!({"role": "admin", "age": 3}));
        assert_eq!(merged, json!({"id": 1, "name": "a", "role": "admin", "age": 3}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let existing = json!({"profile": {"a": 1, "b": 2}});
        let merged = shallow_merge(Some(&existing), &json!({"profile": {"a": 9}}));
        assert_eq!(merged, json!({"profile": {"a": 9}}));
    }

    #[test]
    fn test_missing_or_non_object_side_yields_patch() {
        let patch = json!({"x": 1});
        assert_eq!(shallow_merge(None, &patch), patch);
        assert_eq!(shallow_merge(Some(&json!("scalar")), &patch), patch);
        assert_eq!(shallow_merge(Some(&json!({"y": 2})), &json!(5)), json!(5));
    }
}
