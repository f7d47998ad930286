//! In-memory post-filtering
//!
//! Equality only, no coercion between JSON types. Numbers compare by
//! value, so `1` matches `1.0`. A missing field never matches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::value_at_path;

/// Which filter pairs a record has to satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFilterMode {
    /// Every pair must match
    #[default]
    AllPairs,
    /// Only the first pair, in filter order, is checked
    FirstPair,
}

impl PostFilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostFilterMode::AllPairs => "all_pairs",
            PostFilterMode::FirstPair => "first_pair",
        }
    }
}

pub struct PostFilter;

impl PostFilter {
    /// Checks a record against `pairs`. An empty list matches everything.
    pub fn matches(record: &Value, pairs: &[(String, Value)], mode: PostFilterMode) -> bool {
        match mode {
            PostFilterMode::AllPairs => pairs
                .iter()
                .all(|(field, expected)| Self::matches_pair(record, field, expected)),
            PostFilterMode::FirstPair => pairs
                .first()
                .map_or(true, |(field, expected)| Self::matches_pair(record, field, expected)),
        }
    }

    /// Keeps the matching records, in order
    pub fn apply(records: Vec<Value>, pairs: &[(String, Value)], mode: PostFilterMode) -> Vec<Value> {
        if pairs.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|record| Self::matches(record, pairs, mode))
            .collect()
    }

    fn matches_pair(record: &Value, field: &str, expected: &Value) -> bool {
        let actual = record
            .as_object()
            .and_then(|obj| obj.get(field))
            .or_else(|| value_at_path(record, field));
        actual.map_or(false, |actual| values_equal(actual, expected))
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(filter: Value) -> Vec<(String, Value)> {
        filter
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_pairs_requires_every_pair() {
        let record = json!({"role": "admin", "age": 30});
        let mode = PostFilterMode::AllPairs;
        assert!(PostFilter::matches(&record, &pairs(json!({"role": "admin", "age": 30})), mode));
        assert!(!PostFilter::matches(&record, &pairs(json!({"role": "admin", "age": 31})), mode));
    }

    #[test]
    fn test_first_pair_ignores_later_pairs() {
        let record = json!({"role": "admin", "age": 30});
        let mode = PostFilterMode::FirstPair;
        assert!(PostFilter::matches(&record, &pairs(json!({"role": "admin", "age": 31})), mode));
        assert!(!PostFilter::matches(&record, &pairs(json!({"age": 31, "role": "admin"})), mode));
    }

    #[test]
    fn test_no_type_coercion() {
        let record = json!({"value": 123});
        assert!(!PostFilter::matches(
            &record,
            &pairs(json!({"value": "123"})),
            PostFilterMode::AllPairs
        ));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let record = json!({"value": 1});
        assert!(PostFilter::matches(
            &record,
            &pairs(json!({"value": 1.0})),
            PostFilterMode::AllPairs
        ));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let record = json!({"a": 1});
        assert!(!PostFilter::matches(
            &record,
            &pairs(json!({"b": null})),
            PostFilterMode::AllPairs
        ));
    }

    #[test]
    fn test_dotted_field() {
        let record = json!({"profile": {"city": "Oslo"}});
        assert!(PostFilter::matches(
            &record,
            &pairs(json!({"profile.city": "Oslo"})),
            PostFilterMode::AllPairs
        ));
    }

    #[test]
    fn test_apply_preserves_order() {
        let records = vec![json!({"id": 3, "k": 1}), json!({"id": 1, "k": 2}), json!({"id": 2, "k": 1})];
        let kept = PostFilter::apply(records, &pairs(json!({"k": 1})), PostFilterMode::AllPairs);
        assert_eq!(kept, vec![json!({"id": 3, "k": 1}), json!({"id": 2, "k": 1})]);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(PostFilterMode::default(), PostFilterMode::AllPairs);
        let mode: PostFilterMode = serde_json::from_value(json!("first_pair")).unwrap();
        assert_eq!(mode.as_str(), "first_pair");
    }
}
