//! Ordered engine keys and key ranges
//!
//! Keys are serialized JSON scalars with a total order:
//! Number < String < Array. Numbers compare by value (`-0 == 0`),
//! arrays compare element-wise.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric key component with total ordering
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyNumber(f64);

impl KeyNumber {
    /// Creates a numeric key component; `None` for NaN.
    pub fn new(v: f64) -> Option<Self> {
        if v.is_nan() {
            return None;
        }
        // -0 and 0 are the same key
        Some(Self(if v == 0.0 { 0.0 } else { v }))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl PartialEq for KeyNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyNumber {}

impl PartialOrd for KeyNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for KeyNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// An engine key.
///
/// Variant declaration order defines cross-type ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric key
    Number(KeyNumber),
    /// String key
    String(String),
    /// Compound key
    Array(Vec<Key>),
}

impl Key {
    /// Create a key from an integer
    pub fn int(v: i64) -> Self {
        Key::Number(KeyNumber(v as f64))
    }

    /// Create a key from a string
    pub fn string(v: impl Into<String>) -> Self {
        Key::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Returns `None` for values that are not valid keys
    /// (null, booleans, objects, arrays containing those).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().and_then(KeyNumber::new).map(Key::Number),
            Value::String(s) => Some(Key::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Key::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Key::Array),
            _ => None,
        }
    }

    /// Converts the key back to JSON.
    ///
    /// Integral numbers within i64 range come back as integers.
    pub fn to_json(&self) -> Value {
        match self {
            Key::Number(n) => {
                let v = n.get();
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Value::from(v as i64)
                } else {
                    serde_json::Number::from_f64(v)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            Key::String(s) => Value::String(s.clone()),
            Key::Array(items) => Value::Array(items.iter().map(Key::to_json).collect()),
        }
    }
}

/// Resolves a dotted key path (`"a.b.c"`) inside a record.
pub fn value_at_path<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Writes `value` at a dotted key path, creating intermediate objects.
///
/// Returns false when an intermediate segment exists and is not an object.
pub fn set_value_at_path(record: &mut Value, path: &str, value: Value) -> bool {
    let mut segments = path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        let Some(obj) = current.as_object_mut() else {
            return false;
        };
        if segments.peek().is_none() {
            obj.insert(segment.to_string(), value);
            return true;
        }
        current = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    false
}

/// Extracts the key stored at `path`, if present and valid.
pub fn key_at_path(record: &Value, path: &str) -> Option<Key> {
    value_at_path(record, path).and_then(Key::from_json)
}

/// A contiguous range of keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Bound<Key>,
    pub upper: Bound<Key>,
}

impl KeyRange {
    /// Every key
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Exactly one key
    pub fn only(key: Key) -> Self {
        Self {
            lower: Bound::Included(key.clone()),
            upper: Bound::Included(key),
        }
    }

    /// Inclusive range `[start, end]`.
    ///
    /// Returns `None` if `start > end`.
    pub fn bound(start: Key, end: Key) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            lower: Bound::Included(start),
            upper: Bound::Included(end),
        })
    }

    /// Keys greater than or equal to `start`
    pub fn lower_bound(start: Key) -> Self {
        Self {
            lower: Bound::Included(start),
            upper: Bound::Unbounded,
        }
    }

    /// Keys less than or equal to `end`
    pub fn upper_bound(end: Key) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(end),
        }
    }

    /// Returns false for ranges that cannot contain any key in order
    /// (lower above upper, or an empty exclusive range).
    pub fn is_well_formed(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l <= u,
            (Bound::Included(l), Bound::Excluded(u)) | (Bound::Excluded(l), Bound::Included(u)) => {
                l <= u
            }
            (Bound::Excluded(l), Bound::Excluded(u)) => l < u,
            _ => true,
        }
    }

    pub(crate) fn as_bounds(&self) -> (Bound<&Key>, Bound<&Key>) {
        (self.lower.as_ref(), self.upper.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ordering() {
        let keys = vec![
            Key::from_json(&json!(-100)).unwrap(),
            Key::from_json(&json!(0)).unwrap(),
            Key::from_json(&json!(1.5)).unwrap(),
            Key::from_json(&json!(100)).unwrap(),
            Key::string(""),
            Key::string("aaa"),
            Key::string("zzz"),
            Key::from_json(&json!([1])).unwrap(),
            Key::from_json(&json!([1, "a"])).unwrap(),
        ];

        for i in 1..keys.len() {
            assert!(keys[i - 1] < keys[i], "{:?} < {:?}", keys[i - 1], keys[i]);
        }
    }

    #[test]
    fn test_ints_and_floats_interleave() {
        let one = Key::from_json(&json!(1)).unwrap();
        let one_point_five = Key::from_json(&json!(1.5)).unwrap();
        let two = Key::from_json(&json!(2)).unwrap();
        assert!(one < one_point_five && one_point_five < two);
        assert_eq!(one, Key::from_json(&json!(1.0)).unwrap());
    }

    #[test]
    fn test_negative_zero_equals_zero() {
        assert_eq!(
            Key::from_json(&json!(-0.0)).unwrap(),
            Key::from_json(&json!(0)).unwrap()
        );
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(Key::from_json(&json!(true)), None);
        assert_eq!(Key::from_json(&json!(null)), None);
        assert_eq!(Key::from_json(&json!({"a": 1})), None);
        assert_eq!(Key::from_json(&json!([1, null])), None);
    }

    #[test]
    fn test_to_json_keeps_integers() {
        assert_eq!(Key::int(3).to_json(), json!(3));
        assert_eq!(Key::from_json(&json!(2.5)).unwrap().to_json(), json!(2.5));
        assert_eq!(Key::string("x").to_json(), json!("x"));
    }

    #[test]
    fn test_dotted_paths() {
        let mut record = json!({"profile": {"email": "a@b.c"}});
        assert_eq!(
            key_at_path(&record, "profile.email"),
            Some(Key::string("a@b.c"))
        );
        assert_eq!(key_at_path(&record, "profile.missing"), None);

        assert!(set_value_at_path(&mut record, "meta.id", json!(7)));
        assert_eq!(record["meta"]["id"], json!(7));
    }

    #[test]
    fn test_range_construction() {
        let range = KeyRange::bound(Key::int(1), Key::int(2)).unwrap();
        assert!(range.is_well_formed());
        assert_eq!(
            range.as_bounds(),
            (Bound::Included(&Key::int(1)), Bound::Included(&Key::int(2)))
        );
        assert!(KeyRange::bound(Key::int(2), Key::int(1)).is_none());
        assert!(KeyRange::lower_bound(Key::int(5)).is_well_formed());
    }
}
