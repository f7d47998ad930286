//! Object stores and their secondary indexes
//!
//! Records live in a `BTreeMap<Key, Value>` ordered by primary key.
//! Each secondary index maps an index key to the sorted set of primary
//! keys carrying it, so index iteration order is (index key, primary key).
//!
//! # Invariants
//!
//! - Index entries are updated in the same call that changes a record
//! - A record whose indexed value is missing or not a valid key is not indexed
//! - A unique index never maps one key to two primary keys

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{EngineError, EngineResult};
use super::key::{key_at_path, set_value_at_path, value_at_path, Key, KeyRange};

/// Object store creation options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOptions {
    /// In-line key location (dotted path). `None` means out-of-line keys.
    #[serde(default, alias = "key_path")]
    pub key_path: Option<String>,
    /// Generate keys for records that carry none
    #[serde(default, alias = "auto_increment")]
    pub auto_increment: bool,
}

impl StoreOptions {
    /// In-line keys at `path`
    pub fn key_path(path: impl Into<String>) -> Self {
        Self {
            key_path: Some(path.into()),
            auto_increment: false,
        }
    }

    /// Enables the key generator
    pub fn with_auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

/// Index creation options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Reject two records sharing the same index key
    #[serde(default)]
    pub unique: bool,
}

impl IndexOptions {
    pub fn unique() -> Self {
        Self { unique: true }
    }
}

/// A secondary index over one key path
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    key_path: String,
    options: IndexOptions,
    entries: BTreeMap<Key, BTreeSet<Key>>,
}

impl SecondaryIndex {
    pub fn new(key_path: impl Into<String>, options: IndexOptions) -> Self {
        Self {
            key_path: key_path.into(),
            options,
            entries: BTreeMap::new(),
        }
    }

    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Index key of a record, if it has one
    pub fn key_of(&self, record: &Value) -> Option<Key> {
        key_at_path(record, &self.key_path)
    }

    fn insert(&mut self, key: Key, primary: Key) {
        self.entries.entry(key).or_default().insert(primary);
    }

    fn remove(&mut self, key: &Key, primary: &Key) {
        if let Some(primaries) = self.entries.get_mut(key) {
            primaries.remove(primary);
            if primaries.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    /// Returns true if writing `primary` under `key` would break uniqueness
    fn conflicts(&self, key: &Key, primary: &Key) -> bool {
        self.options.unique
            && self
                .entries
                .get(key)
                .map_or(false, |primaries| primaries.iter().any(|p| p != primary))
    }

    /// Primary keys stored under an exact index key, ascending
    #[cfg(test)]
    pub(crate) fn lookup_eq(&self, key: &Key) -> Vec<Key> {
        self.entries
            .get(key)
            .map(|primaries| primaries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Next (index key, primary key) entry inside `range`, strictly after `after`.
    pub fn next_after(&self, range: &KeyRange, after: Option<(&Key, &Key)>) -> Option<(Key, Key)> {
        if !range.is_well_formed() {
            return None;
        }

        let first_of = |(key, primaries): (&Key, &BTreeSet<Key>)| {
            primaries.iter().next().map(|p| (key.clone(), p.clone()))
        };

        match after {
            Some((key, primary)) => {
                let same_key = self.entries.get(key).and_then(|primaries| {
                    primaries
                        .range((Bound::Excluded(primary), Bound::Unbounded))
                        .next()
                });
                if let Some(next) = same_key {
                    return Some((key.clone(), next.clone()));
                }
                let (_, upper) = range.as_bounds();
                if let Bound::Included(u) | Bound::Excluded(u) = upper {
                    if key >= u {
                        return None;
                    }
                }
                self.entries
                    .range((Bound::Excluded(key), upper))
                    .find_map(first_of)
            }
            None => self.entries.range(range.as_bounds()).find_map(first_of),
        }
    }

    #[cfg(test)]
    pub(crate) fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}

/// A named collection of records
#[derive(Debug, Clone)]
pub struct ObjectStore {
    options: StoreOptions,
    records: BTreeMap<Key, Value>,
    indexes: BTreeMap<String, SecondaryIndex>,
    /// Key generator: next key handed out when auto_increment is set
    next_key: i64,
}

impl ObjectStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
            next_key: 1,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.indexes.get(name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub(crate) fn indexes(&self) -> impl Iterator<Item = (&String, &SecondaryIndex)> {
        self.indexes.iter()
    }

    pub(crate) fn next_key(&self) -> i64 {
        self.next_key
    }

    pub(crate) fn set_next_key(&mut self, next_key: i64) {
        self.next_key = next_key;
    }

    /// Declares a secondary index and populates it from existing records
    pub fn create_index(
        &mut self,
        name: &str,
        key_path: &str,
        options: IndexOptions,
    ) -> EngineResult<()> {
        if self.indexes.contains_key(name) {
            return Err(EngineError::AlreadyExists(format!("index '{}'", name)));
        }

        let mut index = SecondaryIndex::new(key_path, options);
        for (primary, record) in &self.records {
            if let Some(key) = index.key_of(record) {
                if index.conflicts(&key, primary) {
                    return Err(EngineError::Constraint(format!(
                        "unique index '{}' has duplicate key {:?}",
                        name, key
                    )));
                }
                index.insert(key, primary.clone());
            }
        }

        self.indexes.insert(name.to_string(), index);
        Ok(())
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.records.get(key)
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// All primary keys, ascending
    pub fn keys(&self) -> Vec<Key> {
        self.records.keys().cloned().collect()
    }

    /// Next record inside `range`, strictly after `after`, in key order
    pub fn next_after(&self, range: &KeyRange, after: Option<&Key>) -> Option<(Key, Value)> {
        if !range.is_well_formed() {
            return None;
        }
        let mut iter = match after {
            Some(key) => {
                let (_, upper) = range.as_bounds();
                if let Bound::Included(u) | Bound::Excluded(u) = upper {
                    if key >= u {
                        return None;
                    }
                }
                self.records.range((Bound::Excluded(key), upper))
            }
            None => self.records.range(range.as_bounds()),
        };
        iter.next().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Inserts a new record; fails if the key already exists.
    pub fn add(&mut self, mut value: Value, explicit: Option<Key>) -> EngineResult<Key> {
        let key = self.resolve_key(&mut value, explicit)?;
        if self.records.contains_key(&key) {
            return Err(EngineError::Constraint(format!(
                "key {:?} already exists in object store",
                key
            )));
        }
        self.write(key.clone(), value)?;
        Ok(key)
    }

    /// Inserts or replaces a record.
    pub fn put(&mut self, mut value: Value, explicit: Option<Key>) -> EngineResult<Key> {
        let key = self.resolve_key(&mut value, explicit)?;
        self.write(key.clone(), value)?;
        Ok(key)
    }

    /// Removes a record; returns whether one existed
    pub fn delete(&mut self, key: &Key) -> bool {
        match self.records.remove(key) {
            Some(old) => {
                for index in self.indexes.values_mut() {
                    if let Some(index_key) = index.key_of(&old) {
                        index.remove(&index_key, key);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Stores a record without key resolution (snapshot load)
    pub(crate) fn restore(&mut self, key: Key, value: Value) -> EngineResult<()> {
        self.write(key, value)
    }

    fn write(&mut self, key: Key, value: Value) -> EngineResult<()> {
        for (name, index) in &self.indexes {
            if let Some(index_key) = index.key_of(&value) {
                if index.conflicts(&index_key, &key) {
                    return Err(EngineError::Constraint(format!(
                        "unique index '{}' already contains {:?}",
                        name, index_key
                    )));
                }
            }
        }

        if let Some(old) = self.records.get(&key) {
            for index in self.indexes.values_mut() {
                if let Some(index_key) = index.key_of(old) {
                    index.remove(&index_key, &key);
                }
            }
        }
        for index in self.indexes.values_mut() {
            if let Some(index_key) = index.key_of(&value) {
                index.insert(index_key, key.clone());
            }
        }
        self.records.insert(key, value);
        Ok(())
    }

    /// Determines the primary key of a record being written.
    fn resolve_key(&mut self, value: &mut Value, explicit: Option<Key>) -> EngineResult<Key> {
        match self.options.key_path.clone() {
            Some(path) => {
                if explicit.is_some() {
                    return Err(EngineError::Data(
                        "explicit key given for a store with in-line keys".into(),
                    ));
                }
                if !value.is_object() {
                    return Err(EngineError::Data(format!(
                        "record must be an object to carry a key at '{}'",
                        path
                    )));
                }
                if let Some(key) = key_at_path(value, &path) {
                    self.observe_key(&key);
                    return Ok(key);
                }
                if value_at_path(value, &path).is_some() {
                    return Err(EngineError::Data(format!(
                        "value at '{}' is not a valid key",
                        path
                    )));
                }
                if !self.options.auto_increment {
                    return Err(EngineError::Data(format!(
                        "record has no key at '{}'",
                        path
                    )));
                }
                let key = self.generate_key()?;
                if !set_value_at_path(value, &path, key.to_json()) {
                    return Err(EngineError::Data(format!(
                        "cannot write generated key at '{}'",
                        path
                    )));
                }
                Ok(key)
            }
            None => match explicit {
                Some(key) => {
                    self.observe_key(&key);
                    Ok(key)
                }
                None if self.options.auto_increment => self.generate_key(),
                None => Err(EngineError::Data(
                    "store uses out-of-line keys and no key was given".into(),
                )),
            },
        }
    }

    fn generate_key(&mut self) -> EngineResult<Key> {
        let next = self
            .next_key
            .checked_add(1)
            .ok_or_else(|| EngineError::Constraint("key generator exhausted".into()))?;
        let key = Key::int(self.next_key);
        self.next_key = next;
        Ok(key)
    }

    /// Explicit numeric keys push the generator past them
    fn observe_key(&mut self, key: &Key) {
        if !self.options.auto_increment {
            return;
        }
        if let Key::Number(n) = key {
            let floor = n.get().floor();
            if floor < self.next_key as f64 {
                return;
            }
            self.next_key = if floor < i64::MAX as f64 {
                floor as i64 + 1
            } else {
                i64::MAX
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> ObjectStore {
        let mut store = ObjectStore::new(StoreOptions::key_path("id"));
        store
            .create_index("byRole", "role", IndexOptions::default())
            .unwrap();
        store
    }

    #[test]
    fn test_add_and_get() {
        let mut store = users();
        let key = store.add(json!({"id": 1, "role": "admin"}), None).unwrap();
        assert_eq!(key, Key::int(1));
        assert_eq!(store.get(&Key::int(1)), Some(&json!({"id": 1, "role": "admin"})));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut store = users();
        store.add(json!({"id": 1}), None).unwrap();
        let err = store.add(json!({"id": 1}), None).unwrap_err();
        assert_eq!(err.name(), "ConstraintError");
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut store = users();
        let err = store.add(json!({"role": "admin"}), None).unwrap_err();
        assert_eq!(err.name(), "DataError");
    }

    #[test]
    fn test_put_replaces_and_reindexes() {
        let mut store = users();
        store.add(json!({"id": 1, "role": "admin"}), None).unwrap();
        store.put(json!({"id": 1, "role": "user"}), None).unwrap();

        let index = store.index("byRole").unwrap();
        assert!(index.lookup_eq(&Key::string("admin")).is_empty());
        assert_eq!(index.lookup_eq(&Key::string("user")), vec![Key::int(1)]);
        assert_eq!(index.entry_count(), 1);
    }

    #[test]
    fn test_delete_unindexes() {
        let mut store = users();
        store.add(json!({"id": 1, "role": "admin"}), None).unwrap();
        assert!(store.delete(&Key::int(1)));
        assert!(!store.delete(&Key::int(1)));
        assert_eq!(store.index("byRole").unwrap().key_count(), 0);
    }

    #[test]
    fn test_auto_increment_injects_key() {
        let mut store = ObjectStore::new(StoreOptions::key_path("id").with_auto_increment());
        let first = store.add(json!({"name": "a"}), None).unwrap();
        let second = store.add(json!({"name": "b"}), None).unwrap();
        assert_eq!(first, Key::int(1));
        assert_eq!(second, Key::int(2));
        assert_eq!(store.get(&Key::int(2)).unwrap()["id"], json!(2));

        // Explicit keys advance the generator
        store.add(json!({"id": 10, "name": "c"}), None).unwrap();
        assert_eq!(store.add(json!({"name": "d"}), None).unwrap(), Key::int(11));
    }

    #[test]
    fn test_exhausted_key_generator() {
        let mut store = ObjectStore::new(StoreOptions::key_path("id").with_auto_increment());
        store.set_next_key(i64::MAX - 1);
        assert_eq!(
            store.add(json!({"name": "last"}), None).unwrap(),
            Key::int(i64::MAX - 1)
        );
        let err = store.add(json!({"name": "over"}), None).unwrap_err();
        assert_eq!(err.name(), "ConstraintError");
        assert_eq!(store.count(), 1);

        // An explicit key at the top of the range exhausts it as well
        let mut store = ObjectStore::new(StoreOptions::default().with_auto_increment());
        store.add(json!("big"), Key::from_json(&json!(1e19))).unwrap();
        let err = store.add(json!("next"), None).unwrap_err();
        assert_eq!(err.name(), "ConstraintError");
    }

    #[test]
    fn test_out_of_line_keys() {
        let mut store = ObjectStore::new(StoreOptions::default());
        assert!(store.add(json!({"a": 1}), None).is_err());
        let key = store.add(json!("plain"), Some(Key::string("k"))).unwrap();
        assert_eq!(store.get(&key), Some(&json!("plain")));
    }

    #[test]
    fn test_unique_index() {
        let mut store = ObjectStore::new(StoreOptions::key_path("id"));
        store
            .create_index("byEmail", "email", IndexOptions::unique())
            .unwrap();
        store.add(json!({"id": 1, "email": "a@x"}), None).unwrap();
        let err = store.add(json!({"id": 2, "email": "a@x"}), None).unwrap_err();
        assert_eq!(err.name(), "ConstraintError");
        // Same record may keep its own key
        store.put(json!({"id": 1, "email": "a@x", "n": 1}), None).unwrap();
    }

    #[test]
    fn test_unindexable_values_skipped() {
        let mut store = ObjectStore::new(StoreOptions::key_path("id"));
        store
            .create_index("byActive", "active", IndexOptions::default())
            .unwrap();
        store.add(json!({"id": 1, "active": true}), None).unwrap();
        assert_eq!(store.index("byActive").unwrap().entry_count(), 0);
    }

    #[test]
    fn test_index_iteration_order() {
        let mut store = users();
        store.add(json!({"id": 3, "role": "admin"}), None).unwrap();
        store.add(json!({"id": 1, "role": "user"}), None).unwrap();
        store.add(json!({"id": 2, "role": "admin"}), None).unwrap();

        let index = store.index("byRole").unwrap();
        let range = KeyRange::all();
        let mut seen = Vec::new();
        let mut position = index.next_after(&range, None);
        while let Some((key, primary)) = position {
            seen.push((key.clone(), primary.clone()));
            position = index.next_after(&range, Some((&key, &primary)));
        }
        assert_eq!(
            seen,
            vec![
                (Key::string("admin"), Key::int(2)),
                (Key::string("admin"), Key::int(3)),
                (Key::string("user"), Key::int(1)),
            ]
        );
    }

    #[test]
    fn test_store_range_iteration() {
        let mut store = users();
        for id in 1..=5 {
            store.add(json!({"id": id}), None).unwrap();
        }
        let range = KeyRange::bound(Key::int(2), Key::int(3)).unwrap();
        let (k1, _) = store.next_after(&range, None).unwrap();
        let (k2, _) = store.next_after(&range, Some(&k1)).unwrap();
        assert_eq!((k1.clone(), k2.clone()), (Key::int(2), Key::int(3)));
        assert!(store.next_after(&range, Some(&k2)).is_none());
    }
}
