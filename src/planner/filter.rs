//! Query filters
//!
//! A filter is an ordered mapping of field → value plus an optional
//! `range`. Field order is the order the caller wrote them in and is
//! significant for post-filtering.
//!
//! `range` accepts three shapes:
//!
//! ```json
//! {"range": [{"start": 1, "end": 2}, {"start": 4, "end": 5}]}
//! {"range": {"start": 1, "end": 2}}
//! {"range": {"index": "byAge", "bounds": [{"start": 18, "end": 30}]}}
//! ```
//!
//! The first two target the primary key. Bounds are inclusive; a bound may
//! omit `start` or `end` to leave that side open.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which key a range is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeTarget {
    PrimaryKey,
    Index(String),
}

/// One inclusive bound, as written by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeBound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Value>,
}

impl RangeBound {
    pub fn between(start: Value, end: Value) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeSpec {
    pub target: RangeTarget,
    pub bounds: Vec<RangeBound>,
}

impl RangeSpec {
    pub fn primary_key(bounds: Vec<RangeBound>) -> Self {
        Self {
            target: RangeTarget::PrimaryKey,
            bounds,
        }
    }

    pub fn index(name: impl Into<String>, bounds: Vec<RangeBound>) -> Self {
        Self {
            target: RangeTarget::Index(name.into()),
            bounds,
        }
    }

    fn from_json(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => Ok(Self::primary_key(parse_bounds(items)?)),
            Value::Object(mut obj) => match obj.remove("index") {
                Some(Value::String(index)) => {
                    let bounds = match obj.remove("bounds") {
                        Some(Value::Array(items)) => parse_bounds(items)?,
                        Some(_) => return Err("range 'bounds' must be an array".into()),
                        None => return Err("index range requires 'bounds'".into()),
                    };
                    Ok(Self::index(index, bounds))
                }
                Some(_) => Err("range 'index' must be a string".into()),
                None => Ok(Self::primary_key(vec![parse_bound(Value::Object(obj))?])),
            },
            _ => Err("range must be an array of bounds or an object".into()),
        }
    }

    fn to_json(&self) -> Value {
        let bounds: Vec<Value> = self
            .bounds
            .iter()
            .map(|b| serde_json::to_value(b).unwrap_or(Value::Null))
            .collect();
        match &self.target {
            RangeTarget::PrimaryKey => Value::Array(bounds),
            RangeTarget::Index(name) => {
                let mut obj = Map::new();
                obj.insert("index".into(), Value::String(name.clone()));
                obj.insert("bounds".into(), Value::Array(bounds));
                Value::Object(obj)
            }
        }
    }
}

fn parse_bounds(items: Vec<Value>) -> Result<Vec<RangeBound>, String> {
    items.into_iter().map(parse_bound).collect()
}

fn parse_bound(item: Value) -> Result<RangeBound, String> {
    let bound: RangeBound =
        serde_json::from_value(item).map_err(|e| format!("invalid range bound: {}", e))?;
    if bound.start.is_none() && bound.end.is_none() {
        return Err("range bound needs 'start' or 'end'".into());
    }
    Ok(bound)
}

/// Ordered field/value pairs plus an optional range
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Filter {
    fields: Vec<(String, Value)>,
    range: Option<RangeSpec>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality pair; a repeated field replaces the earlier value
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn range(mut self, range: RangeSpec) -> Self {
        self.range = Some(range);
        self
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn range_spec(&self) -> Option<&RangeSpec> {
        self.range.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.range.is_none()
    }
}

impl TryFrom<Map<String, Value>> for Filter {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut filter = Filter::new();
        for (name, value) in map {
            if name == "range" {
                filter.range = Some(RangeSpec::from_json(value)?);
            } else {
                filter.fields.push((name, value));
            }
        }
        Ok(filter)
    }
}

impl From<Filter> for Map<String, Value> {
    fn from(filter: Filter) -> Self {
        let mut map: Map<String, Value> = filter.fields.into_iter().collect();
        if let Some(range) = &filter.range {
            map.insert("range".into(), range.to_json());
        }
        map
    }
}
