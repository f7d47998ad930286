//! Explain output
//!
//! Deterministic, human-readable description of an access plan, also
//! serializable for the CLI.

use std::fmt;
use std::ops::Bound;

use serde::Serialize;

use crate::engine::{Key, KeyRange};

use super::errors::PlannerError;
use super::filter::RangeTarget;
use super::planner::{AccessPath, AccessPlan};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExplainPlan {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_path: Option<String>,
    /// Index used by the path, `PRIMARY` for primary-key paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_filter: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_filter_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

fn describe_key(key: &Key) -> String {
    key.to_json().to_string()
}

fn describe_range(range: &KeyRange) -> String {
    let lower = match &range.lower {
        Bound::Included(k) => format!("[{}", describe_key(k)),
        Bound::Excluded(k) => format!("({}", describe_key(k)),
        Bound::Unbounded => "(-inf".to_string(),
    };
    let upper = match &range.upper {
        Bound::Included(k) => format!("{}]", describe_key(k)),
        Bound::Excluded(k) => format!("{})", describe_key(k)),
        Bound::Unbounded => "+inf)".to_string(),
    };
    format!("{}, {}", lower, upper)
}

impl ExplainPlan {
    pub fn from_plan(plan: &AccessPlan) -> Self {
        let (index, ranges) = match &plan.path {
            AccessPath::PrimaryKey(key) => (
                Some("PRIMARY".to_string()),
                vec![describe_range(&KeyRange::only(key.clone()))],
            ),
            AccessPath::IndexPoint { index, key, .. } => (
                Some(index.clone()),
                vec![describe_range(&KeyRange::only(key.clone()))],
            ),
            AccessPath::IndexRange { target, ranges } => (
                Some(match target {
                    RangeTarget::PrimaryKey => "PRIMARY".to_string(),
                    RangeTarget::Index(name) => name.clone(),
                }),
                ranges.iter().map(describe_range).collect(),
            ),
            AccessPath::FullScan => (None, Vec::new()),
        };

        Self {
            accepted: true,
            collection: Some(plan.collection.clone()),
            access_path: Some(plan.path.as_str().to_string()),
            index,
            ranges,
            post_filter: plan
                .post_filter
                .iter()
                .map(|(field, value)| format!("{} = {}", field, value))
                .collect(),
            post_filter_mode: None,
            limit: plan.limit,
            rejection_code: None,
            rejection_reason: None,
        }
    }

    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            collection: None,
            access_path: None,
            index: None,
            ranges: Vec::new(),
            post_filter: Vec::new(),
            post_filter_mode: None,
            limit: None,
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
        }
    }

    /// Records the post-filter mode; ignored when nothing is post-filtered
    pub fn with_post_filter_mode(mut self, mode: &str) -> Self {
        if !self.post_filter.is_empty() {
            self.post_filter_mode = Some(mode.to_string());
        }
        self
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(collection) = &self.collection {
                writeln!(f, "Collection: {}", collection)?;
            }
            if let Some(path) = &self.access_path {
                writeln!(f, "Access Path: {}", path)?;
            }
            if let Some(index) = &self.index {
                writeln!(f, "Index: {}", index)?;
            }
            if !self.ranges.is_empty() {
                writeln!(f, "Ranges:")?;
                for range in &self.ranges {
                    writeln!(f, "  - {}", range)?;
                }
            }
            if !self.post_filter.is_empty() {
                match &self.post_filter_mode {
                    Some(mode) => writeln!(f, "Post Filter ({}):", mode)?,
                    None => writeln!(f, "Post Filter:")?,
                }
                for pair in &self.post_filter {
                    writeln!(f, "  - {}", pair)?;
                }
            }
            match self.limit {
                Some(limit) => writeln!(f, "Limit: {}", limit)?,
                None => writeln!(f, "Limit: none")?,
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
