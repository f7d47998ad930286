//! Executor options

use crate::planner::KeyPolicy;

use super::filters::PostFilterMode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Field names resolved as the primary key, in priority order
    pub key_policy: KeyPolicy,
    pub post_filter: PostFilterMode,
}

impl QueryOptions {
    pub fn with_key_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.key_policy = KeyPolicy::new(names);
        self
    }

    pub fn with_post_filter(mut self, mode: PostFilterMode) -> Self {
        self.post_filter = mode;
        self
    }
}
