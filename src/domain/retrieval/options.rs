use serde::{Deserialize, Serialize};

/// Per-request switches, fixed for the lifetime of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default = "default_allow_web_search")]
    pub allow_web_search: bool,
    /// Split the question into sub-questions answered in parallel
    #[serde(default)]
    pub sub_query: bool,
}

fn default_allow_web_search() -> bool {
    true
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            allow_web_search: default_allow_web_search(),
            sub_query: false,
        }
    }
}

impl QueryOptions {
    pub fn with_web_search(mut self, allow: bool) -> Self {
        self.allow_web_search = allow;
        self
    }

    pub fn with_sub_query(mut self, enabled: bool) -> Self {
        self.sub_query = enabled;
        self
    }
}
