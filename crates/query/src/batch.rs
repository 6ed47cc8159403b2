use serde::{Deserialize, Serialize};

use crate::filter::FilterExpression;
use index::RetrievedRecord;

/// Records retrieved for one filter, or for the unfiltered call when `filter` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBatch {
    pub filter: Option<FilterExpression>,
    pub records: Vec<RetrievedRecord>,
    /// Set when the search call behind this batch failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentBatch {
    pub fn new(filter: Option<FilterExpression>, records: Vec<RetrievedRecord>) -> Self {
        Self {
            filter,
            records,
            error: None,
        }
    }

    pub fn failed(filter: Option<FilterExpression>, error: String) -> Self {
        Self {
            filter,
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
