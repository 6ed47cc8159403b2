use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One hit from the search index.
///
/// Field names mirror the index schema, so the same strings serve as the
/// search projection (`select`) and as labels when the record is rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRecord {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
    #[serde(rename = "Text", default)]
    pub text: Option<String>,
    #[serde(rename = "ExternalSourceName", default)]
    pub external_source_name: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "AdditionalMetadata", default)]
    pub additional_metadata: Value,
    #[serde(rename = "@search.score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl RetrievedRecord {
    /// Index fields in declared order.
    pub const FIELDS: [&'static str; 5] = [
        "Id",
        "Text",
        "ExternalSourceName",
        "Description",
        "AdditionalMetadata",
    ];

    /// `(field, value)` pairs in [`Self::FIELDS`] order.
    ///
    /// Missing values render as an empty string, non-string metadata as compact JSON.
    pub fn fields(&self) -> [(&'static str, String); 5] {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let metadata = match &self.additional_metadata {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        [
            (Self::FIELDS[0], text(&self.id)),
            (Self::FIELDS[1], text(&self.text)),
            (Self::FIELDS[2], text(&self.external_source_name)),
            (Self::FIELDS[3], text(&self.description)),
            (Self::FIELDS[4], metadata),
        ]
    }
}
