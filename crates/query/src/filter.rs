use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::FilterFields;
use extract::{EntityError, ExtractedEntities};

/// A boolean metadata predicate: `field eq 'value'` clauses joined by `and`.
///
/// Never empty; the builder drops a subject instead of emitting a clause-less filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterExpression(String);

impl FilterExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One filter per subject, in subject order.
pub type FilterSet = Vec<FilterExpression>;

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    fields: FilterFields,
}

impl FilterBuilder {
    pub fn new(fields: FilterFields) -> Self {
        Self { fields }
    }

    /// Build one filter per subject.
    ///
    /// Location and year are resolved once and shared by every subject.
    /// `None` means there is nothing to filter on.
    pub fn build(&self, entities: &ExtractedEntities) -> Option<FilterSet> {
        let location = entities.first_location();
        let year = entities.year();

        let subjects: Vec<Option<String>> = if entities.subjects().is_empty() {
            vec![None]
        } else {
            entities.subjects()
                .iter()
                .map(|subject| Some(subject.trim().to_uppercase()).filter(|s| !s.is_empty()))
                .collect()
        };

        let filters: FilterSet = subjects
            .iter()
            .filter_map(|subject| self.build_one(subject.as_deref(), location, year))
            .collect();

        if filters.is_empty() {
            None
        } else {
            Some(filters)
        }
    }

    /// Validate a raw JSON value, then build.
    pub fn build_from_value(&self, value: &Value) -> Result<Option<FilterSet>, EntityError> {
        let entities = ExtractedEntities::from_value(value)?;
        Ok(self.build(&entities))
    }

    fn build_one(
        &self,
        subject: Option<&str>,
        location: Option<&str>,
        year: Option<&str>,
    ) -> Option<FilterExpression> {
        let clauses: Vec<String> = [
            (self.fields.entity.as_str(), subject),
            (self.fields.location.as_str(), location),
            (self.fields.year.as_str(), year),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| clause(field, v)))
        .collect();

        if clauses.is_empty() {
            return None;
        }

        Some(FilterExpression(clauses.join(" and ")))
    }
}

// OData string literals escape a quote by doubling it
fn clause(field: &str, value: &str) -> String {
    format!("{} eq '{}'", field, value.replace('\'', "''"))
}
