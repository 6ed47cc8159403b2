use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys the extractor may use for the named subjects, in priority order.
const SUBJECT_KEYS: [&str; 3] = ["subjects", "company_name", "ticker"];
const LOCATION_KEYS: [&str; 2] = ["location", "country"];
const DATE_KEYS: [&str; 1] = ["dates"];

#[derive(Debug, Error)]
pub enum EntityError {
    /// The extracted entities were valid JSON but not an object.
    #[error("extracted entities must be a JSON object, found {found}")]
    NotAMapping { found: &'static str },

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("extractor output is not valid JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}

/// Entities pulled out of a user question.
///
/// Every field is independently optional. Only the first `location` and the
/// year of the first `dates` entry take part in filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<String>>,
}

impl ExtractedEntities {
    /// Validate a JSON value against the entity schema.
    pub fn from_value(value: &Value) -> Result<Self, EntityError> {
        let object = value.as_object().ok_or(EntityError::NotAMapping {
            found: json_kind(value),
        })?;

        Ok(Self {
            subjects: read_list(object, &SUBJECT_KEYS)?,
            location: read_list(object, &LOCATION_KEYS)?,
            dates: read_list(object, &DATE_KEYS)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        let empty = |field: &Option<Vec<String>>| field.as_ref().is_none_or(|v| v.is_empty());
        empty(&self.subjects) && empty(&self.location) && empty(&self.dates)
    }

    /// Subjects in extraction order, or an empty slice.
    pub fn subjects(&self) -> &[String] {
        self.subjects.as_deref().unwrap_or_default()
    }

    /// First location, if any. Blank strings count as absent.
    pub fn first_location(&self) -> Option<&str> {
        first_non_blank(&self.location)
    }

    /// Year prefix (first four characters) of the first date.
    pub fn year(&self) -> Option<&str> {
        let date = first_non_blank(&self.dates)?;
        let end = date
            .char_indices()
            .nth(4)
            .map(|(idx, _)| idx)
            .unwrap_or(date.len());
        Some(&date[..end])
    }
}

/// Parse raw extractor output into validated entities.
///
/// LLMs like to wrap JSON in markdown fences or a sentence of prose, so both are
/// stripped before parsing. Anything that still isn't JSON is a `Parse` error.
pub fn parse_entities(raw: &str) -> Result<ExtractedEntities, EntityError> {
    let candidate = strip_code_fence(raw.trim());

    let value = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(source) => match embedded_object(raw)
            .and_then(|inner| serde_json::from_str::<Value>(inner).ok())
        {
            Some(value) => value,
            None => {
                return Err(EntityError::Parse {
                    source,
                    raw: raw.to_string(),
                });
            }
        },
    };

    ExtractedEntities::from_value(&value)
}

fn read_list(
    object: &Map<String, Value>,
    keys: &[&str],
) -> Result<Option<Vec<String>>, EntityError> {
    for key in keys {
        match object.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(single)) => return Ok(Some(vec![single.clone()])),
            Some(Value::Array(items)) => {
                let values = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid_field(key))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Some(values));
            }
            Some(_) => return Err(invalid_field(key)),
        }
    }

    Ok(None)
}

fn invalid_field(key: &str) -> EntityError {
    EntityError::InvalidField {
        field: key.to_string(),
        expected: "a string or a list of strings",
    }
}

fn first_non_blank(field: &Option<Vec<String>>) -> Option<&str> {
    field
        .as_ref()?
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json) on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_primary_keys() {
        let entities = ExtractedEntities::from_value(&json!({
            "subjects": ["microsoft", "pfizer"],
            "location": ["US"],
            "dates": ["2022-01-01"]
        }))
        .unwrap();

        assert_eq!(entities.subjects(), ["microsoft", "pfizer"]);
        assert_eq!(entities.first_location(), Some("US"));
        assert_eq!(entities.year(), Some("2022"));
    }

    #[test]
    fn test_accepts_legacy_keys() {
        let entities = ExtractedEntities::from_value(&json!({
            "company_name": ["BestBuy"],
            "country": ["US", "IE"]
        }))
        .unwrap();
        assert_eq!(entities.subjects(), ["BestBuy"]);
        assert_eq!(entities.first_location(), Some("US"));

        let entities = ExtractedEntities::from_value(&json!({"ticker": ["AAPL"]})).unwrap();
        assert_eq!(entities.subjects(), ["AAPL"]);
    }

    #[test]
    fn test_null_and_empty_fields_are_absent() {
        let entities = ExtractedEntities::from_value(&json!({
            "ticker": [],
            "location": null,
            "dates": []
        }))
        .unwrap();

        assert!(entities.is_empty());
        assert_eq!(entities.first_location(), None);
        assert_eq!(entities.year(), None);
    }

    #[test]
    fn test_single_string_is_one_element_list() {
        let entities = ExtractedEntities::from_value(&json!({"subjects": "3M"})).unwrap();
        assert_eq!(entities.subjects(), ["3M"]);
    }

    #[test]
    fn test_short_date_used_whole() {
        let entities = ExtractedEntities::from_value(&json!({"dates": ["99"]})).unwrap();
        assert_eq!(entities.year(), Some("99"));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = ExtractedEntities::from_value(&json!("not a mapping")).unwrap_err();
        assert!(matches!(err, EntityError::NotAMapping { found: "a string" }));

        let err = ExtractedEntities::from_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, EntityError::NotAMapping { .. }));
    }

    #[test]
    fn test_rejects_malformed_field() {
        let err = ExtractedEntities::from_value(&json!({"dates": 2021})).unwrap_err();
        match err {
            EntityError::InvalidField { field, .. } => assert_eq!(field, "dates"),
            other => panic!("unexpected error: {other}"),
        }

        let err = ExtractedEntities::from_value(&json!({"subjects": ["AAPL", 7]})).unwrap_err();
        assert!(matches!(err, EntityError::InvalidField { .. }));
    }

    #[test]
    fn test_parse_plain_json() {
        let entities = parse_entities(r#"{"subjects": ["microsoft"]}"#).unwrap();
        assert_eq!(entities.subjects(), ["microsoft"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"ticker\": [\"AAPL\"], \"dates\": [\"2021-01-01\"]}\n```";
        let entities = parse_entities(raw).unwrap();
        assert_eq!(entities.subjects(), ["AAPL"]);
        assert_eq!(entities.year(), Some("2021"));
    }

    #[test]
    fn test_parse_single_line_fence() {
        let raw = "```{\"subjects\": [\"x\"]}```";
        let entities = parse_entities(raw).unwrap();
        assert_eq!(entities.subjects(), ["x"]);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Sure! Here are the entities: {\"location\": [\"USA\"]} Hope that helps.";
        let entities = parse_entities(raw).unwrap();
        assert_eq!(entities.first_location(), Some("USA"));
    }

    #[test]
    fn test_parse_error_keeps_raw_output() {
        let err = parse_entities("I could not find any companies.").unwrap_err();
        match err {
            EntityError::Parse { raw, .. } => assert_eq!(raw, "I could not find any companies."),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_non_object_json_is_shape_error() {
        let err = parse_entities(r#""just a string""#).unwrap_err();
        assert!(matches!(err, EntityError::NotAMapping { .. }));
    }
}
