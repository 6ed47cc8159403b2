use crate::batch::DocumentBatch;
use index::RetrievedRecord;

const NO_DOCUMENTS: &str = "No documents found for this question's related search";
const SEARCH_FAILED: &str = "Document search failed for this question's related search";
const FENCE_OPEN: &str = "\n\n```\n";
const FENCE_BETWEEN: &str = "\n\n```\n\n```\n";
const FENCE_CLOSE: &str = "\n```";

/// Folds retrieved batches into the context block handed to the answer generator.
pub struct ResultFormatter;

impl ResultFormatter {
    /// One fenced block per batch that was searched successfully, in input
    /// order. A batch with zero hits still gets its (empty) block.
    ///
    /// When nothing was retrieved the result is a fixed message naming the
    /// filters that were tried. Failed calls are never reported as "no
    /// documents": they are listed with their errors after the body.
    pub fn format(batches: &[DocumentBatch]) -> String {
        let (failed, searched): (Vec<&DocumentBatch>, Vec<&DocumentBatch>) =
            batches.iter().partition(|batch| batch.is_failed());

        if searched.is_empty() && !failed.is_empty() {
            return Self::search_failed(&failed);
        }

        let body = if searched.iter().all(|batch| batch.is_empty()) {
            Self::no_documents(&searched)
        } else {
            let blocks: Vec<String> = searched.iter().map(|batch| Self::format_batch(batch)).collect();
            format!("{}{}{}", FENCE_OPEN, blocks.join(FENCE_BETWEEN), FENCE_CLOSE)
        };

        if failed.is_empty() {
            body
        } else {
            format!("{}\n\n{}", body, Self::search_failed(&failed))
        }
    }

    fn format_batch(batch: &DocumentBatch) -> String {
        batch.records
            .iter()
            .map(Self::format_record)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_record(record: &RetrievedRecord) -> String {
        record.fields()
            .iter()
            .map(|(field, value)| format!("{}: {}", field, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn no_documents(batches: &[&DocumentBatch]) -> String {
        let attempted: Vec<&str> = batches
            .iter()
            .filter_map(|batch| batch.filter.as_ref().map(|f| f.as_str()))
            .collect();

        if attempted.is_empty() {
            format!("{}: None", NO_DOCUMENTS)
        } else {
            format!("{}: [{}]", NO_DOCUMENTS, attempted.join(", "))
        }
    }

    fn search_failed(batches: &[&DocumentBatch]) -> String {
        let failures: Vec<String> = batches
            .iter()
            .map(|batch| {
                let filter = batch.filter.as_ref().map_or("None", |f| f.as_str());
                let error = batch.error.as_deref().unwrap_or_default();
                format!("{} ({})", filter, error)
            })
            .collect();

        format!("{}: [{}]", SEARCH_FAILED, failures.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterBuilder, FilterExpression};
    use extract::ExtractedEntities;
    use serde_json::json;

    fn filters(subjects: &[&str]) -> Vec<FilterExpression> {
        let entities = ExtractedEntities {
            subjects: Some(subjects.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        };
        FilterBuilder::default().build(&entities).unwrap()
    }

    fn record(id: &str, text: &str, company: &str) -> RetrievedRecord {
        RetrievedRecord {
            id: Some(id.to_string()),
            text: Some(text.to_string()),
            external_source_name: Some(format!("{}_10K.pdf", company)),
            description: Some(company.to_string()),
            additional_metadata: json!("2022"),
            score: Some(0.5),
        }
    }

    #[test]
    fn test_single_batch_layout() {
        let msft = filters(&["msft"]).into_iter().next();
        let batch = DocumentBatch::new(
            msft,
            vec![record("1", "Revenue", "MSFT"), record("2", "Margin", "MSFT")],
        );

        let expected = "\n\n```\n\
            Id: 1\nText: Revenue\nExternalSourceName: MSFT_10K.pdf\nDescription: MSFT\nAdditionalMetadata: 2022\n\n\
            Id: 2\nText: Margin\nExternalSourceName: MSFT_10K.pdf\nDescription: MSFT\nAdditionalMetadata: 2022\
            \n```";
        assert_eq!(ResultFormatter::format(&[batch]), expected);
    }

    #[test]
    fn test_two_batches_in_input_order() {
        let mut f = filters(&["microsoft", "pfizer"]).into_iter();
        let batches = vec![
            DocumentBatch::new(f.next(), vec![record("m1", "a", "MICROSOFT"), record("m2", "b", "MICROSOFT")]),
            DocumentBatch::new(f.next(), vec![record("p1", "c", "PFIZER"), record("p2", "d", "PFIZER")]),
        ];

        let output = ResultFormatter::format(&batches);

        assert!(output.starts_with("\n\n```\nId: m1\n"));
        assert!(output.ends_with("AdditionalMetadata: 2022\n```"));
        assert_eq!(output.matches("\n\n```\n\n```\n").count(), 1);
        let microsoft = output.find("Id: m2").unwrap();
        let separator = output.find("```\n\n```").unwrap();
        let pfizer = output.find("Id: p1").unwrap();
        assert!(microsoft < separator && separator < pfizer);
        assert!(output.contains("Description: PFIZER"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            ResultFormatter::format(&[]),
            "No documents found for this question's related search: None"
        );
    }

    #[test]
    fn test_all_batches_empty_lists_filters() {
        let batches: Vec<_> = filters(&["aapl", "msft"])
            .into_iter()
            .map(|f| DocumentBatch::new(Some(f), Vec::new()))
            .collect();

        assert_eq!(
            ResultFormatter::format(&batches),
            "No documents found for this question's related search: \
             [referenced_entity eq 'AAPL', referenced_entity eq 'MSFT']"
        );
    }

    #[test]
    fn test_unfiltered_empty_batch() {
        let batches = vec![DocumentBatch::new(None, Vec::new())];
        assert!(ResultFormatter::format(&batches).ends_with(": None"));
    }

    #[test]
    fn test_failed_batch_is_reported_after_blocks() {
        let mut f = filters(&["aapl", "msft"]).into_iter();
        let batches = vec![
            DocumentBatch::failed(f.next(), "timed out".to_string()),
            DocumentBatch::new(f.next(), vec![record("1", "Services revenue", "MSFT")]),
        ];

        let output = ResultFormatter::format(&batches);
        assert!(output.starts_with("\n\n```\nId: 1\nText: Services revenue\n"));
        assert_eq!(output.matches("```\n\n```").count(), 0);
        assert!(output.ends_with(
            "\n```\n\nDocument search failed for this question's related search: \
             [referenced_entity eq 'AAPL' (timed out)]"
        ));
    }

    #[test]
    fn test_zero_hit_batch_keeps_its_block() {
        let mut f = filters(&["a", "b", "c"]).into_iter();
        let batches = vec![
            DocumentBatch::new(f.next(), vec![record("a1", "x", "A")]),
            DocumentBatch::new(f.next(), Vec::new()),
            DocumentBatch::new(f.next(), vec![record("c1", "y", "C")]),
        ];

        let output = ResultFormatter::format(&batches);

        assert_eq!(output.matches("```\n\n```").count(), 2);
        assert!(output.contains("AdditionalMetadata: 2022\n\n```\n\n```\n\n\n```\n\n```\nId: c1\n"));
        assert!(output.starts_with("\n\n```\nId: a1\n"));
        assert!(output.ends_with("AdditionalMetadata: 2022\n```"));
    }

    #[test]
    fn test_all_failed_is_not_reported_as_no_documents() {
        let mut f = filters(&["a", "b"]).into_iter();
        let batches = vec![
            DocumentBatch::failed(f.next(), "503".to_string()),
            DocumentBatch::failed(f.next(), "timed out".to_string()),
        ];

        let output = ResultFormatter::format(&batches);

        assert!(!output.contains("No documents found"));
        assert_eq!(
            output,
            "Document search failed for this question's related search: \
             [referenced_entity eq 'A' (503), referenced_entity eq 'B' (timed out)]"
        );
    }

    #[test]
    fn test_empty_and_failed_are_reported_separately() {
        let mut f = filters(&["a", "b"]).into_iter();
        let batches = vec![
            DocumentBatch::new(f.next(), Vec::new()),
            DocumentBatch::failed(f.next(), "503".to_string()),
        ];

        assert_eq!(
            ResultFormatter::format(&batches),
            "No documents found for this question's related search: [referenced_entity eq 'A']\n\n\
             Document search failed for this question's related search: [referenced_entity eq 'B' (503)]"
        );
    }

    #[test]
    fn test_missing_values_render_empty() {
        let batch = DocumentBatch::new(None, vec![RetrievedRecord {
            id: Some("9".to_string()),
            ..Default::default()
        }]);

        let output = ResultFormatter::format(&[batch]);
        assert!(output.contains("Text: \n"));
        assert!(output.contains("AdditionalMetadata: \n```"));
    }
}
