pub fn build_entity_prompt(question: &str) -> String {
    format!(
        r#"Extract the entities referenced by the following question about public company financial filings.

INSTRUCTIONS:
1. Identify every company the question refers to, by name or ticker
2. Identify the country or region the question refers to, as an ISO country code
3. Identify any dates or fiscal years the question refers to, as ISO dates (YYYY-MM-DD)
4. Output ONLY valid JSON, nothing else
5. Use the exact schema below

SCHEMA:
{{
  "subjects": ["CompanyOrTicker"],
  "location": ["US"],
  "dates": ["2022-01-01"]
}}

RULES:
- Use null for any field the question does not mention
- List companies in the order they appear in the question
- A fiscal year such as FY2020 becomes "2020-01-01"
- Output ONLY the JSON object, no markdown, no explanations

QUESTION:
{}

JSON OUTPUT:"#,
        question
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
