//! Instructions sent to the language model.

/// Asks the model to turn arbitrary text into the report schema.
///
/// The validator appends `"\n\nContent to format:\n"` and the text to repair.
pub const REFORMAT_PROMPT: &str = r#"Format the content as JSON with this exact structure:
{
    "report": {
        "extraction": [{
            "fields": {
                "Ratings": "<value>",
                "Rated": "<value>",
                "Price": "<value>",
                "ReviewSummary": "<value>",
                "url": "<value>",
                "title": "<value>"
            }
        }]
    }
}"#;

/// Builds the extraction instruction for one page.
///
/// The url and title are embedded literally in the response shape so the
/// model copies them instead of guessing.
pub fn build_extraction_prompt(url: &str, title: &str, markdown: &str) -> String {
    let url = escape_json_str(url);
    let title_json = escape_json_str(title);

    format!(
        "Extract the following information from the provided markdown content and provide it as a JSON report: \n\
         - Number of Ratings (This is how many members rated the product, example: 47 reviews. \
         Ratings is a big number, it can be greater than 5 but rated cannot be greater than 5)\n\
         - Rating Score (It is the average score that all reviewers rated, it will be from 1 to 5, example: 4.86 rated)\n\
         - Price of the product\n\
         - Give what customers sentiment of the product. Review summary mentioning what is best and worst in the product in 2 lines\n\
         - Title: {title}\n\
         Response format: {{\"report\": {{\"extraction\": [{{\"fields\": {{\"Ratings\": \"<value>\", \"Rated\": \"<value>\", \
         \"Price\": \"<value>\", \"ReviewSummary\": \"<value>\", \"url\": \"{url}\", \"title\": \"{title_json}\"}}}}]}}}}\n\
         Markdown Output: {markdown}"
    )
}

/// Escapes a value for use inside a JSON string literal.
fn escape_json_str(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
