use std::sync::LazyLock;

use regex::Regex;

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
pub fn html_to_markdown(html: &str) -> String {
    tidy(&htmd::convert(html).unwrap_or_default())
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
pub fn html_to_markdown(html: &str) -> String {
    let doc = scraper::Html::parse_fragment(html);
    tidy(&doc.root_element().text().collect::<String>())
}

/// Trim trailing spaces and collapse runs of blank lines
fn tidy(markdown: &str) -> String {
    let trimmed_lines = markdown.lines().map(str::trim_end).collect::<Vec<_>>().join("\n");
    BLANK_RUNS.replace_all(&trimmed_lines, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_markdown_basic() {
        let markdown = html_to_markdown(r#"<h1>Acme Kettle</h1><p>Boils water fast.</p>"#);
        assert!(markdown.contains("Acme Kettle"));
        assert!(markdown.contains("Boils water fast."));
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_headings_and_lists() {
        let markdown = html_to_markdown(r#"<h1>Acme Kettle</h1><ul><li>Fast</li><li>Quiet</li></ul>"#);
        assert!(markdown.contains("# Acme Kettle"));
        assert!(markdown.contains("Fast"));
        assert!(markdown.contains("Quiet"));
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_tables() {
        let html = r#"
            <table>
                <thead><tr><th>Stars</th><th>Share</th></tr></thead>
                <tbody><tr><td>5</td><td>71%</td></tr></tbody>
            </table>
        "#;
        let markdown = html_to_markdown(html);
        assert!(markdown.contains("|"));
        assert!(markdown.contains("71%"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_markdown(""), "");
    }

    #[test]
    fn test_tidy_collapses_blank_lines() {
        assert_eq!(tidy("a   \n\n\n\nb\n"), "a\n\nb");
    }
}
