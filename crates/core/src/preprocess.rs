use std::sync::LazyLock;

use regex::Regex;

/// Tags stripped by default because they hold site chrome rather than product content.
pub const DEFAULT_EXCLUDED_TAGS: &[&str] = &["nav", "footer", "aside"];

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Boilerplate tags removed together with their content
    pub excluded_tags: Vec<String>,
    /// Whether to remove script, style, noscript, iframe, svg, canvas and template tags
    pub remove_non_content: bool,
    /// Whether to remove modals, cookie banners and other overlay elements
    pub remove_overlays: bool,
    /// Whether to remove hidden elements
    pub remove_hidden: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            excluded_tags: DEFAULT_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
            remove_non_content: true,
            remove_overlays: true,
            remove_hidden: true,
        }
    }
}

const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas", "template"];

static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static HIDDEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid regex"));

static FIXED_POSITION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)position\s*:\s*fixed").expect("valid regex"));

static OVERLAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(modal|popup|pop-up|overlay|cookie|consent|gdpr|newsletter|lightbox|backdrop|interstitial)")
        .expect("valid regex")
});

static WHITESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Preprocess HTML by removing boilerplate and normalizing the document
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = remove_comments(html);

    let mut tags: Vec<&str> = config.excluded_tags.iter().map(String::as_str).collect();
    if config.remove_non_content {
        tags.extend_from_slice(NON_CONTENT_TAGS);
    }
    processed = remove_tags(&processed, &tags);

    if config.remove_overlays {
        processed = remove_overlay_elements(&processed);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    normalize_whitespace(processed)
}

/// Whether a string is usable as a bare tag selector
fn is_tag_name(tag: &str) -> bool {
    !tag.is_empty()
        && tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Remove the given tags and everything inside them
fn remove_tags(html: &str, tags: &[&str]) -> String {
    let selector = tags.iter().filter(|t| is_tag_name(t)).copied().collect::<Vec<_>>().join(", ");
    if selector.is_empty() {
        return html.to_string();
    }

    rewrite(html, &selector, |el| {
        el.remove();
        Ok(())
    })
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT_PATTERN.replace_all(html, "").to_string()
}

/// Remove dialogs, fixed-position layers and elements named like overlays
fn remove_overlay_elements(html: &str) -> String {
    rewrite(html, "*", |el| {
        let tag = el.tag_name();
        // <body class="modal-open"> is a state flag, not an overlay
        if matches!(tag.as_str(), "html" | "head" | "body") {
            return Ok(());
        }

        let is_dialog = tag == "dialog"
            || el.get_attribute("role").is_some_and(|r| r.eq_ignore_ascii_case("dialog"))
            || el.get_attribute("aria-modal").is_some_and(|m| m.eq_ignore_ascii_case("true"));
        let is_fixed = el.get_attribute("style").is_some_and(|s| FIXED_POSITION_PATTERN.is_match(&s));
        let named_overlay = el.get_attribute("id").is_some_and(|id| OVERLAY_PATTERN.is_match(&id))
            || el
                .get_attribute("class")
                .is_some_and(|class| class.split_whitespace().any(|c| OVERLAY_PATTERN.is_match(c)));

        if is_dialog || is_fixed || named_overlay {
            el.remove();
        }
        Ok(())
    })
}

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    rewrite(html, "*", |el| {
        if el.get_attribute("hidden").is_some()
            || el.get_attribute("style").is_some_and(|s| HIDDEN_PATTERN.is_match(&s))
        {
            el.remove();
        }
        Ok(())
    })
}

/// Run a single element handler over the document.
///
/// Falls back to the untouched input when lol_html rejects the markup.
fn rewrite<F>(html: &str, selector: &str, mut handler: F) -> String
where
    F: FnMut(&mut lol_html::html_content::Element) -> lol_html::HandlerResult,
{
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!(selector, |el| handler(el))],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    if output.is_empty() && !html.is_empty() { html.to_string() } else { output }
}

/// Normalize whitespace in HTML
fn normalize_whitespace(html: String) -> String {
    WHITESPACE_PATTERN.replace_all(&html, " ").to_string()
}
