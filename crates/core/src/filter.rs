//! Reduces a rendered page to relevance-pruned markdown.
//!
//! Filtering runs in three passes:
//!
//! 1. [`preprocess_html`] drops excluded tags, scripts, overlays and hidden nodes.
//! 2. Every block under `<body>` is scored with [`score_block`]. A block below
//!    the threshold is removed along with its subtree, unless some block
//!    nested inside it still passes. Wrappers of that kind are kept so the
//!    relevant descendants can be judged on their own.
//! 3. The surviving tree is converted to markdown.
//!
//! # Example
//!
//! ```rust
//! use reviewlens_core::ContentFilter;
//!
//! let html = r#"<html><body>
//!     <nav><a href="/">Home</a></nav>
//!     <p>Rated 4.7 out of 5 by 1,204 customers who love how quickly it boils.</p>
//! </body></html>"#;
//!
//! let markdown = ContentFilter::default().filter(html);
//! assert!(markdown.contains("Rated 4.7"));
//! assert!(!markdown.contains("Home"));
//! ```

use tracing::trace;

use crate::markdown::html_to_markdown;
use crate::parse::{Child, Document, Element};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::scoring::{ScoreConfig, is_block, score_block};

/// Elements dropped outright; none of them carry text the model can use.
const DROPPED_TAGS: &[&str] = &[
    "img", "picture", "video", "audio", "source", "track", "object", "embed", "map", "input", "button", "select",
    "option", "textarea", "label", "link", "meta",
];

/// Configuration for content filtering.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Boilerplate removal settings
    pub preprocess: PreprocessConfig,
    /// Block relevance scoring settings, including the pruning threshold
    pub scoring: ScoreConfig,
    /// Blocks with fewer words are pruned regardless of score (0 disables)
    pub min_block_words: usize,
    /// Render links as their text only
    pub ignore_links: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            scoring: ScoreConfig::default(),
            min_block_words: 0,
            ignore_links: true,
        }
    }
}

impl FilterConfig {
    /// Creates a new builder for FilterConfig.
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::new()
    }
}

/// Builder for FilterConfig.
///
/// # Example
///
/// ```rust
/// use reviewlens_core::FilterConfig;
///
/// let config = FilterConfig::builder()
///     .threshold(0.5)
///     .excluded_tags(["nav", "footer", "aside", "header"])
///     .build();
/// assert_eq!(config.scoring.threshold, 0.5);
/// ```
pub struct FilterConfigBuilder {
    config: FilterConfig,
}

impl FilterConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: FilterConfig::default() }
    }

    /// Sets the pruning threshold.
    pub fn threshold(mut self, value: f64) -> Self {
        self.config.scoring.threshold = value;
        self
    }

    /// Replaces the list of boilerplate tags.
    pub fn excluded_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.preprocess.excluded_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether overlay elements are removed.
    pub fn remove_overlays(mut self, value: bool) -> Self {
        self.config.preprocess.remove_overlays = value;
        self
    }

    /// Sets the minimum number of words a block needs to survive.
    pub fn min_block_words(mut self, value: usize) -> Self {
        self.config.min_block_words = value;
        self
    }

    /// Sets whether links are rendered as plain text.
    pub fn ignore_links(mut self, value: bool) -> Self {
        self.config.ignore_links = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> FilterConfig {
        self.config
    }
}

impl Default for FilterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Markdown plus pruning counters for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub markdown: String,
    pub kept_blocks: usize,
    pub pruned_blocks: usize,
}

/// Deterministic boilerplate stripper and relevance pruner.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    config: FilterConfig,
}

impl ContentFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filters a page down to markdown.
    ///
    /// Returns an empty string when nothing survives.
    pub fn filter(&self, html: &str) -> String {
        self.filter_with_stats(html).markdown
    }

    /// Filters a page and reports how many blocks were kept and pruned.
    pub fn filter_with_stats(&self, html: &str) -> FilterOutcome {
        if html.trim().is_empty() {
            return FilterOutcome::default();
        }

        let cleaned = preprocess_html(html, &self.config.preprocess);
        let doc = Document::parse(&cleaned);
        let Some(body) = doc.body() else {
            return FilterOutcome::default();
        };

        let mut outcome = FilterOutcome::default();
        let mut kept_html = String::with_capacity(cleaned.len());
        self.render_children(&body, &mut kept_html, &mut outcome);
        outcome.markdown = html_to_markdown(&kept_html);

        outcome
    }

    fn render_children(&self, element: &Element<'_>, out: &mut String, outcome: &mut FilterOutcome) {
        for child in element.children() {
            match child {
                Child::Text(text) => out.push_str(&escape_text(text)),
                Child::Element(el) => self.render_element(&el, out, outcome),
            }
        }
    }

    fn render_element(&self, el: &Element<'_>, out: &mut String, outcome: &mut FilterOutcome) {
        let tag = el.tag_name();

        if DROPPED_TAGS.contains(&tag.as_str()) {
            return;
        }

        if matches!(tag.as_str(), "br" | "hr") {
            out.push_str(&format!("<{}>", tag));
            return;
        }

        if is_block(&tag) {
            if !self.keeps(el) {
                outcome.pruned_blocks += 1;
                return;
            }
            outcome.kept_blocks += 1;
        }

        if tag == "a" {
            match el.attr("href").filter(|_| !self.config.ignore_links) {
                Some(href) => {
                    out.push_str(&format!("<a href=\"{}\">", escape_attr(href)));
                    self.render_children(el, out, outcome);
                    out.push_str("</a>");
                }
                None => self.render_children(el, out, outcome),
            }
            return;
        }

        out.push_str(&format!("<{}>", tag));
        self.render_children(el, out, outcome);
        out.push_str(&format!("</{}>", tag));
    }

    fn keeps(&self, el: &Element<'_>) -> bool {
        self.passes(el) || self.holds_relevant_block(el)
    }

    fn passes(&self, el: &Element<'_>) -> bool {
        if self.config.min_block_words > 0 && el.text().split_whitespace().count() < self.config.min_block_words {
            return false;
        }

        let result = score_block(el, &self.config.scoring);
        trace!(tag = %result.tag_name, score = result.score, "scored block");
        result.score >= self.config.scoring.threshold
    }

    /// Whether any block below `el` survives pruning on its own merits.
    fn holds_relevant_block(&self, el: &Element<'_>) -> bool {
        el.children().any(|child| match child {
            Child::Text(_) => false,
            Child::Element(inner) => {
                let tag = inner.tag_name();
                if DROPPED_TAGS.contains(&tag.as_str()) {
                    false
                } else if is_block(&tag) {
                    self.keeps(&inner)
                } else {
                    self.holds_relevant_block(&inner)
                }
            }
        })
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_HTML: &str = r##"
        <html>
        <head><title>Acme Kettle</title><script>var tracking = 1;</script></head>
        <body>
            <nav><a href="/">Home</a><a href="/shop">Shop</a></nav>
            <div id="cookie-consent">We use cookies to improve your experience.</div>
            <div class="product-details">
                <h1>Acme Stainless Kettle</h1>
                <p>Rated 4.6 out of 5 stars based on 1,284 ratings from verified buyers of this kettle.</p>
                <p>Price: $49.99, with free delivery on orders over thirty dollars in the continental US.</p>
                <p>Customers praise how quickly it boils a full litre, although several mention the lid feels flimsy.</p>
            </div>
            <div class="sidebar"><a href="/a">Toaster</a><a href="/b">Blender</a><a href="/c">Mixer</a></div>
            <footer>Copyright 2024 Acme Corp. All rights reserved.</footer>
        </body>
        </html>
    "##;

    #[test]
    fn test_filter_keeps_product_content() {
        let markdown = ContentFilter::default().filter(PRODUCT_HTML);

        assert!(markdown.contains("Acme Stainless Kettle"));
        assert!(markdown.contains("Rated 4.6 out of 5"));
        assert!(markdown.contains("$49.99"));
        assert!(markdown.contains("lid feels flimsy"));
    }

    #[test]
    fn test_filter_drops_boilerplate() {
        let markdown = ContentFilter::default().filter(PRODUCT_HTML);

        assert!(!markdown.contains("Home"));
        assert!(!markdown.contains("cookies"));
        assert!(!markdown.contains("Toaster"));
        assert!(!markdown.contains("Copyright"));
        assert!(!markdown.contains("tracking"));
    }

    #[test]
    fn test_filter_reports_pruned_blocks() {
        let outcome = ContentFilter::default().filter_with_stats(PRODUCT_HTML);

        assert!(outcome.kept_blocks >= 4);
        assert!(outcome.pruned_blocks >= 1);
    }

    #[test]
    fn test_filter_empty_input() {
        assert_eq!(ContentFilter::default().filter(""), "");
        assert_eq!(ContentFilter::default().filter("   \n "), "");
    }

    #[test]
    fn test_filter_no_extractable_content() {
        let html = r#"<html><body><nav><a href="/">Home</a></nav><script>x()</script><div></div></body></html>"#;
        assert_eq!(ContentFilter::default().filter(html), "");
    }

    #[test]
    fn test_filter_is_deterministic() {
        let filter = ContentFilter::default();
        assert_eq!(filter.filter(PRODUCT_HTML), filter.filter(PRODUCT_HTML));
    }

    #[test]
    fn test_links_render_as_text() {
        let html = r#"<body><p>Read all <a href="/reviews">1,284 reviews</a> from buyers of this kettle today.</p></body>"#;
        let markdown = ContentFilter::default().filter(html);

        assert!(markdown.contains("1,284 reviews"));
        assert!(!markdown.contains("/reviews"));
    }

    #[test]
    fn test_links_kept_when_requested() {
        let html = r#"<body><p>Read all <a href="/reviews">1,284 reviews</a> from buyers of this kettle today.</p></body>"#;
        let filter = ContentFilter::new(FilterConfig::builder().ignore_links(false).build());

        assert!(filter.filter(html).contains("(/reviews)"));
    }

    #[test]
    fn test_threshold_above_one_prunes_everything() {
        let filter = ContentFilter::new(FilterConfig::builder().threshold(1.1).build());
        assert_eq!(filter.filter(PRODUCT_HTML), "");
    }

    #[test]
    fn test_min_block_words() {
        let html = r#"<body><p>Only three words</p><p>This paragraph has comfortably more than five words in it.</p></body>"#;
        let filter = ContentFilter::new(FilterConfig::builder().min_block_words(5).build());
        let markdown = filter.filter(html);

        assert!(!markdown.contains("Only three words"));
        assert!(markdown.contains("comfortably more"));
    }

    #[test]
    fn test_generic_wrappers_do_not_hide_content() {
        let html = r#"<html><body>
            <div id="root"><div class="container"><div class="row">
                <h1>Acme Stainless Kettle</h1>
                <span>Price: $49.99</span>
                <p>Boils a full litre in under three minutes, although the lid hinge feels flimsy after a month of use.</p>
                <ul><li><a href="/a">Toaster</a></li><li><a href="/b">Blender</a></li><li><a href="/c">Mixer</a></li></ul>
            </div></div></div>
        </body></html>"#;

        let outcome = ContentFilter::default().filter_with_stats(html);

        assert!(outcome.markdown.contains("Acme Stainless Kettle"), "markdown was {:?}", outcome.markdown);
        assert!(outcome.markdown.contains("lid hinge feels flimsy"));
        assert!(outcome.markdown.contains("$49.99"));
        assert!(!outcome.markdown.contains("Toaster"));
        assert!(outcome.kept_blocks >= 5);
    }

    #[test]
    fn test_wrapper_without_relevant_blocks_is_pruned() {
        let html = r#"<body>
            <p>Rated 4.6 out of 5 stars based on 1,284 ratings from verified buyers of this kettle.</p>
            <div class="row"><div><a href="/a">Toaster</a> <a href="/b">Blender</a> <a href="/c">Mixer</a></div></div>
        </body>"#;

        let outcome = ContentFilter::default().filter_with_stats(html);

        assert!(outcome.markdown.contains("Rated 4.6"));
        assert!(!outcome.markdown.contains("Toaster"));
        assert!(outcome.pruned_blocks >= 1);
    }

    #[test]
    fn test_text_is_escaped() {
        let html = r#"<body><p>Buy 2 &amp; save: price &lt; $20 for members who sign up this week.</p></body>"#;
        let markdown = ContentFilter::default().filter(html);
        assert!(markdown.contains("Buy 2"));
        assert!(markdown.contains("$20 for members"));
    }
}
