use std::sync::LazyLock;

use crate::parse::Element;
use regex::Regex;

/// Default relevance cutoff; blocks scoring below it are pruned.
pub const DEFAULT_THRESHOLD: f64 = 0.48;

/// Configuration for block relevance scoring
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Blocks with a final score below this value are pruned
    pub threshold: f64,
    /// Weight of the text-to-markup ratio
    pub text_density_weight: f64,
    /// Weight of the share of text that is not link text
    pub link_density_weight: f64,
    /// Weight of the tag's prior
    pub tag_weight: f64,
    /// Weight of the class/ID pattern adjustment
    pub class_id_weight: f64,
    /// Weight of the logarithmic text length term
    pub text_length_weight: f64,
    /// Character count at which the text length term saturates
    pub saturation_chars: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            text_density_weight: 0.4,
            link_density_weight: 0.2,
            tag_weight: 0.2,
            class_id_weight: 0.1,
            text_length_weight: 0.1,
            saturation_chars: 1000,
        }
    }
}

impl ScoreConfig {
    fn total_weight(&self) -> f64 {
        self.text_density_weight
            + self.link_density_weight
            + self.tag_weight
            + self.class_id_weight
            + self.text_length_weight
    }
}

/// Result of scoring a block
#[derive(Debug, Clone)]
pub struct BlockScore {
    /// The block's tag name
    pub tag_name: String,
    /// Text characters over markup characters (0.0 to 1.0)
    pub text_density: f64,
    /// Link text characters over text characters (0.0 to 1.0)
    pub link_density: f64,
    /// Prior for the tag type
    pub tag_weight: f64,
    /// Adjustment from class/ID patterns (-0.5, 0.0 or 0.5)
    pub class_weight: f64,
    /// Logarithmic text length term (0.0 to 1.0)
    pub text_length: f64,
    /// Weighted combination of the metrics above
    pub score: f64,
}

/// Tags treated as prunable blocks; anything else is inline and follows its parent.
pub const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "main",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Whether a tag is scored as a block
pub fn is_block(tag_name: &str) -> bool {
    BLOCK_TAGS.contains(&tag_name)
}

/// Prior for how likely a tag is to carry product content
///
/// - ARTICLE: 1.5
/// - H1: 1.2, H2: 1.1, H3: 1.0 ... H6: 0.7
/// - P, SECTION, MAIN: 1.0
/// - TD, BLOCKQUOTE, PRE: 0.8
/// - everything else: 0.5
pub fn tag_weight(tag_name: &str) -> f64 {
    match tag_name {
        "article" => 1.5,
        "h1" => 1.2,
        "h2" => 1.1,
        "h3" | "p" | "section" | "main" => 1.0,
        "h4" => 0.9,
        "h5" | "td" | "blockquote" | "pre" => 0.8,
        "h6" => 0.7,
        _ => 0.5,
    }
}

/// Positive patterns that suggest an element contains main content
const POSITIVE_PATTERNS: &str =
    r"(?i)(article|body|content|entry|main|page|post|text|product|price|rating|review|description|detail)";

/// Negative patterns that suggest an element does NOT contain main content
const NEGATIVE_PATTERNS: &str = r"(?i)(banner|breadcrumbs?|combx|comment-form|community|disqus|extra|foot|header|menu|nav|related|recommend|remark|rss|share|shoutbox|sidebar|social|sponsor|ad-break|advert|agegate|pagination|pager|promo|widget)";

static POSITIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(POSITIVE_PATTERNS).expect("valid regex"));
static NEGATIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(NEGATIVE_PATTERNS).expect("valid regex"));

/// Calculate the class/ID adjustment for an element
///
/// The ID is checked before classes. Negative matches win over positive
/// ones for the same name, so `product-sidebar` is still penalized.
pub fn class_id_weight(element: &Element<'_>) -> f64 {
    let classify = |name: &str| {
        if NEGATIVE_REGEX.is_match(name) {
            Some(-0.5)
        } else if POSITIVE_REGEX.is_match(name) {
            Some(0.5)
        } else {
            None
        }
    };

    if let Some(weight) = element.attr("id").and_then(classify) {
        return weight;
    }

    element
        .attr("class")
        .and_then(|class| class.split_whitespace().find_map(classify))
        .unwrap_or(0.0)
}

/// Ratio of text characters to serialized markup characters
pub fn text_density(element: &Element<'_>) -> f64 {
    let html_length = element.outer_html().chars().count();
    if html_length == 0 {
        return 0.0;
    }
    let text_length = element.text().chars().count();

    (text_length as f64 / html_length as f64).min(1.0)
}

/// Calculate the link density of an element
///
/// Link density is the ratio of link text characters to total text characters.
/// Returns a value from 0.0 (no links) to 1.0 (all text is in links).
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();

    if text_length == 0 {
        return 0.0;
    }

    let link_text_length = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum::<usize>();

    (link_text_length as f64 / text_length as f64).min(1.0)
}

/// Logarithmic text length term, saturating at `saturation_chars`
pub fn text_length_score(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let length = element.text().trim().chars().count() as f64;
    let saturation = (config.saturation_chars.max(1) as f64 + 1.0).ln();

    ((length + 1.0).ln() / saturation).min(1.0)
}

/// Score a block element
///
/// The final score is the weighted mean of text density, non-link share,
/// tag prior, class/ID adjustment and text length. Blocks without any
/// visible text always score zero.
pub fn score_block(element: &Element<'_>, config: &ScoreConfig) -> BlockScore {
    let tag_name = element.tag_name();
    let text_density = text_density(element);
    let link_density = link_density(element);
    let tag_weight = tag_weight(&tag_name);
    let class_weight = class_id_weight(element);
    let text_length = text_length_score(element, config);

    let has_text = !element.text().trim().is_empty();
    let total = config.total_weight();

    let score = if !has_text || total <= 0.0 {
        0.0
    } else {
        (config.text_density_weight * text_density
            + config.link_density_weight * (1.0 - link_density)
            + config.tag_weight * tag_weight
            + config.class_id_weight * class_weight
            + config.text_length_weight * text_length)
            / total
    };

    BlockScore { tag_name, text_density, link_density, tag_weight, class_weight, text_length, score }
}
