//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types the content
//! filter walks when pruning a fetched page.
//!
//! # Example
//!
//! ```rust
//! use reviewlens_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Acme Kettle</title></head>
//!         <body><p class="price">$49.99</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.title(), Some("Acme Kettle".to_string()));
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{ReviewLensError, Result};

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// html5ever recovers from any markup, so parsing itself cannot fail.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewLensError::Config`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reviewlens_core::parse::Document;
    ///
    /// let doc = Document::parse(r#"<p class="review">Great</p><p class="review">Meh</p>"#);
    /// assert_eq!(doc.select("p.review").unwrap().len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = Selector::parse(selector)
            .map_err(|e| ReviewLensError::Config(format!("Invalid selector: {}", e)))?;

        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the trimmed content of the `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Gets the `<body>` element.
    ///
    /// html5ever always synthesizes one, so this is `None` only for
    /// fragments parsed in unusual quirks modes.
    pub fn body(&self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|el| Element { element: el })
    }
}

/// A direct child of an [`Element`].
#[derive(Clone, Debug)]
pub enum Child<'a> {
    Element(Element<'a>),
    Text(&'a str),
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use reviewlens_core::parse::Document;
///
/// let doc = Document::parse(r#"<a href="/reviews">See reviews</a>"#);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "See reviews");
/// assert_eq!(link.attr("href"), Some("/reviews"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Iterates over direct element and text children, skipping comments
    /// and processing instructions.
    pub fn children(&self) -> impl Iterator<Item = Child<'a>> + 'a {
        self.element.children().filter_map(|node| match node.value() {
            Node::Text(text) => Some(Child::Text(&**text)),
            Node::Element(_) => ElementRef::wrap(node).map(|element| Child::Element(Element { element })),
            _ => None,
        })
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewLensError::Config`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = Selector::parse(selector)
            .map_err(|e| ReviewLensError::Config(format!("Invalid selector: {}", e)))?;

        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}
