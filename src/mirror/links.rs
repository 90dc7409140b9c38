//! Asset reference scanning over raw HTML/CSS text.
//!
//! This is a pattern scan, not a parser: it finds `src="…"`, `href="…"` and
//! CSS `url("…")` values made only of `[0-9a-zA-Z./_-]`, including ones inside
//! comments or scripts, and misses anything encoded or built dynamically.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// `src='…'` / `href="…"` attribute values.
#[allow(clippy::expect_used)]
static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:src|href)=['"]([0-9a-zA-Z./_-]+)['"]"#).expect("attribute regex is valid") // Static pattern, safe to panic
});

/// CSS `url('…')` values.
#[allow(clippy::expect_used)]
static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(['"]([0-9a-zA-Z./_-]+)['"]\)"#).expect("css url regex is valid") // Static pattern, safe to panic
});

/// References found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    /// Attribute matches in document order, then `url()` matches in document
    /// order. Duplicates are kept.
    pub references: Vec<String>,
    /// Directory part of every reference that contains `/`.
    pub implied_directories: BTreeSet<String>,
}

impl LinkSet {
    fn push(&mut self, reference: &str) {
        trace!(reference, "found reference");
        if let Some((directory, _file)) = reference.rsplit_once('/')
            && !directory.is_empty()
        {
            self.implied_directories.insert(directory.to_string());
        }
        self.references.push(reference.to_string());
    }
}

/// Scans `html` for asset references.
///
/// # Examples
///
/// ```
/// use wget_core::mirror::extract_links;
///
/// let links = extract_links(r#"<img src="img/logo.png"><a href="about.html">"#);
/// assert_eq!(links.references, ["img/logo.png", "about.html"]);
/// assert!(links.implied_directories.contains("img"));
/// ```
#[must_use]
#[tracing::instrument(level = "debug", skip(html), fields(html_len = html.len()))]
pub fn extract_links(html: &str) -> LinkSet {
    let mut links = LinkSet::default();

    for pattern in [&*ATTRIBUTE_PATTERN, &*CSS_URL_PATTERN] {
        for captures in pattern.captures_iter(html) {
            if let Some(reference) = captures.get(1) {
                links.push(reference.as_str());
            }
        }
    }

    links
}
