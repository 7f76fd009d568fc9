//! Result extraction for Google's HTML results page.
//!
//! Google's markup is unstable, so matching is structural: an organic result
//! is a `div.g` block that is neither nested in another result nor part of an
//! ad block. The first link in the block is the result URL and one of two
//! content-feature blocks, when present, holds the snippet.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{LinkEntry, Result, ResultMatcher, SearchError};

/// CSS rules used to locate results. Swap them when the markup changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherRules {
    /// Organic result blocks.
    pub container: String,
    /// Blocks whose descendants are never results (ads, suggestions).
    pub excluded: String,
    /// The primary link inside a container.
    pub anchor: String,
    /// Snippet blocks, tried in order.
    pub descriptions: Vec<String>,
}

impl Default for MatcherRules {
    fn default() -> Self {
        Self {
            container: "div.g".to_string(),
            excluded: "[data-text-ad], #tads, #bottomads".to_string(),
            anchor: "a[href]".to_string(),
            descriptions: vec![
                r#"[data-content-feature="1"]"#.to_string(),
                r#"[data-content-feature="2"]"#.to_string(),
            ],
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::InvalidSelector(format!("{css}: {e:?}")))
}

/// Default [`ResultMatcher`] for Google results pages.
pub struct GoogleResultMatcher {
    container: Selector,
    excluded: Selector,
    anchor: Selector,
    descriptions: Vec<Selector>,
}

impl GoogleResultMatcher {
    /// Creates a matcher with the built-in rules.
    pub fn new() -> Self {
        Self::with_rules(&MatcherRules::default()).expect("built-in selectors are valid")
    }

    /// Creates a matcher from custom rules.
    pub fn with_rules(rules: &MatcherRules) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&rules.container)?,
            excluded: parse_selector(&rules.excluded)?,
            anchor: parse_selector(&rules.anchor)?,
            descriptions: rules
                .descriptions
                .iter()
                .map(|css| parse_selector(css))
                .collect::<Result<_>>()?,
        })
    }

    /// A container nested in another container or in an excluded block is
    /// not an organic result of its own.
    fn is_organic(&self, element: &ElementRef) -> bool {
        if self.excluded.matches(element) {
            return false;
        }
        !element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|parent| self.container.matches(&parent) || self.excluded.matches(&parent))
    }

    fn url(&self, element: &ElementRef) -> Option<String> {
        let href = element
            .select(&self.anchor)
            .next()?
            .value()
            .attr("href")?
            .trim();
        resolve_href(href)
    }

    fn description(&self, element: &ElementRef) -> Option<String> {
        self.descriptions.iter().find_map(|selector| {
            let block = element.select(selector).next()?;
            let inner = block
                .children()
                .filter_map(ElementRef::wrap)
                .find(|child| child.value().name() == "div")
                .unwrap_or(block);
            let text = collapse_whitespace(&inner.text().collect::<String>());
            (!text.is_empty()).then_some(text)
        })
    }
}

impl Default for GoogleResultMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultMatcher for GoogleResultMatcher {
    fn extract(&self, html: &str) -> Vec<LinkEntry> {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for element in document.select(&self.container) {
            if !self.is_organic(&element) {
                continue;
            }

            let Some(url) = self.url(&element) else {
                debug!("Skipping result block without a usable link");
                continue;
            };

            let entry = match self.description(&element) {
                Some(description) => LinkEntry::new(url, description),
                None => LinkEntry::without_description(url),
            };
            entries.push(entry);
        }

        entries
    }
}

/// Turns an anchor `href` into a destination URL.
///
/// `/url?q=<target>&...` redirects are unwrapped; other relative links point
/// back into the engine and are rejected.
fn resolve_href(href: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    if let Some(target) = href.strip_prefix("/url?q=") {
        let target = target.split('&').next().unwrap_or(target);
        let decoded = urlencoding::decode(target).ok()?;
        return (!decoded.is_empty()).then(|| decoded.into_owned());
    }
    if href.starts_with('/') || href.starts_with('#') {
        return None;
    }
    Some(href.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
