// src/osint/extractor.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use scraper::{ElementRef, Html};
use serde::{Serialize, Deserialize};

use super::matchers::{default_matchers, IndicatorMatcher};

/// Fixed set of indicator classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Emails,
    Ips,
    Urls,
    Secrets,
    CredentialPairs,
    Usernames,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Emails,
        Category::Ips,
        Category::Urls,
        Category::Secrets,
        Category::CredentialPairs,
        Category::Usernames,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Emails => "emails",
            Category::Ips => "ips",
            Category::Urls => "urls",
            Category::Secrets => "secrets",
            Category::CredentialPairs => "credential_pairs",
            Category::Usernames => "usernames",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches from a single response body. Categories without matches are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    findings: BTreeMap<Category, BTreeSet<String>>,
}

impl ExtractionResult {
    pub fn insert(&mut self, category: Category, value: impl Into<String>) -> bool {
        self.findings.entry(category).or_default().insert(value.into())
    }

    pub fn get(&self, category: Category) -> Option<&BTreeSet<String>> {
        self.findings.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.findings.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &BTreeSet<String>)> {
        self.findings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Number of matches across all categories
    pub fn total(&self) -> usize {
        self.findings.values().map(BTreeSet::len).sum()
    }

    pub fn into_inner(self) -> BTreeMap<Category, BTreeSet<String>> {
        self.findings
    }
}

impl<S: Into<String>> FromIterator<(Category, S)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (Category, S)>>(iter: I) -> Self {
        let mut result = ExtractionResult::default();
        for (category, value) in iter {
            result.insert(category, value);
        }
        result
    }
}

// text under these elements is never rendered
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

// phrasing content; every other element breaks the text flow
const INLINE_ELEMENTS: [&str; 25] = [
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

/// Turns untrusted response bodies into indicator sets. Holds no mutable
/// state, so one instance is shared by every task.
pub struct Extractor {
    matchers: Vec<Box<dyn IndicatorMatcher>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(default_matchers())
    }
}

impl Extractor {
    pub fn new(matchers: Vec<Box<dyn IndicatorMatcher>>) -> Self {
        Self { matchers }
    }

    /// Replace the matcher for a category, or add one
    pub fn with_matcher(mut self, matcher: Box<dyn IndicatorMatcher>) -> Self {
        let category = matcher.category();
        self.matchers.retain(|m| m.category() != category);
        self.matchers.push(matcher);
        self
    }

    /// Run every matcher over the visible text. Absolute `<a href>` targets
    /// are filed under urls as well.
    pub fn extract(&self, body: &str) -> ExtractionResult {
        let document = Html::parse_document(body);

        let mut raw = String::new();
        let mut links = Vec::new();
        collect_visible(document.root_element(), &mut raw, &mut links);
        let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut result = ExtractionResult::default();

        for matcher in &self.matchers {
            for hit in matcher.find(&text) {
                result.insert(matcher.category(), hit);
            }
        }

        for link in links {
            result.insert(Category::Urls, link);
        }

        result
    }
}

/// Append the rendered text under `element`. Inline markup joins its
/// neighbours directly; block boundaries become a space so adjacent cells
/// do not fuse.
fn collect_visible(element: ElementRef<'_>, text: &mut String, links: &mut Vec<String>) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    if name == "a" {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            if href.starts_with("http://") || href.starts_with("https://") {
                links.push(href.to_string());
            }
        }
    }

    let block = !INLINE_ELEMENTS.contains(&name);
    if block {
        text.push(' ');
    }

    for child in element.children() {
        if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
        } else if let Some(child) = ElementRef::wrap(child) {
            collect_visible(child, text, links);
        }
    }

    if block {
        text.push(' ');
    }
}
