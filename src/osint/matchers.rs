// src/osint/matchers.rs
use std::net::Ipv4Addr;
use once_cell::sync::Lazy;
use regex::Regex;

use super::extractor::Category;

/// Finds indicators of one category in visible text
pub trait IndicatorMatcher: Send + Sync {
    /// Category every match is filed under
    fn category(&self) -> Category;

    /// All matches in `text`, duplicates allowed
    fn find(&self, text: &str) -> Vec<String>;
}

/// Regex-backed matcher with an optional capture group and post-filter
pub struct RegexMatcher {
    category: Category,
    regex: Regex,
    group: usize,
    validator: Option<fn(&str) -> bool>,
}

impl RegexMatcher {
    pub fn new(category: Category, regex: Regex) -> Self {
        Self {
            category,
            regex,
            group: 0,
            validator: None,
        }
    }

    /// Report the given capture group instead of the whole match
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Drop matches the validator rejects
    pub fn with_validator(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }
}

impl IndicatorMatcher for RegexMatcher {
    fn category(&self) -> Category {
        self.category
    }

    fn find(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(self.group))
            .map(|m| m.as_str())
            .filter(|m| self.validator.map_or(true, |valid| valid(m)))
            .map(str::to_string)
            .collect()
    }
}

/// Absolute http(s) URLs with trailing sentence punctuation removed
pub struct UrlMatcher;

impl IndicatorMatcher for UrlMatcher {
    fn category(&self) -> Category {
        Category::Urls
    }

    fn find(&self, text: &str) -> Vec<String> {
        URL_RE
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(|c: char| ".,;:!?)]}".contains(c)))
            .filter(|url| url.len() > "https://".len())
            .map(str::to_string)
            .collect()
    }
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap()
});

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap()
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s'"<>]+"#).unwrap()
});

static SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:api[_-]?key|apikey|secret(?:[_-]?key)?|access[_-]?token|auth[_-]?token|token|password|passwd|pwd)\s*[:=]\s*['"]?[\w-]{8,}['"]?"#
    ).unwrap()
});

static CREDENTIAL_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+(?:@[A-Za-z0-9.-]+\.[A-Za-z]{2,})?:[A-Za-z0-9._%!@#$^&*+-]{4,}").unwrap()
});

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s(\[,;])(@[A-Za-z0-9_]{3,30})\b").unwrap()
});

fn is_ipv4(candidate: &str) -> bool {
    candidate.parse::<Ipv4Addr>().is_ok()
}

// ports, clock times and ratios are not credentials
fn is_credential_pair(candidate: &str) -> bool {
    match candidate.split_once(':') {
        Some((_, secret)) => !secret.chars().all(|c| c.is_ascii_digit() || c == '.'),
        None => false,
    }
}

/// The built-in matcher set, one per category
pub fn default_matchers() -> Vec<Box<dyn IndicatorMatcher>> {
    vec![
        Box::new(RegexMatcher::new(Category::Emails, EMAIL_RE.clone())),
        Box::new(RegexMatcher::new(Category::Ips, IPV4_RE.clone()).with_validator(is_ipv4)),
        Box::new(UrlMatcher),
        Box::new(RegexMatcher::new(Category::Secrets, SECRET_RE.clone())),
        Box::new(
            RegexMatcher::new(Category::CredentialPairs, CREDENTIAL_PAIR_RE.clone())
                .with_validator(is_credential_pair),
        ),
        Box::new(RegexMatcher::new(Category::Usernames, USERNAME_RE.clone()).with_group(1)),
    ]
}
