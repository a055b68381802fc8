mod extractor;
mod matchers;

pub use extractor::{Category, ExtractionResult, Extractor};
pub use matchers::{default_matchers, IndicatorMatcher, RegexMatcher, UrlMatcher};
