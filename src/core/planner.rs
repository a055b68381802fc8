// src/core/planner.rs
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::config::{Config, TemplateConfig, TemplateFamily};
use crate::error::DorkHuntResult;
use super::target::{Target, TargetKind};

/// Extra tailoring for single-token identifier targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryHint {
    Male,
    Female,
}

impl CategoryHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryHint::Male => "male",
            CategoryHint::Female => "female",
        }
    }
}

impl FromStr for CategoryHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(CategoryHint::Male),
            "female" => Ok(CategoryHint::Female),
            other => Err(format!("unknown category hint: {} (expected male or female)", other)),
        }
    }
}

impl fmt::Display for CategoryHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options consumed by a planning pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanOptions {
    pub deep_mode: bool,
    pub locale: Option<String>,
    pub category_hint: Option<CategoryHint>,
}

/// A fully formed search string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query(text)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expands a target into an ordered, deduplicated list of dork queries
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    templates: Vec<TemplateConfig>,
    locales: BTreeMap<String, String>,
}

impl QueryPlanner {
    pub fn new(templates: Vec<TemplateConfig>, locales: BTreeMap<String, String>) -> Self {
        Self { templates, locales }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.templates.clone(), config.locales.clone())
    }

    /// Parse the raw target, then plan. Blank input fails before any query exists.
    pub fn plan_str(&self, raw_target: &str, options: &PlanOptions) -> DorkHuntResult<(Target, Vec<Query>)> {
        let target = Target::parse(raw_target)?;
        let queries = self.plan(&target, options);
        Ok((target, queries))
    }

    /// Produce the query list. Order follows the template table, families in
    /// the order base, deep, hint; duplicates keep their first position.
    pub fn plan(&self, target: &Target, options: &PlanOptions) -> Vec<Query> {
        let mut families = vec![match target.kind() {
            TargetKind::Email => TemplateFamily::Email,
            TargetKind::Identifier => TemplateFamily::Identifier,
        }];

        if options.deep_mode {
            families.push(TemplateFamily::Deep);
        }

        let hint = options.category_hint.filter(|_| {
            target.kind() == TargetKind::Identifier && target.is_single_token()
        });
        if options.category_hint.is_some() && hint.is_none() {
            debug!("Category hint ignored for target {}", target);
        }
        if hint.is_some() {
            families.push(TemplateFamily::Hint);
        }

        let locale_filter = self.locale_filter(options.locale.as_deref());

        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        for family in families {
            for template in self.templates.iter().filter(|t| t.family == family) {
                let Some(mut text) = render(&template.pattern, target, hint) else {
                    debug!("Template {:?} does not apply to {}", template.pattern, target);
                    continue;
                };

                if let Some(filter) = &locale_filter {
                    text.push(' ');
                    text.push_str(filter);
                }

                if seen.insert(text.clone()) {
                    queries.push(Query(text));
                }
            }
        }

        info!("Planned {} queries for {} target {}", queries.len(), target.kind(), target);
        queries
    }

    fn locale_filter(&self, locale: Option<&str>) -> Option<String> {
        let code = locale?.trim().to_lowercase();
        match self.locales.get(&code) {
            Some(region) => Some(format!("country:{}", region)),
            None => {
                warn!("Unknown locale code {:?}, no locale filter applied", code);
                None
            }
        }
    }
}

/// Fill placeholders. Returns None when the template needs a value the
/// target does not have.
fn render(pattern: &str, target: &Target, hint: Option<CategoryHint>) -> Option<String> {
    let mut text = pattern.replace("{target}", target.value());

    if text.contains("{domain}") {
        text = text.replace("{domain}", target.domain()?);
    }

    if text.contains("{hint}") {
        text = text.replace("{hint}", hint?.as_str());
    }

    Some(text)
}
