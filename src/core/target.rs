// src/core/target.rs
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::error::{DorkHuntResult, DorkHuntError};

/// Classification of an operator-supplied target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Email,
    Identifier,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Email => write!(f, "email"),
            TargetKind::Identifier => write!(f, "identifier"),
        }
    }
}

/// The value being hunted for. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    value: String,
    kind: TargetKind,
    domain: Option<String>,
}

impl Target {
    /// Trim and classify the raw input. Blank input is rejected.
    ///
    /// Anything with a non-empty part after its last `@` is an email target,
    /// which also covers the bare `@domain.tld` form.
    pub fn parse(raw: &str) -> DorkHuntResult<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DorkHuntError::EmptyTarget);
        }

        let domain = value
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim())
            .filter(|domain| !domain.is_empty())
            .map(str::to_string);

        let kind = if domain.is_some() {
            TargetKind::Email
        } else {
            TargetKind::Identifier
        };

        Ok(Self {
            value: value.to_string(),
            kind,
            domain,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Domain part of an email target
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// True when the target has no internal whitespace
    pub fn is_single_token(&self) -> bool {
        self.value.split_whitespace().count() == 1
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
