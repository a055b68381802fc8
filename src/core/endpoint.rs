// src/core/endpoint.rs
use std::collections::BTreeMap;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{DorkHuntResult, DorkHuntError};

const QUERY_PLACEHOLDER: &str = "{query}";

/// A remote text-search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub url_template: String,
}

impl Endpoint {
    /// Validate that the template has exactly one insertion point
    pub fn new(id: &str, url_template: &str) -> DorkHuntResult<Self> {
        if url_template.matches(QUERY_PLACEHOLDER).count() != 1 {
            return Err(DorkHuntError::InvalidTemplate {
                engine: id.to_string(),
                template: url_template.to_string(),
            });
        }

        Ok(Self {
            id: id.to_string(),
            url_template: url_template.to_string(),
        })
    }

    /// Fill the insertion point with the form-encoded query
    pub fn url_for(&self, query: &str) -> DorkHuntResult<Url> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let raw = self.url_template.replacen(QUERY_PLACEHOLDER, &encoded, 1);

        Url::parse(&raw).map_err(|e| DorkHuntError::InvalidTemplate {
            engine: self.id.clone(),
            template: format!("{} ({})", self.url_template, e),
        })
    }
}

/// Fixed, read-only mapping of engine id to endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    /// Build from the `[engines]` table, skipping malformed templates
    pub fn from_config(engines: &BTreeMap<String, String>) -> Self {
        let mut endpoints = BTreeMap::new();

        for (id, template) in engines {
            match Endpoint::new(id, template) {
                Ok(endpoint) => {
                    endpoints.insert(id.clone(), Arc::new(endpoint));
                }
                Err(e) => {
                    warn!("Skipping engine: {}", e);
                }
            }
        }

        debug!("Endpoint registry holds {} engines", endpoints.len());
        Self { endpoints }
    }

    pub fn get(&self, id: &str) -> DorkHuntResult<Arc<Endpoint>> {
        self.endpoints
            .get(id)
            .cloned()
            .ok_or_else(|| DorkHuntError::UnknownEngine(id.to_string()))
    }

    /// Resolve an operator selection in the given order. Unknown ids are
    /// skipped with a warning; an empty selection means every engine.
    pub fn select(&self, ids: &[String]) -> Vec<Arc<Endpoint>> {
        if ids.is_empty() {
            return self.endpoints.values().cloned().collect();
        }

        let mut selected: Vec<Arc<Endpoint>> = Vec::new();
        for id in ids {
            let id = id.trim().to_lowercase();
            match self.get(&id) {
                Ok(endpoint) => {
                    if !selected.iter().any(|e| e.id == endpoint.id) {
                        selected.push(endpoint);
                    }
                }
                Err(e) => warn!("{}, ignoring", e),
            }
        }

        selected
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
