// src/engine/identity.rs
use std::collections::{BTreeMap, HashMap};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::IdentityConfig;
use crate::error::{DorkHuntResult, DorkHuntError};

/// Outbound request headers presented as one identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.get("User-Agent")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// spreads consecutive window indices across the seed space
const WINDOW_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hands out one identity per window of consecutive request indices.
///
/// The pool is read-only; the per-window choice is cached so every request
/// in a window sees the same identity regardless of which task asks first.
/// Choices are derived from `(seed, window)`, so a run is reproducible from
/// its seed.
pub struct IdentityRotator {
    pool: Vec<HeaderSet>,
    window_size: u64,
    seed: u64,
    windows: Mutex<HashMap<u64, usize>>,
}

impl IdentityRotator {
    pub fn new(pool: Vec<HeaderSet>, window_size: u64, seed: u64) -> DorkHuntResult<Self> {
        if pool.is_empty() {
            return Err(DorkHuntError::ConfigError("identity pool must not be empty".to_string()));
        }

        Ok(Self {
            pool,
            window_size: window_size.max(1),
            seed,
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// One header set per configured user agent. `seed` overrides the
    /// configured seed; with neither, a fresh random seed is drawn.
    pub fn from_config(config: &IdentityConfig, seed: Option<u64>) -> DorkHuntResult<Self> {
        let pool = config
            .user_agents
            .iter()
            .map(|ua| {
                HeaderSet::new()
                    .with("User-Agent", ua)
                    .with("Accept-Language", &config.accept_language)
            })
            .collect();

        let seed = seed.or(config.seed).unwrap_or_else(rand::random);
        debug!("Identity rotation seed: {}", seed);

        Self::new(pool, config.window_size, seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn window_of(&self, request_index: u64) -> u64 {
        request_index / self.window_size
    }

    /// Identity for the request at `request_index`
    pub fn identity_for(&self, request_index: u64) -> &HeaderSet {
        let window = self.window_of(request_index);
        let slot = *self
            .windows
            .lock()
            .entry(window)
            .or_insert_with(|| self.pick(window));

        &self.pool[slot]
    }

    fn pick(&self, window: u64) -> usize {
        let mut rng = StdRng::seed_from_u64(self.seed ^ window.wrapping_mul(WINDOW_MIX));
        let slot = rng.gen_range(0..self.pool.len());
        debug!("Identity window {} uses pool slot {}", window, slot);
        slot
    }
}
