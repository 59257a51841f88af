//! TTL Policy Module
//!
//! Resolves the effective TTL for a key from a default plus per-key
//! overrides. Overrides may name exact keys or `prefix*` patterns. A policy
//! is an immutable snapshot; reloading replaces the whole value so readers
//! never observe a partially-updated map.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == TTL Policy ==
/// Immutable TTL resolution snapshot.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    /// TTL applied when no override matches
    default: Duration,
    /// Exact-key overrides
    exact: HashMap<String, Duration>,
    /// Prefix overrides, from `prefix*` patterns
    prefixes: Vec<(String, Duration)>,
}

impl TtlPolicy {
    /// Creates a validated policy from a default TTL and an override map.
    ///
    /// Keys ending in `*` are treated as prefix patterns; all other keys
    /// match exactly. Fails fast on a non-positive default, a non-positive
    /// override, or an empty override key.
    pub fn new(default: Duration, overrides: HashMap<String, Duration>) -> Result<Self> {
        if default.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default TTL must be positive".to_string(),
            ));
        }

        let mut exact = HashMap::new();
        let mut prefixes = Vec::new();
        for (key, ttl) in overrides {
            if key.is_empty() || key == "*" {
                return Err(CacheError::InvalidConfig(format!(
                    "TTL override key '{}' is not a valid key or pattern",
                    key
                )));
            }
            if ttl.is_zero() {
                return Err(CacheError::InvalidConfig(format!(
                    "TTL override for '{}' must be positive",
                    key
                )));
            }
            match key.strip_suffix('*') {
                Some(prefix) => prefixes.push((prefix.to_string(), ttl)),
                None => {
                    exact.insert(key, ttl);
                }
            }
        }

        // Longest prefix wins when several patterns match.
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(Self {
            default,
            exact,
            prefixes,
        })
    }

    // == Resolve ==
    /// Resolves the effective TTL for a key.
    ///
    /// Resolution order: exact override, longest matching prefix pattern,
    /// configured default. Pure function of the snapshot; always returns a
    /// positive duration.
    pub fn resolve(&self, key: &str) -> Duration {
        if let Some(ttl) = self.exact.get(key) {
            return *ttl;
        }
        for (prefix, ttl) in &self.prefixes {
            if key.starts_with(prefix.as_str()) {
                return *ttl;
            }
        }
        self.default
    }

    /// Returns the configured default TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default
    }
}
