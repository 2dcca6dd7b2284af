//! Metric weights and feature flags
//!
//! Settings travel as one flat JSON blob: the browser shell persists it to
//! `storage.sync` as a unit and hands it back verbatim on startup. The engine
//! never talks to storage itself; failures there degrade to session-only
//! settings on the caller's side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::MetricWeight;
use crate::EngineError;

/// Upper bound for a metric weight.
pub const WEIGHT_MAX: u16 = 1000;

/// Metrics every fresh profile starts with, all at weight zero.
pub const DEFAULT_METRICS: [&str; 4] = [
    "IQ",
    "Reading Comprehension",
    "Critical Thinking",
    "Has Children",
];

/// Mapping of metric name to weight in `0..=1000`.
///
/// Zero-weight entries stay in the map (the UI renders them) but are excluded
/// from outgoing ranking requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricWeights(BTreeMap<String, u16>);

impl MetricWeights {
    pub fn defaults() -> Self {
        Self(
            DEFAULT_METRICS
                .iter()
                .map(|name| (name.to_string(), 0))
                .collect(),
        )
    }

    /// Set a weight, clamping to [`WEIGHT_MAX`]. Creates the metric if new.
    pub fn set(&mut self, name: &str, weight: u16) {
        self.0.insert(name.to_string(), weight.min(WEIGHT_MAX));
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.0.get(name).copied()
    }

    /// Create a new metric at weight zero. Existing entries are untouched.
    pub fn add_metric(&mut self, name: &str) {
        self.0.entry(name.to_string()).or_insert(0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.0.iter().map(|(name, weight)| (name.as_str(), *weight))
    }

    /// Metrics with weight > 0, in the shape the wire protocol wants.
    pub fn active(&self) -> Vec<MetricWeight> {
        self.0
            .iter()
            .filter(|(_, weight)| **weight > 0)
            .map(|(name, weight)| MetricWeight {
                weigh_name: name.clone(),
                weigh_value: *weight,
            })
            .collect()
    }

    pub fn has_active(&self) -> bool {
        self.0.values().any(|weight| *weight > 0)
    }

    /// Ensure every default metric exists, keeping stored weights. Applied
    /// after deserializing a persisted blob so profiles written by older
    /// versions still show the full default set.
    fn merge_defaults(&mut self) {
        for name in DEFAULT_METRICS {
            self.0.entry(name.to_string()).or_insert(0);
        }
    }
}

/// Process-wide flags plus the weight table, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true", rename = "removePromoted")]
    pub remove_promoted: bool,
    #[serde(default = "MetricWeights::defaults")]
    pub metrics: MetricWeights,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            remove_promoted: true,
            metrics: MetricWeights::defaults(),
        }
    }
}

impl Settings {
    /// Decode a persisted settings blob, merging defaults for any metric the
    /// stored profile predates.
    pub fn from_json(blob: &str) -> Result<Self, EngineError> {
        let mut settings: Settings = serde_json::from_str(blob)?;
        settings.metrics.merge_defaults();
        Ok(settings)
    }

    pub fn to_json(&self) -> String {
        // A struct of flags and a string map cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn reset_to_defaults(&mut self) {
        self.metrics = MetricWeights::defaults();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_four_zero_metrics() {
        let settings = Settings::default();
        assert_eq!(settings.metrics.len(), 4);
        assert!(!settings.metrics.has_active());
        assert!(settings.enabled);
        assert!(settings.remove_promoted);
    }

    #[test]
    fn test_set_clamps_to_max() {
        let mut weights = MetricWeights::defaults();
        weights.set("IQ", 5000);
        assert_eq!(weights.get("IQ"), Some(WEIGHT_MAX));
        weights.set("IQ", 0);
        assert_eq!(weights.get("IQ"), Some(0));
    }

    #[test]
    fn test_active_excludes_zero_weights() {
        let mut weights = MetricWeights::defaults();
        weights.set("IQ", 10);
        let active = weights.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].weigh_name, "IQ");
        assert_eq!(active[0].weigh_value, 10);
    }

    #[test]
    fn test_add_metric_does_not_clobber() {
        let mut weights = MetricWeights::defaults();
        weights.set("Humor", 7);
        weights.add_metric("Humor");
        assert_eq!(weights.get("Humor"), Some(7));
        weights.add_metric("Honesty");
        assert_eq!(weights.get("Honesty"), Some(0));
    }

    #[test]
    fn test_blob_round_trip() {
        let mut settings = Settings::default();
        settings.enabled = false;
        settings.metrics.set("IQ", 42);
        let decoded = Settings::from_json(&settings.to_json()).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_stored_blob_merges_over_defaults() {
        // Blob written before "Has Children" existed, with a custom metric.
        let blob = r#"{"enabled":true,"removePromoted":false,"metrics":{"IQ":10,"Humor":3}}"#;
        let settings = Settings::from_json(blob).unwrap();
        assert_eq!(settings.metrics.get("IQ"), Some(10));
        assert_eq!(settings.metrics.get("Humor"), Some(3));
        assert_eq!(settings.metrics.get("Has Children"), Some(0));
        assert!(!settings.remove_promoted);
    }

    #[test]
    fn test_empty_blob_yields_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
