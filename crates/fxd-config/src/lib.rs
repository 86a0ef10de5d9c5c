//! Layered YAML configuration with a deterministic hash.
//!
//! Config is assembled from one or more YAML documents merged in order
//! (earlier docs are base, later docs override), canonicalized to compact
//! JSON, and hashed so every run can record exactly which configuration it
//! executed under.

mod settings;

pub use settings::{
    BrokerSettings, GeneralSettings, RuntimeSettings, Settings, TradingSettings,
};

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// The merged configuration plus its identity hash.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Deserialize the typed settings view of the merged document.
    pub fn settings(&self) -> Result<Settings> {
        serde_json::from_value(self.config_json.clone()).context("invalid settings section")
    }
}

/// Load and merge YAML files in order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

/// Merge YAML docs in order: earlier docs are base, later docs override.
pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json maps are key-sorted, so compact serialization is already a
    // canonical form: same content => same bytes => same hash.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layer_overrides_earlier() {
        let base = "trading:\n  initial_capital: 10000\n  max_drawdown: 0.25\n";
        let env = "trading:\n  max_drawdown: 0.10\n";
        let loaded = load_layered_yaml_from_strings(&[base, env]).unwrap();

        assert_eq!(loaded.config_json["trading"]["max_drawdown"], 0.10);
        assert_eq!(loaded.config_json["trading"]["initial_capital"], 10000);
    }

    #[test]
    fn sibling_sections_survive_a_merge() {
        let base = "general:\n  symbols: [EURUSD]\n";
        let env = "trading:\n  initial_capital: 5000\n";
        let loaded = load_layered_yaml_from_strings(&[base, env]).unwrap();
        assert_eq!(loaded.config_json["general"]["symbols"][0], "EURUSD");
        assert_eq!(loaded.config_json["trading"]["initial_capital"], 5000);
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = "trading:\n  initial_capital: 10000\n  max_drawdown: 0.25\n";
        let b = "trading:\n  max_drawdown: 0.25\n  initial_capital: 10000\n";
        let ha = load_layered_yaml_from_strings(&[a]).unwrap().config_hash;
        let hb = load_layered_yaml_from_strings(&[b]).unwrap().config_hash;
        assert_eq!(ha, hb);
    }

    #[test]
    fn hash_changes_when_a_value_changes() {
        let a = "trading:\n  max_drawdown: 0.25\n";
        let b = "trading:\n  max_drawdown: 0.26\n";
        let ha = load_layered_yaml_from_strings(&[a]).unwrap().config_hash;
        let hb = load_layered_yaml_from_strings(&[b]).unwrap().config_hash;
        assert_ne!(ha, hb);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(load_layered_yaml_from_strings(&["a: [unclosed"]).is_err());
    }
}
