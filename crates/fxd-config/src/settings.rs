use serde::{Deserialize, Serialize};

/// Typed view of the sections the code actually reads. Every field has a
/// default so a partial (or empty) config document still resolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub trading: TradingSettings,
    pub broker: BrokerSettings,
    pub runtime: RuntimeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            trading: TradingSettings::default(),
            broker: BrokerSettings::default(),
            runtime: RuntimeSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub symbols: Vec<String>,
    pub data_path: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["EURUSD".to_string()],
            data_path: "data/market.csv".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingSettings {
    pub initial_capital: f64,
    pub max_drawdown: f64,
    pub max_consecutive_losses: u32,
    pub cooldown_steps: u32,
    /// Minimum verdict confidence for live entries; replay ignores it.
    pub min_confidence: f64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            max_drawdown: 0.25,
            max_consecutive_losses: 3,
            cooldown_steps: 3,
            min_confidence: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// Fallback position size in lots when the oracle suggests none.
    pub lot_size: f64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self { lot_size: 0.01 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Seconds between live polling iterations.
    pub poll_interval_secs: u64,
    /// Bounded wait applied to feed / oracle / broker calls.
    pub call_timeout_secs: u64,
    /// Directory snapshot records are written under.
    pub state_dir: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            call_timeout_secs: 10,
            state_dir: "state".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_layered_yaml_from_strings;

    #[test]
    fn empty_document_resolves_to_defaults() {
        let loaded = load_layered_yaml_from_strings(&["{}"]).unwrap();
        let settings = loaded.settings().unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_sections_keep_defaults_for_the_rest() {
        let doc = "trading:\n  initial_capital: 2500\ngeneral:\n  symbols: [USDJPY, EURUSD]\n";
        let settings = load_layered_yaml_from_strings(&[doc])
            .unwrap()
            .settings()
            .unwrap();

        assert_eq!(settings.trading.initial_capital, 2500.0);
        assert_eq!(settings.trading.max_drawdown, 0.25);
        assert_eq!(settings.general.symbols, vec!["USDJPY", "EURUSD"]);
        assert_eq!(settings.runtime.poll_interval_secs, 60);
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let doc = "dashboard:\n  theme: dark\ntrading:\n  cooldown_steps: 5\n";
        let settings = load_layered_yaml_from_strings(&[doc])
            .unwrap()
            .settings()
            .unwrap();
        assert_eq!(settings.trading.cooldown_steps, 5);
    }
}
