use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Volatility-style features above this magnitude are considered corrupt.
const ABSURD_ATR: f64 = 1e4;

/// Fallback spread fraction when neither `spread_pct` nor the inputs to
/// derive it are present.
const DEFAULT_SPREAD_PCT: f64 = 0.0001;

/// Named indicator values handed to the oracle, keyed by indicator name.
///
/// Deterministic iteration (BTreeMap) so serialized feature rows are stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFeatures {
    values: BTreeMap<String, f64>,
}

impl MarketFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_iter<I, K>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Guard the arithmetic downstream of this row:
    ///
    /// - every non-finite value clamps to 0;
    /// - an `atr` beyond any plausible magnitude clamps to 0;
    /// - `spread_pct` is derived from `spread`/`close` when absent, with a
    ///   small safe default when that is impossible.
    pub fn sanitized(mut self) -> Self {
        for v in self.values.values_mut() {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        if let Some(atr) = self.values.get_mut("atr") {
            if atr.abs() > ABSURD_ATR {
                *atr = 0.0;
            }
        }

        if !self.values.contains_key("spread_pct") {
            let derived = match (self.get("spread"), self.get("close")) {
                (Some(spread), Some(close)) if close != 0.0 => spread / close,
                _ => DEFAULT_SPREAD_PCT,
            };
            self.values.insert("spread_pct".to_string(), derived);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_clamp_to_zero() {
        let f = MarketFeatures::from_iter([
            ("rsi", f64::NAN),
            ("macd", f64::NEG_INFINITY),
            ("close", 1.1),
        ])
        .sanitized();
        assert_eq!(f.get("rsi"), Some(0.0));
        assert_eq!(f.get("macd"), Some(0.0));
        assert_eq!(f.get("close"), Some(1.1));
    }

    #[test]
    fn absurd_atr_clamps_to_zero() {
        let f = MarketFeatures::from_iter([("atr", 5e4), ("close", 1.1)]).sanitized();
        assert_eq!(f.get("atr"), Some(0.0));
    }

    #[test]
    fn plausible_atr_is_kept() {
        let f = MarketFeatures::from_iter([("atr", 0.0042), ("close", 1.1)]).sanitized();
        assert_eq!(f.get("atr"), Some(0.0042));
    }

    #[test]
    fn spread_pct_derived_from_spread_and_close() {
        let f = MarketFeatures::from_iter([("spread", 0.0002), ("close", 1.0)]).sanitized();
        assert_eq!(f.get("spread_pct"), Some(0.0002));
    }

    #[test]
    fn spread_pct_falls_back_to_default() {
        let f = MarketFeatures::from_iter([("close", 0.0)]).sanitized();
        assert_eq!(f.get("spread_pct"), Some(DEFAULT_SPREAD_PCT));
    }

    #[test]
    fn existing_spread_pct_is_untouched() {
        let f = MarketFeatures::from_iter([("spread_pct", 0.00007)]).sanitized();
        assert_eq!(f.get("spread_pct"), Some(0.00007));
    }
}
