use serde::{Deserialize, Serialize};

/// Fixed pip value: 10 currency units per standard lot per pip.
///
/// The quote currency is assumed to be the account currency, so the value is
/// constant rather than derived from the current price.
pub const PIP_VALUE_PER_LOT: f64 = 10.0;

/// Broker defaults used when a symbol lookup fails.
pub const DEFAULT_LOT_LIMITS: LotLimits = LotLimits {
    min_lot: 0.01,
    max_lot: 100.0,
    lot_step: 0.01,
};

/// Pip size for a quoted symbol: 0.01 for JPY-quoted pairs, else 0.0001.
pub fn pip_size(symbol: &str) -> f64 {
    if symbol.ends_with("JPY") {
        0.01
    } else {
        0.0001
    }
}

/// The volume grid a broker accepts for one symbol.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LotLimits {
    /// Smallest tradable volume in lots.
    pub min_lot: f64,
    /// Largest tradable volume in lots.
    pub max_lot: f64,
    /// Volume increment in lots.
    pub lot_step: f64,
}

impl LotLimits {
    pub fn new(min_lot: f64, max_lot: f64, lot_step: f64) -> Self {
        Self {
            min_lot,
            max_lot,
            lot_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpy_quoted_pairs_use_hundredth_pip() {
        assert_eq!(pip_size("USDJPY"), 0.01);
        assert_eq!(pip_size("EURJPY"), 0.01);
    }

    #[test]
    fn non_jpy_pairs_use_ten_thousandth_pip() {
        assert_eq!(pip_size("EURUSD"), 0.0001);
        assert_eq!(pip_size("GBPCHF"), 0.0001);
    }

    #[test]
    fn default_limits_match_broker_fallback() {
        assert_eq!(DEFAULT_LOT_LIMITS.min_lot, 0.01);
        assert_eq!(DEFAULT_LOT_LIMITS.max_lot, 100.0);
        assert_eq!(DEFAULT_LOT_LIMITS.lot_step, 0.01);
    }
}
