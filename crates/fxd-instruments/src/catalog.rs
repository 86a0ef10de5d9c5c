use std::collections::BTreeMap;

use crate::types::{LotLimits, DEFAULT_LOT_LIMITS};

/// Errors an [`InstrumentCatalog`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The symbol is not known to this catalog.
    UnknownSymbol { symbol: String },
    /// The backing metadata source could not be reached.
    Unavailable { detail: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSymbol { symbol } => write!(f, "unknown symbol '{symbol}'"),
            Self::Unavailable { detail } => write!(f, "instrument catalog unavailable: {detail}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Lookup boundary for per-symbol lot limits.
///
/// Implementations must be object-safe; callers hold `&dyn InstrumentCatalog`
/// and never assume a concrete metadata source.
pub trait InstrumentCatalog {
    fn lot_limits(&self, symbol: &str) -> Result<LotLimits, CatalogError>;
}

/// Lot limits for a symbol, falling back to [`DEFAULT_LOT_LIMITS`] when the
/// lookup fails. Metadata being unavailable never stops the order path.
pub fn lot_limits_or_default(catalog: &dyn InstrumentCatalog, symbol: &str) -> LotLimits {
    catalog.lot_limits(symbol).unwrap_or(DEFAULT_LOT_LIMITS)
}

/// Fixed in-memory catalog. Deterministic; backs tests and the paper setup.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    limits: BTreeMap<String, LotLimits>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, limits: LotLimits) -> Self {
        self.limits.insert(symbol.into(), limits);
        self
    }
}

impl InstrumentCatalog for StaticCatalog {
    fn lot_limits(&self, symbol: &str) -> Result<LotLimits, CatalogError> {
        self.limits
            .get(symbol)
            .copied()
            .ok_or_else(|| CatalogError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_catalog_returns_registered_limits() {
        let cat = StaticCatalog::new().with_symbol("EURUSD", LotLimits::new(0.01, 50.0, 0.01));
        assert_eq!(
            cat.lot_limits("EURUSD").unwrap(),
            LotLimits::new(0.01, 50.0, 0.01)
        );
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let cat = StaticCatalog::new();
        assert_eq!(
            cat.lot_limits("EURUSD"),
            Err(CatalogError::UnknownSymbol {
                symbol: "EURUSD".to_string()
            })
        );
    }

    #[test]
    fn fallback_helper_uses_defaults_on_miss() {
        let cat = StaticCatalog::new();
        assert_eq!(lot_limits_or_default(&cat, "GBPUSD"), DEFAULT_LOT_LIMITS);
    }
}
