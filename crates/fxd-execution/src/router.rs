use serde::{Deserialize, Serialize};

/// Side of a market order, from the broker's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// A market order request as handed to a router.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub size_lots: f64,
    /// Price observed when the order was raised; routers may fill elsewhere.
    pub price: f64,
}

/// Confirmation of a filled order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub fill_price: f64,
    pub size_lots: f64,
}

/// Transport-level routing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    Unavailable { detail: String },
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { detail } => write!(f, "order route unavailable: {detail}"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Boundary between the executor and whatever fills orders.
///
/// `Ok(None)` means the venue declined the order (insufficient funds, volume
/// off-limits, broker reject). The executor mutates no position or risk state
/// on `Ok(None)` or `Err` — an order that did not execute leaves the book
/// exactly as it was.
pub trait OrderRouter {
    fn market_entry(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError>;
    fn market_exit(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError>;
}

/// Router for replay runs: every order fills immediately at the requested
/// price. Order ids are derived from a sequence counter — no randomness.
#[derive(Clone, Debug, Default)]
pub struct ImmediateFill {
    seq: u64,
}

impl ImmediateFill {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(&mut self, order: &MarketOrder) -> OrderReceipt {
        self.seq += 1;
        OrderReceipt {
            order_id: format!("sim:{}:{}:{}", self.seq, order.symbol, order.side.as_str()),
            fill_price: order.price,
            size_lots: order.size_lots,
        }
    }
}

impl OrderRouter for ImmediateFill {
    fn market_entry(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError> {
        Ok(Some(self.fill(order)))
    }

    fn market_exit(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError> {
        Ok(Some(self.fill(order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_fill_fills_at_requested_price_with_stable_ids() {
        let mut router = ImmediateFill::new();
        let order = MarketOrder {
            symbol: "EURUSD".to_string(),
            side: OrderSide::Buy,
            size_lots: 0.1,
            price: 1.1,
        };
        let first = router.market_entry(&order).unwrap().unwrap();
        let second = router.market_exit(&order).unwrap().unwrap();
        assert_eq!(first.fill_price, 1.1);
        assert_eq!(first.order_id, "sim:1:EURUSD:buy");
        assert_eq!(second.order_id, "sim:2:EURUSD:buy");
    }
}
