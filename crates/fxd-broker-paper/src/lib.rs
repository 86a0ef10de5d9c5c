//! Deterministic in-memory "paper" order router.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - order ids are derived from a sequence counter and the request inputs:
//!   `paper:{seq}:{symbol}:{side}` — no randomness, no timestamps;
//! - every fill happens at the requested price;
//! - an entry whose notional cost exceeds available cash is declined with
//!   `Ok(None)` (a null order result), never an error;
//! - exits always fill: the venue cannot refuse to give a position back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fxd_execution::{MarketOrder, OrderReceipt, OrderRouter, OrderSide, RouteError};

/// One routed order, as remembered by the paper venue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaperOrder {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub size_lots: f64,
    pub price: f64,
    /// false for entries that were declined for insufficient cash.
    pub filled: bool,
}

/// In-memory venue: a cash balance and an append-only order log.
#[derive(Clone, Debug)]
pub struct PaperBroker {
    cash: f64,
    seq: u64,
    orders: BTreeMap<String, PaperOrder>,
}

impl PaperBroker {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            seq: 0,
            orders: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Deterministic listing: BTreeMap iteration order is stable.
    pub fn orders(&self) -> Vec<PaperOrder> {
        self.orders.values().cloned().collect()
    }

    fn next_order_id(&mut self, order: &MarketOrder) -> String {
        self.seq += 1;
        format!("paper:{}:{}:{}", self.seq, order.symbol, order.side.as_str())
    }

    fn record(&mut self, order: &MarketOrder, order_id: String, filled: bool) {
        self.orders.insert(
            order_id.clone(),
            PaperOrder {
                order_id,
                symbol: order.symbol.clone(),
                side: order.side,
                size_lots: order.size_lots,
                price: order.price,
                filled,
            },
        );
    }
}

impl OrderRouter for PaperBroker {
    fn market_entry(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError> {
        let order_id = self.next_order_id(order);
        let cost = order.size_lots * order.price;

        if cost > self.cash {
            self.record(order, order_id, false);
            return Ok(None);
        }

        self.cash -= cost;
        self.record(order, order_id.clone(), true);
        Ok(Some(OrderReceipt {
            order_id,
            fill_price: order.price,
            size_lots: order.size_lots,
        }))
    }

    fn market_exit(&mut self, order: &MarketOrder) -> Result<Option<OrderReceipt>, RouteError> {
        let order_id = self.next_order_id(order);
        self.cash += order.size_lots * order.price;
        self.record(order, order_id.clone(), true);
        Ok(Some(OrderReceipt {
            order_id,
            fill_price: order.price,
            size_lots: order.size_lots,
        }))
    }
}
