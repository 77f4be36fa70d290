//! Simulated portfolio served at `GET /trading`
//!
//! Static paper-trading numbers. Nothing here is persisted or mutable; the
//! document is rebuilt on every request.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: &'static str,
    pub name: &'static str,
    pub shares: u32,
    pub avg_cost: f64,
    pub price: f64,
    pub market_value: f64,
    pub gain: f64,
    pub gain_pct: f64,
}

impl Position {
    fn new(symbol: &'static str, name: &'static str, shares: u32, avg_cost: f64, price: f64) -> Self {
        let cost = round2(avg_cost * f64::from(shares));
        let market_value = round2(price * f64::from(shares));
        let gain = round2(market_value - cost);
        let gain_pct = if cost > 0.0 { round2(gain / cost * 100.0) } else { 0.0 };
        Self {
            symbol,
            name,
            shares,
            avg_cost,
            price,
            market_value,
            gain,
            gain_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub date: &'static str,
    pub symbol: &'static str,
    pub side: &'static str,
    pub shares: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub simulated: bool,
    pub as_of: &'static str,
    pub cash: f64,
    pub positions: Vec<Position>,
    pub recent_trades: Vec<Trade>,
    pub invested: f64,
    pub total_value: f64,
    pub total_gain: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The paper portfolio shown on the trading page
pub fn portfolio() -> Portfolio {
    let positions = vec![
        Position::new("VTI", "Vanguard Total Stock Market ETF", 40, 221.35, 248.10),
        Position::new("AAPL", "Apple Inc.", 15, 172.50, 189.84),
        Position::new("MSFT", "Microsoft Corp.", 10, 402.10, 415.26),
        Position::new("TSLA", "Tesla Inc.", 8, 251.00, 219.57),
    ];
    let recent_trades = vec![
        Trade { date: "2025-01-14", symbol: "TSLA", side: "buy", shares: 3, price: 224.10 },
        Trade { date: "2025-01-10", symbol: "AAPL", side: "sell", shares: 5, price: 186.20 },
        Trade { date: "2025-01-06", symbol: "VTI", side: "buy", shares: 10, price: 244.75 },
    ];

    let cash = 2_450.00;
    let invested = round2(positions.iter().map(|p| p.market_value).sum());
    let total_gain = round2(positions.iter().map(|p| p.gain).sum());

    Portfolio {
        simulated: true,
        as_of: "2025-01-15",
        cash,
        invested,
        total_value: round2(cash + invested),
        total_gain,
        positions,
        recent_trades,
    }
}
