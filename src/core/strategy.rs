//! The fixed catalog of investment strategies and validated selections.

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Upper bound on strategies combined into one suggestion.
pub const MAX_STRATEGIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Strategy {
    Ethical,
    Growth,
    Index,
    Quality,
    Value,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Ethical,
        Strategy::Growth,
        Strategy::Index,
        Strategy::Quality,
        Strategy::Value,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Ethical => "Ethical Investing",
            Strategy::Growth => "Growth Investing",
            Strategy::Index => "Index Investing",
            Strategy::Quality => "Quality Investing",
            Strategy::Value => "Value Investing",
        }
    }

    /// Ticker basket backing the strategy, in allocation order.
    pub fn tickers(&self) -> [&'static str; 3] {
        match self {
            Strategy::Ethical => ["AAPL", "ADBE", "NSRGY"],
            Strategy::Growth => ["AMZN", "TSLA", "NVDA"],
            Strategy::Index => ["VTI", "IXUS", "ILTB"],
            Strategy::Quality => ["MSFT", "JNJ", "PG"],
            Strategy::Value => ["BRK-B", "VZ", "INTC"],
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Strategy::Ethical => "ethical",
            Strategy::Growth => "growth",
            Strategy::Index => "index",
            Strategy::Quality => "quality",
            Strategy::Value => "value",
        }
    }

    pub fn basket(&self) -> Basket {
        Basket {
            strategy: self.name().to_string(),
            tickers: self.tickers().iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    /// Accepts "Quality Investing", "quality-investing" or "quality", in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        let key = normalized
            .strip_suffix(" investing")
            .unwrap_or(&normalized)
            .trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.key() == key)
            .ok_or_else(|| anyhow!("Unknown strategy: {}", s))
    }
}

/// A named set of tickers that shares one slice of the investment amount.
///
/// The allocation engine works on baskets rather than catalog entries so it
/// stays independent of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub strategy: String,
    pub tickers: Vec<String>,
}

/// One or two distinct catalog strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySelection(Vec<Strategy>);

impl StrategySelection {
    pub fn new(strategies: Vec<Strategy>) -> Result<Self> {
        if strategies.is_empty() {
            bail!("Please select at least one strategy");
        }
        if strategies.len() > MAX_STRATEGIES {
            bail!(
                "Please select at most {} strategies (got {})",
                MAX_STRATEGIES,
                strategies.len()
            );
        }
        for (i, strategy) in strategies.iter().enumerate() {
            if strategies[..i].contains(strategy) {
                bail!("Strategy selected more than once: {}", strategy);
            }
        }
        Ok(Self(strategies))
    }

    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let strategies = names
            .iter()
            .map(|name| name.as_ref().parse::<Strategy>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(strategies)
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.0
    }

    pub fn baskets(&self) -> Vec<Basket> {
        self.0.iter().map(Strategy::basket).collect()
    }

    /// Distinct tickers across the selection, first occurrence first.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = Vec::new();
        for ticker in self.0.iter().flat_map(|s| s.tickers()) {
            if !tickers.iter().any(|t| t == ticker) {
                tickers.push(ticker.to_string());
            }
        }
        tickers
    }
}
