//! Turns an investment amount, a set of strategy baskets and a price map into
//! whole-share positions.
//!
//! Allocation runs in two passes. [`equal_weight_pass`] splits the amount
//! evenly across baskets and then evenly across each basket's tickers, buying
//! as many whole shares as each slice affords. [`spend_leftover`] then
//! repeatedly buys the most expensive ticker that the remaining cash still
//! covers. Tickers without a usable price are skipped in both passes. Their
//! budget simply falls through to the leftover pass.

use crate::core::price::PriceMap;
use crate::core::strategy::{Basket, StrategySelection};
use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

/// A validated request for a portfolio suggestion.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub amount: f64,
    pub selection: StrategySelection,
}

impl AllocationRequest {
    pub fn new(amount: f64, selection: StrategySelection, min_amount: f64) -> Result<Self> {
        if !amount.is_finite() || amount < min_amount {
            bail!("Investment amount must be at least {min_amount:.2} (got {amount:.2})");
        }
        Ok(Self { amount, selection })
    }
}

/// Cash earmarked for one ticker of one basket.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerBudget {
    pub strategy: String,
    pub ticker: String,
    pub budget: f64,
}

/// Shares held for one ticker on behalf of one basket.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub strategy: String,
    pub ticker: String,
    pub shares: u64,
}

/// Positions after a pass, in basket/ticker order, and the cash they cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchases {
    pub positions: Vec<Position>,
    pub invested: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub strategy: String,
    pub ticker: String,
    pub price: Option<f64>,
    pub shares: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub total_amount: f64,
    pub rows: Vec<AllocationRow>,
    pub total_invested: f64,
    pub leftover_cash: f64,
    pub prices: PriceMap,
}

impl Allocation {
    /// Summed cost per strategy, in selection order.
    pub fn strategy_totals(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = Vec::new();
        for row in &self.rows {
            match totals.iter_mut().find(|(name, _)| *name == row.strategy) {
                Some((_, total)) => *total += row.cost,
                None => totals.push((row.strategy.clone(), row.cost)),
            }
        }
        totals
    }

    /// True when no share could be bought at all.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.shares == 0)
    }
}

/// Splits `total_amount` evenly across baskets, then evenly across the
/// tickers of each basket.
pub fn split_budget(total_amount: f64, baskets: &[Basket]) -> Result<Vec<TickerBudget>> {
    if baskets.is_empty() {
        bail!("Cannot allocate without at least one strategy");
    }
    if !total_amount.is_finite() || total_amount <= 0.0 {
        bail!("Investment amount must be positive (got {total_amount})");
    }
    if let Some(empty) = baskets.iter().find(|b| b.tickers.is_empty()) {
        bail!("Strategy has no tickers: {}", empty.strategy);
    }

    let per_basket = total_amount / baskets.len() as f64;
    Ok(baskets
        .iter()
        .flat_map(|basket| {
            let per_ticker = per_basket / basket.tickers.len() as f64;
            basket.tickers.iter().map(move |ticker| TickerBudget {
                strategy: basket.strategy.clone(),
                ticker: ticker.clone(),
                budget: per_ticker,
            })
        })
        .collect())
}

/// First pass: buys `floor(budget / price)` shares for every priced budget.
pub fn equal_weight_pass(budgets: &[TickerBudget], prices: &PriceMap) -> Purchases {
    let mut invested = 0.0;
    let positions = budgets
        .iter()
        .map(|b| {
            let shares = match prices.price(&b.ticker) {
                Some(price) => {
                    let shares = (b.budget / price).floor() as u64;
                    invested += shares as f64 * price;
                    shares
                }
                None => 0,
            };
            Position {
                strategy: b.strategy.clone(),
                ticker: b.ticker.clone(),
                shares,
            }
        })
        .collect();

    Purchases {
        positions,
        invested,
    }
}

/// Second pass: while any priced ticker costs no more than the uninvested
/// cash, buys the most expensive of them.
///
/// Ties go to the ticker met first in position order. A ticker held by more
/// than one basket is credited to its first position. The winner stays the
/// most expensive affordable ticker until it is no longer affordable, so its
/// shares are bought in one step.
pub fn spend_leftover(purchases: &Purchases, total_amount: f64, prices: &PriceMap) -> Purchases {
    let mut result = purchases.clone();

    // First position index for every distinct priced ticker.
    let mut candidates: Vec<(usize, f64)> = Vec::new();
    for (idx, position) in result.positions.iter().enumerate() {
        let seen = candidates
            .iter()
            .any(|(i, _)| result.positions[*i].ticker == position.ticker);
        if let (false, Some(price)) = (seen, prices.price(&position.ticker)) {
            candidates.push((idx, price));
        }
    }

    loop {
        let leftover = total_amount - result.invested;
        let best = candidates
            .iter()
            .filter(|(_, price)| *price <= leftover)
            .fold(None, |best: Option<(usize, f64)>, &(idx, price)| match best {
                Some((_, best_price)) if best_price >= price => best,
                _ => Some((idx, price)),
            });
        let Some((idx, price)) = best else {
            break;
        };

        let mut shares = (leftover / price).floor();
        if shares * price > leftover {
            shares -= 1.0;
        }
        let shares = shares.max(1.0);

        debug!(
            ticker = %result.positions[idx].ticker,
            shares,
            price,
            leftover,
            "Spending leftover cash"
        );
        result.positions[idx].shares += shares as u64;
        result.invested += shares * price;
    }

    result
}

/// Builds the suggested portfolio for `baskets` from `prices`.
///
/// Fails only on unusable input: no baskets, an empty basket, or a
/// non-positive amount. Missing prices never fail the build.
pub fn build_portfolio(
    total_amount: f64,
    baskets: &[Basket],
    prices: &PriceMap,
) -> Result<Allocation> {
    let budgets = split_budget(total_amount, baskets)?;
    let first_pass = equal_weight_pass(&budgets, prices);
    debug!(
        invested = first_pass.invested,
        leftover = total_amount - first_pass.invested,
        "Equal weight pass done"
    );
    let purchases = spend_leftover(&first_pass, total_amount, prices);

    let rows = purchases
        .positions
        .into_iter()
        .map(|position| {
            let price = prices.price(&position.ticker);
            let cost = price.map_or(0.0, |p| position.shares as f64 * p);
            AllocationRow {
                strategy: position.strategy,
                ticker: position.ticker,
                price,
                shares: position.shares,
                cost,
            }
        })
        .collect();

    Ok(Allocation {
        total_amount,
        rows,
        total_invested: purchases.invested,
        leftover_cash: total_amount - purchases.invested,
        prices: prices.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strategy::Strategy;

    const EPSILON: f64 = 1e-6;

    fn prices(entries: &[(&str, Option<f64>)]) -> PriceMap {
        entries.iter().map(|(t, p)| (*t, *p)).collect()
    }

    fn basket(strategy: &str, tickers: &[&str]) -> Basket {
        Basket {
            strategy: strategy.to_string(),
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn row<'a>(allocation: &'a Allocation, ticker: &str) -> &'a AllocationRow {
        allocation
            .rows
            .iter()
            .find(|r| r.ticker == ticker)
            .unwrap_or_else(|| panic!("no row for {ticker}"))
    }

    fn assert_invariants(allocation: &Allocation) {
        assert!(
            (allocation.total_invested + allocation.leftover_cash - allocation.total_amount).abs()
                < EPSILON
        );
        let row_total: f64 = allocation.rows.iter().map(|r| r.cost).sum();
        assert!((row_total - allocation.total_invested).abs() < EPSILON);
        for r in &allocation.rows {
            match r.price {
                Some(price) => assert!((r.cost - r.shares as f64 * price).abs() < EPSILON),
                None => {
                    assert_eq!(r.shares, 0);
                    assert_eq!(r.cost, 0.0);
                }
            }
        }
        // Nothing affordable is left behind.
        for (_, price) in allocation.prices.iter() {
            if let Some(price) = price {
                assert!(price > allocation.leftover_cash);
            }
        }
    }

    #[test]
    fn test_quality_scenario() {
        let prices = prices(&[
            ("MSFT", Some(300.0)),
            ("JNJ", Some(150.0)),
            ("PG", Some(150.0)),
        ]);
        let baskets = vec![Strategy::Quality.basket()];

        let budgets = split_budget(5000.0, &baskets).unwrap();
        assert_eq!(budgets.len(), 3);
        assert!((budgets[0].budget - 5000.0 / 3.0).abs() < EPSILON);

        let first = equal_weight_pass(&budgets, &prices);
        let shares: Vec<u64> = first.positions.iter().map(|p| p.shares).collect();
        assert_eq!(shares, vec![5, 11, 11]);
        assert_eq!(first.invested, 4800.0);

        let allocation = build_portfolio(5000.0, &baskets, &prices).unwrap();
        assert_eq!(row(&allocation, "MSFT").shares, 5);
        // 200 left only covers the 150 tickers; JNJ comes first.
        assert_eq!(row(&allocation, "JNJ").shares, 12);
        assert_eq!(row(&allocation, "PG").shares, 11);
        assert_eq!(allocation.total_invested, 4950.0);
        assert_eq!(allocation.leftover_cash, 50.0);
        assert_eq!(row(&allocation, "JNJ").cost, 1800.0);
        assert_invariants(&allocation);
    }

    #[test]
    fn test_leftover_prefers_most_expensive_affordable() {
        let prices = prices(&[("A", Some(40.0)), ("B", Some(70.0)), ("C", Some(25.0))]);
        let purchases = Purchases {
            positions: ["A", "B", "C"]
                .iter()
                .map(|t| Position {
                    strategy: "S".to_string(),
                    ticker: t.to_string(),
                    shares: 1,
                })
                .collect(),
            invested: 135.0,
        };

        let result = spend_leftover(&purchases, 300.0, &prices);
        // 165 left: two B (140), then 25 buys one C.
        let shares: Vec<u64> = result.positions.iter().map(|p| p.shares).collect();
        assert_eq!(shares, vec![1, 3, 2]);
        assert_eq!(result.invested, 300.0);
        // Input is left untouched.
        assert_eq!(purchases.invested, 135.0);
    }

    #[test]
    fn test_unpriced_strategy_budget_flows_to_leftover_pass() {
        let prices = prices(&[
            ("MSFT", Some(300.0)),
            ("JNJ", Some(150.0)),
            ("PG", Some(150.0)),
            ("AMZN", None),
            ("TSLA", None),
            ("NVDA", None),
        ]);
        let baskets = vec![Strategy::Quality.basket(), Strategy::Growth.basket()];

        let budgets = split_budget(10000.0, &baskets).unwrap();
        let first = equal_weight_pass(&budgets, &prices);
        let growth_invested: u64 = first
            .positions
            .iter()
            .filter(|p| p.strategy == "Growth Investing")
            .map(|p| p.shares)
            .sum();
        assert_eq!(growth_invested, 0);
        assert_eq!(first.invested, 4800.0);

        let allocation = build_portfolio(10000.0, &baskets, &prices).unwrap();
        // 5200 left buys 17 more MSFT, leaving 100.
        assert_eq!(row(&allocation, "MSFT").shares, 22);
        assert_eq!(row(&allocation, "JNJ").shares, 11);
        assert_eq!(row(&allocation, "PG").shares, 11);
        assert_eq!(allocation.total_invested, 9900.0);
        assert_eq!(allocation.leftover_cash, 100.0);
        assert_eq!(row(&allocation, "TSLA").price, None);
        assert_invariants(&allocation);
    }

    #[test]
    fn test_two_disjoint_strategies_reconcile() {
        let prices = prices(&[
            ("MSFT", Some(412.37)),
            ("JNJ", Some(151.02)),
            ("PG", Some(166.8)),
            ("BRK-B", Some(471.15)),
            ("VZ", Some(40.61)),
            ("INTC", Some(21.49)),
        ]);
        let selection = StrategySelection::parse(&["quality", "value"]).unwrap();

        let allocation = build_portfolio(10000.0, &selection.baskets(), &prices).unwrap();
        assert_eq!(allocation.rows.len(), 6);
        assert_eq!(allocation.rows[0].strategy, "Quality Investing");
        assert_eq!(allocation.rows[5].strategy, "Value Investing");
        assert_invariants(&allocation);

        let totals = allocation.strategy_totals();
        assert_eq!(totals.len(), 2);
        let summed: f64 = totals.iter().map(|(_, t)| t).sum();
        assert!((summed + allocation.leftover_cash - 10000.0).abs() < EPSILON);
    }

    #[test]
    fn test_missing_and_invalid_prices_degrade() {
        let prices = prices(&[("MSFT", Some(300.0)), ("JNJ", Some(-1.0))]);
        let allocation = build_portfolio(5000.0, &[Strategy::Quality.basket()], &prices).unwrap();

        assert_eq!(row(&allocation, "JNJ").price, None);
        assert_eq!(row(&allocation, "JNJ").shares, 0);
        // PG was never fetched at all.
        assert_eq!(row(&allocation, "PG").price, None);
        assert_eq!(row(&allocation, "MSFT").shares, 16);
        assert_invariants(&allocation);
    }

    #[test]
    fn test_nothing_priced_invests_nothing() {
        let allocation =
            build_portfolio(5000.0, &[Strategy::Index.basket()], &PriceMap::new()).unwrap();
        assert!(allocation.is_empty());
        assert_eq!(allocation.total_invested, 0.0);
        assert_eq!(allocation.leftover_cash, 5000.0);
        assert_eq!(allocation.rows.len(), 3);
    }

    #[test]
    fn test_shared_ticker_is_not_double_counted() {
        let baskets = vec![
            basket("First", &["AAA", "BBB", "CCC"]),
            basket("Second", &["AAA", "DDD", "EEE"]),
        ];
        let prices = prices(&[
            ("AAA", Some(100.0)),
            ("BBB", Some(30.0)),
            ("CCC", Some(45.0)),
            ("DDD", Some(60.0)),
            ("EEE", Some(7.0)),
        ]);

        let allocation = build_portfolio(6000.0, &baskets, &prices).unwrap();
        assert_eq!(allocation.rows.len(), 6);
        let aaa_rows: Vec<u64> = allocation
            .rows
            .iter()
            .filter(|r| r.ticker == "AAA")
            .map(|r| r.shares)
            .collect();
        // Each basket bought 10 with its own 1000; leftover cannot afford AAA.
        assert_eq!(aaa_rows, vec![10, 10]);
        assert_eq!(allocation.total_invested, 5994.0);
        assert_invariants(&allocation);
    }

    #[test]
    fn test_rejects_unusable_input() {
        let prices = PriceMap::new();
        let err = build_portfolio(5000.0, &[], &prices).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot allocate without at least one strategy"
        );

        assert!(build_portfolio(0.0, &[Strategy::Value.basket()], &prices).is_err());
        assert!(build_portfolio(f64::NAN, &[Strategy::Value.basket()], &prices).is_err());

        let err = build_portfolio(5000.0, &[basket("Empty", &[])], &prices).unwrap_err();
        assert_eq!(err.to_string(), "Strategy has no tickers: Empty");
    }

    #[test]
    fn test_request_enforces_minimum_amount() {
        let selection = StrategySelection::parse(&["growth"]).unwrap();
        let err = AllocationRequest::new(4999.0, selection.clone(), 5000.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Investment amount must be at least 5000.00 (got 4999.00)"
        );

        let request = AllocationRequest::new(5000.0, selection, 5000.0).unwrap();
        assert_eq!(request.amount, 5000.0);
    }
}
