use super::{history, ui};
use crate::core::allocation::{Allocation, AllocationRequest, build_portfolio};
use crate::core::history::{HistoryRecord, HistoryStore, HistoryTracker};
use crate::core::price::{PriceProvider, fetch_prices};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct SuggestionReport<'a> {
    allocation: &'a Allocation,
    history: &'a [HistoryRecord],
}

/// Fetches prices, builds the allocation, records its value in the history
/// and prints both.
pub async fn run<S: HistoryStore, R: Rng>(
    request: &AllocationRequest,
    provider: &(dyn PriceProvider + Send + Sync),
    tracker: &mut HistoryTracker<S, R>,
    currency: &str,
    json: bool,
) -> Result<()> {
    let allocation = suggest(request, provider).await?;

    let history = match tracker.record_value(allocation.total_invested) {
        Ok(window) => window,
        Err(e) => {
            warn!(error = %e, "Could not save history");
            tracker.window()
        }
    };

    if json {
        let report = SuggestionReport {
            allocation: &allocation,
            history: &history,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", display_allocation(request, &allocation, currency));
    ui::print_separator();
    println!("{}", history::display_history(&history, currency));
    Ok(())
}

/// Fetches prices for the selection and builds the allocation.
pub async fn suggest(
    request: &AllocationRequest,
    provider: &(dyn PriceProvider + Send + Sync),
) -> Result<Allocation> {
    let tickers = request.selection.tickers();

    let pb = ui::new_progress_bar(tickers.len() as u64, true);
    pb.set_message("Fetching prices...");
    let prices = fetch_prices(provider, &tickers, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    let allocation = build_portfolio(request.amount, &request.selection.baskets(), &prices)
        .context("Error while building portfolio")?;
    info!(
        invested = allocation.total_invested,
        leftover = allocation.leftover_cash,
        "Built portfolio"
    );
    Ok(allocation)
}

pub fn display_allocation(
    request: &AllocationRequest,
    allocation: &Allocation,
    currency: &str,
) -> String {
    let names: Vec<&str> = request
        .selection
        .strategies()
        .iter()
        .map(|s| s.name())
        .collect();
    let mut output = format!(
        "Suggested Portfolio: {}\n\n",
        ui::style_text(&names.join(" + "), ui::StyleType::Title)
    );

    if allocation.is_empty() {
        output.push_str(&ui::style_text(
            "No portfolio could be built (missing prices). Try again later.",
            ui::StyleType::Warning,
        ));
        output.push('\n');
    } else {
        output.push_str(&allocation_table(allocation, currency));
        output.push_str("\n\n");
        output.push_str(&strategy_table(allocation, currency));
        output.push('\n');
    }

    let unavailable = allocation.prices.unavailable();
    if !unavailable.is_empty() {
        output.push_str(&ui::style_text(
            &format!("\nPrices unavailable for: {}\n", unavailable.join(", ")),
            ui::StyleType::Warning,
        ));
    }

    for (label, value, style_type) in [
        (
            "Investment Amount",
            allocation.total_amount,
            ui::StyleType::TotalLabel,
        ),
        (
            "Total Invested Value",
            allocation.total_invested,
            ui::StyleType::TotalValue,
        ),
        (
            "Uninvested Cash",
            allocation.leftover_cash,
            ui::StyleType::Subtle,
        ),
    ] {
        output.push_str(&format!(
            "\n{} ({}): {}",
            ui::style_text(label, ui::StyleType::TotalLabel),
            currency,
            ui::style_text(&ui::format_amount(value), style_type)
        ));
    }

    output
}

fn allocation_table(allocation: &Allocation, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strategy"),
        ui::header_cell("Ticker"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell("Shares"),
        ui::header_cell(&format!("Cost ({currency})")),
    ]);

    for row in &allocation.rows {
        table.add_row(vec![
            Cell::new(&row.strategy),
            Cell::new(&row.ticker),
            ui::format_optional_cell(row.price, ui::format_amount),
            ui::number_cell(row.shares.to_string()),
            ui::number_cell(ui::format_amount(row.cost)),
        ]);
    }

    table.to_string()
}

fn strategy_table(allocation: &Allocation, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strategy"),
        ui::header_cell(&format!("Total Cost ({currency})")),
        ui::header_cell("Weight (%)"),
    ]);

    for (strategy, total) in allocation.strategy_totals() {
        let weight = (allocation.total_invested > 0.0)
            .then(|| total / allocation.total_invested * 100.0);
        table.add_row(vec![
            Cell::new(strategy),
            ui::number_cell(ui::format_amount(total)),
            ui::format_optional_cell(weight, |w| format!("{w:.2}%")),
        ]);
    }

    table.to_string()
}
