use super::ui;
use crate::core::history::{HistoryRecord, HistoryStore, HistoryTracker};
use anyhow::Result;
use comfy_table::{Cell, Color};
use rand::Rng;

const BAR_WIDTH: usize = 30;

/// Prints the stored window without recording a new value.
pub fn run<S: HistoryStore, R: Rng>(
    tracker: &HistoryTracker<S, R>,
    currency: &str,
    json: bool,
) -> Result<()> {
    let records = tracker.window();
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{}", display_history(&records, currency));
    }
    Ok(())
}

/// Renders the window as a table with a bar per day.
pub fn display_history(records: &[HistoryRecord], currency: &str) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text(
            &format!("{}-Day Portfolio Value Trend", records.len()),
            ui::StyleType::Title
        )
    );

    if records.is_empty() {
        output.push_str(&ui::style_text("No history yet.", ui::StyleType::Subtle));
        return output;
    }

    let min = records.iter().map(|r| r.value).fold(f64::INFINITY, f64::min);
    let max = records
        .iter()
        .map(|r| r.value)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("Trend"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d")),
            ui::number_cell(ui::format_amount(record.value)),
            Cell::new(ui::trend_bar(record.value, min, max, BAR_WIDTH)).fg(Color::Green),
        ]);
    }
    output.push_str(&table.to_string());

    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        if records.len() > 1 && first.value > 0.0 {
            let change = (last.value - first.value) / first.value * 100.0;
            output.push_str(&format!(
                "\n\nChange since {}: {}",
                first.date,
                ui::style_text(&format!("{change:+.2}%"), ui::StyleType::TotalValue)
            ));
        }
    }

    output
}
