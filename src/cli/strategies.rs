use super::ui;
use crate::core::strategy::Strategy;
use comfy_table::Cell;

pub fn run() {
    println!("{}", display_strategies());
}

/// Lists every catalog strategy with its tickers.
pub fn display_strategies() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Strategy"),
        ui::header_cell("Key"),
        ui::header_cell("Tickers"),
    ]);
    for strategy in Strategy::ALL {
        let key = strategy.name().to_lowercase().replace(' ', "-");
        table.add_row(vec![
            Cell::new(strategy.name()),
            Cell::new(ui::style_text(&key, ui::StyleType::Subtle)),
            Cell::new(strategy.tickers().join(", ")),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_whole_catalog() {
        let output = display_strategies();
        for strategy in Strategy::ALL {
            assert!(output.contains(strategy.name()));
        }
        assert!(output.contains("BRK-B, VZ, INTC"));
        assert!(output.contains("quality-investing"));
    }
}
