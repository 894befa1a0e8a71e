use super::ui;
use crate::collector::RateCollector;
use anyhow::Result;
use comfy_table::Cell;

/// Runs one collection cycle and prints the readings. Meant for cron as
/// much as for humans; the exit code stays zero even when sources
/// degraded, matching the collection contract.
pub async fn run(collector: &RateCollector) -> Result<()> {
    let outcome = collector.collect().await;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Source"),
        ui::header_cell("Buy"),
        ui::header_cell("Sell"),
    ]);

    for reading in &outcome.reading.rates {
        table.add_row(vec![
            Cell::new(&reading.name),
            ui::format_optional_cell(reading.rate, |r| format!("{r:.4}")),
            ui::format_optional_cell(reading.sell_rate, |r| format!("{r:.4}")),
        ]);
    }

    println!(
        "{}",
        ui::style_text(
            &format!("{} at {}", outcome.reading.pair, outcome.reading.date),
            ui::StyleType::Title
        )
    );
    println!("{table}");

    if outcome.persisted.is_err() {
        println!(
            "{}",
            ui::style_text(
                "warning: the reading was not persisted",
                ui::StyleType::Error
            )
        );
    }

    Ok(())
}
