use super::ui;
use crate::config::AppConfig;
use crate::store::HistoryStore;
use anyhow::Result;
use chrono::{Months, Utc};
use comfy_table::Cell;
use std::sync::Arc;

/// Prints the trailing-window history for a pair, one row per source
/// reading.
pub async fn run(
    store: Arc<dyn HistoryStore>,
    config: &AppConfig,
    pair: Option<String>,
) -> Result<()> {
    let pair = pair.unwrap_or_else(|| config.pair.clone());
    let end = Utc::now();
    let start = end
        .checked_sub_months(Months::new(config.history.window_months))
        .unwrap_or(end);

    let output = store.query(&pair, start, end).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Source"),
        ui::header_cell("Buy"),
        ui::header_cell("Sell"),
    ]);

    for record in &output.records {
        for reading in &record.rates {
            table.add_row(vec![
                Cell::new(record.date.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(&reading.name),
                ui::format_optional_cell(reading.rate, |r| format!("{r:.4}")),
                ui::format_optional_cell(reading.sell_rate, |r| format!("{r:.4}")),
            ]);
        }
    }

    println!("{}", ui::style_text(&pair, ui::StyleType::Title));
    println!("{table}");
    println!(
        "{}",
        ui::style_text(
            &format!(
                "{} records, {} read units",
                output.records.len(),
                output.read_units
            ),
            ui::StyleType::Subtle
        )
    );

    Ok(())
}
