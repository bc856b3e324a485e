use super::convert::chart_summary;
use super::{Session, ui};
use crate::core::cache::default_units;
use crate::core::catalog::find_unit;
use crate::core::format::format_decimal;
use crate::core::{Coin, Fiat, HistoricalPoint, Unit};
use anyhow::{Result, anyhow};
use comfy_table::Cell;

pub fn history_table(points: &[HistoricalPoint], decimal_places: u32) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Time (UTC)"), ui::header_cell("Price")]);
    for point in points {
        table.add_row(vec![
            Cell::new(point.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            ui::number_cell(&format_decimal(point.price, decimal_places)),
        ]);
    }
    table.to_string()
}

/// Units describing a coin and its quote currency; only the symbols matter.
fn history_units(coin: Coin, fiat: &str) -> Result<(Unit, Unit)> {
    let units = default_units();
    let crypto = find_unit(&units, coin.symbol())
        .cloned()
        .ok_or_else(|| anyhow!("Unknown coin: {}", coin))?;
    let quote = Fiat::from_symbol_or_usd(fiat);
    let quote = find_unit(&units, quote.symbol())
        .cloned()
        .ok_or_else(|| anyhow!("Unknown currency: {}", fiat))?;
    Ok((crypto, quote))
}

pub async fn run(session: &Session, coin: Coin, fiat: &str, days: u32) -> Result<()> {
    if session.offline {
        println!(
            "{}",
            ui::style_text("Price history is not available offline", ui::StyleType::Warning)
        );
        return Ok(());
    }

    let (crypto, quote) = history_units(coin, fiat)?;
    let pb = ui::new_spinner("Fetching price history...");
    let points = session.history.get_history(&crypto, &quote, days).await;
    pb.finish_and_clear();

    match chart_summary(&crypto.symbol, &quote.symbol, &points, session.decimal_places) {
        Some(summary) => {
            println!("{}\n", history_table(&points, session.decimal_places));
            println!("{summary}");
        }
        None => println!(
            "{}",
            ui::style_text("No price history available", ui::StyleType::Warning)
        ),
    }
    Ok(())
}
