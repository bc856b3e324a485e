use super::{Session, ui};
use crate::core::cache::default_units;
use crate::core::catalog::find_unit;
use crate::core::format::{ERROR_TEXT, format_decimal};
use crate::core::history::{DEFAULT_HISTORY_DAYS, chart_pair};
use crate::core::{Category, HistoricalPoint, Unit, convert};
use anyhow::{Result, anyhow};
use futures::future::join;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

const SPARKLINE_WIDTH: usize = 40;

/// Parses a user supplied number. A decimal comma is accepted.
pub fn parse_value(text: &str) -> Result<Decimal> {
    let normalized = text.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| anyhow!("Invalid number: {}", text))
}

/// Formats the outcome of one conversion, e.g. `1000 m = 1 km`.
pub fn conversion_line(value: Decimal, from: &Unit, to: &Unit, decimal_places: u32) -> String {
    let lhs = format!("{} {}", format_decimal(value, decimal_places), from.symbol);
    match convert(value, from, to) {
        Ok(result) => format!(
            "{} = {}",
            lhs,
            ui::style_text(
                &format!("{} {}", format_decimal(result, decimal_places), to.symbol),
                ui::StyleType::Result
            )
        ),
        Err(e) => format!(
            "{} = {} {}",
            lhs,
            ui::style_text(ERROR_TEXT, ui::StyleType::Error),
            ui::style_text(&format!("({e})"), ui::StyleType::Subtle)
        ),
    }
}

/// Summarises a price series: range, change and a sparkline.
pub fn chart_summary(crypto: &str, quote: &str, points: &[HistoricalPoint], decimal_places: u32) -> Option<String> {
    let first = points.first()?;
    let last = points.last()?;
    let min = points.iter().map(|p| p.price).min()?;
    let max = points.iter().map(|p| p.price).max()?;

    let change = if first.price.is_zero() {
        None
    } else {
        ((last.price - first.price) / first.price * Decimal::ONE_HUNDRED).to_f64()
    };
    let values: Vec<f64> = points.iter().filter_map(|p| p.price.to_f64()).collect();

    let mut output = format!(
        "{} {} {} → {} ({})\n",
        ui::style_text(&format!("{crypto} in {quote}"), ui::StyleType::Title),
        ui::style_text(
            &format!("{}", first.timestamp.format("%Y-%m-%d")),
            ui::StyleType::Subtle
        ),
        format_decimal(first.price, decimal_places),
        format_decimal(last.price, decimal_places),
        change.map_or("N/A".to_string(), |c| format!("{c:+.2}%")),
    );
    output.push_str(&format!(
        "{}  min {} max {}",
        ui::sparkline(&values, SPARKLINE_WIDTH),
        format_decimal(min, decimal_places),
        format_decimal(max, decimal_places),
    ));
    Some(output)
}

pub async fn run(
    session: &Session,
    value: Decimal,
    from: &str,
    to: &str,
    category: Option<Category>,
) -> Result<()> {
    // The chart only depends on the symbols, so it is fetched while prices load.
    let placeholders = default_units();
    let chart = match (find_unit(&placeholders, from), find_unit(&placeholders, to)) {
        (Some(f), Some(t)) if category.is_none_or(|c| c == Category::Crypto) => chart_pair(f, t),
        _ => None,
    };
    let history = async {
        match chart {
            Some((crypto, quote)) if !session.offline => {
                session
                    .history
                    .get_history(crypto, quote, DEFAULT_HISTORY_DAYS)
                    .await
            }
            _ => vec![],
        }
    };

    let (pair, history) = join(session.resolve_pair(from, to, category), history).await;
    let (from_unit, to_unit) = pair?;

    println!(
        "{}",
        conversion_line(value, &from_unit, &to_unit, session.decimal_places)
    );

    if let Some((crypto, quote)) = chart
        && let Some(summary) = chart_summary(
            &crypto.symbol,
            &quote.symbol,
            &history,
            session.decimal_places,
        )
    {
        println!("\n{summary}");
    }

    Ok(())
}
