use super::{Session, ui};
use crate::core::cache::CryptoPriceSnapshot;
use crate::core::catalog::units_for;
use crate::core::format::format_decimal;
use crate::core::{Category, Unit};
use anyhow::Result;
use comfy_table::Cell;

pub fn categories_table() -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Category"), ui::header_cell("Units")]);

    for category in Category::ALL {
        let units = match category {
            Category::Crypto => "live prices".to_string(),
            _ => units_for(category)
                .iter()
                .map(|u| u.symbol.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        table.add_row(vec![Cell::new(category.name()), Cell::new(units)]);
    }

    table.to_string()
}

/// Table of units in catalog order. Crypto factors are USD prices.
pub fn units_table(category: Category, units: &[Unit], decimal_places: u32) -> String {
    let factor_header = match category {
        Category::Crypto => "Price (USD)".to_string(),
        Category::Temperature => "Formula".to_string(),
        _ => format!("In {}", units.first().map_or("base", |u| u.symbol.as_str())),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Unit"),
        ui::header_cell(&factor_header),
    ]);

    for unit in units {
        let factor = match category {
            Category::Temperature => "via °C".to_string(),
            _ => format_decimal(unit.to_base, decimal_places.max(12)),
        };
        table.add_row(vec![
            Cell::new(unit.label()),
            ui::number_cell(&factor),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(category.name(), ui::StyleType::Title),
        table
    )
}

/// One line describing where crypto prices came from.
pub fn rates_footer(snapshot: Option<&CryptoPriceSnapshot>) -> String {
    let text = match snapshot {
        Some(s) => format!(
            "Prices from {} ({}s ago), refreshed at most once a minute",
            s.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
            s.age().as_secs()
        ),
        None => "Default prices, no live data".to_string(),
    };
    ui::style_text(&text, ui::StyleType::Subtle)
}

pub fn list_categories() {
    println!("{}", categories_table());
}

pub async fn run(session: &Session, category: Category) -> Result<()> {
    let units = session.units(category).await?;
    println!(
        "{}",
        units_table(category, &units, session.decimal_places)
    );
    if category == Category::Crypto {
        let snapshot = session.cache.snapshot().await;
        println!("\n{}", rates_footer(snapshot.as_deref()));
    }
    Ok(())
}
