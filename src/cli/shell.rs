//! Interactive session keeping one price cache alive between commands.

use super::convert::{chart_summary, conversion_line, parse_value};
use super::history::history_table;
use super::units::{rates_footer, units_table};
use super::{Session, is_crypto_symbol, ui};
use crate::core::cache::default_units;
use crate::core::catalog::{find_unit, resolve_symbol};
use crate::core::history::DEFAULT_HISTORY_DAYS;
use crate::core::{Category, Coin, Fiat, Unit};
use anyhow::{Result, anyhow, bail};
use rust_decimal::Decimal;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  <value> <from> to <to>        convert, e.g. `12 in to cm` or `0.5 BTC to PLN`
  units <category>              list units of a category
  rates                         show crypto prices
  refresh                       fetch fresh crypto prices
  history <coin> [fiat] [days]  show a coin's price history
  help                          show this help
  quit                          leave the shell";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Convert {
        value: Decimal,
        from: String,
        to: String,
    },
    Units(Category),
    Rates,
    Refresh,
    History {
        coin: Coin,
        fiat: String,
        days: u32,
    },
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ShellCommand> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(ShellCommand::Empty);
    };

    match first.to_lowercase().as_str() {
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        "rates" => Ok(ShellCommand::Rates),
        "refresh" => Ok(ShellCommand::Refresh),
        "units" => {
            let category = words
                .next()
                .ok_or_else(|| anyhow!("Usage: units <category>"))?;
            Ok(ShellCommand::Units(category.parse()?))
        }
        "history" => {
            let coin = words
                .next()
                .ok_or_else(|| anyhow!("Usage: history <coin> [fiat] [days]"))?
                .parse()?;
            let fiat = words.next().unwrap_or("USD").to_string();
            let days = match words.next() {
                Some(days) => days
                    .parse()
                    .map_err(|_| anyhow!("Invalid number of days: {}", days))?,
                None => DEFAULT_HISTORY_DAYS,
            };
            Ok(ShellCommand::History { coin, fiat, days })
        }
        _ => {
            let rest = line[first.len()..].trim();
            let Some((from, to)) = rest.split_once(" to ") else {
                bail!("Unknown command. Type `help` for usage");
            };
            Ok(ShellCommand::Convert {
                value: parse_value(first)?,
                from: from.trim().to_string(),
                to: to.trim().to_string(),
            })
        }
    }
}

pub struct Shell<'a> {
    session: &'a Session,
    /// Last crypto units successfully loaded in this shell.
    crypto_units: Option<Vec<Unit>>,
}

impl<'a> Shell<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            crypto_units: None,
        }
    }

    /// Current crypto units. The first load is retried and may fail; later
    /// failures keep serving the last-known prices.
    async fn crypto_units(&mut self) -> Result<&[Unit]> {
        let units = match self.crypto_units.take() {
            None => self.session.load_crypto_units().await?,
            Some(previous) if self.session.offline => previous,
            Some(previous) => match self.session.cache.get_crypto_units().await {
                Ok(units) => units,
                Err(e) => {
                    warn!(error = %e, "Using last-known crypto prices");
                    previous
                }
            },
        };
        Ok(self.crypto_units.insert(units).as_slice())
    }

    async fn resolve(&mut self, symbol: &str) -> Result<Unit> {
        if let Some(unit) = resolve_symbol(symbol) {
            return Ok(unit);
        }
        if is_crypto_symbol(symbol) {
            let units = self.crypto_units().await?;
            if let Some(unit) = find_unit(units, symbol) {
                return Ok(unit.clone());
            }
        }
        bail!("Unknown unit: {}", symbol)
    }

    async fn refresh(&mut self) -> String {
        if self.session.offline {
            return ui::style_text("Offline mode, using default prices", ui::StyleType::Warning);
        }
        if self.crypto_units.is_none() {
            return match self.crypto_units().await {
                Ok(_) => "Rates loaded".to_string(),
                Err(e) => ui::style_text(&e.to_string(), ui::StyleType::Error),
            };
        }

        match self.session.cache.refresh().await {
            Ok(units) => {
                self.crypto_units = Some(units);
                "Rates updated".to_string()
            }
            Err(e) => ui::style_text(
                &format!("Failed to refresh rates ({e}), keeping last-known prices"),
                ui::StyleType::Warning,
            ),
        }
    }

    /// Runs one command and returns its output.
    pub async fn execute(&mut self, command: ShellCommand) -> Result<String> {
        debug!(?command, "Executing shell command");
        let decimal_places = self.session.decimal_places;

        let output = match command {
            ShellCommand::Empty | ShellCommand::Quit => String::new(),
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Convert { value, from, to } => {
                let from = self.resolve(&from).await?;
                let to = self.resolve(&to).await?;
                conversion_line(value, &from, &to, decimal_places)
            }
            ShellCommand::Units(Category::Crypto) | ShellCommand::Rates => {
                let units = self.crypto_units().await?.to_vec();
                let snapshot = self.session.cache.snapshot().await;
                format!(
                    "{}\n{}",
                    units_table(Category::Crypto, &units, decimal_places),
                    rates_footer(snapshot.as_deref())
                )
            }
            ShellCommand::Units(category) => {
                units_table(category, &self.session.units(category).await?, decimal_places)
            }
            ShellCommand::Refresh => self.refresh().await,
            ShellCommand::History { coin, fiat, days } => {
                if self.session.offline {
                    bail!("Price history is not available offline");
                }
                let units = default_units();
                let crypto = find_unit(&units, coin.symbol())
                    .ok_or_else(|| anyhow!("Unknown coin: {}", coin))?;
                let quote = find_unit(&units, Fiat::from_symbol_or_usd(&fiat).symbol())
                    .ok_or_else(|| anyhow!("Unknown currency: {}", fiat))?;
                let points = self.session.history.get_history(crypto, quote, days).await;
                match chart_summary(&crypto.symbol, &quote.symbol, &points, decimal_places) {
                    Some(summary) => {
                        format!("{}\n{}", history_table(&points, decimal_places), summary)
                    }
                    None => "No price history available".to_string(),
                }
            }
        };
        Ok(output)
    }

    /// Reads commands until end of input or `quit`.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }
            match self.execute(command).await {
                Ok(output) if output.is_empty() => {}
                Ok(output) => println!("{output}"),
                Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
            }
        }
        Ok(())
    }
}

pub async fn run(session: &Session) -> Result<()> {
    println!("{}", ui::style_text("Type `help` for commands", ui::StyleType::Subtle));
    Shell::new(session)
        .run(BufReader::new(tokio::io::stdin()))
        .await
}
