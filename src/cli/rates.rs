use super::convert::open_session;
use super::ui::{self, StyleType};
use crate::core::config::AppConfig;
use crate::core::session::{self, Session};
use crate::core::RateAcquisition;
use crate::providers::{ExchangeRateApiSource, HttpProbe};
use crate::store::{FileSnapshotStore, SnapshotStore};
use anyhow::Result;
use comfy_table::Cell;
use std::io::{self, Write};

/// Renders the catalog currencies of the active snapshot as a table. Rates are
/// shown relative to the snapshot's base currency.
pub fn display_as_table(session: &Session<'_>) -> String {
    let snapshot = &session.active().snapshot;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", snapshot.base)),
    ]);

    for currency in session.currencies() {
        let rate = snapshot.rate(&currency.code).unwrap_or_default();
        table.add_row(vec![
            Cell::new(&currency.code),
            Cell::new(&currency.name),
            ui::number_cell(format!("{rate:.4}")),
        ]);
    }

    format!(
        "Base: {}\n\n{}\n{}",
        ui::style_text(&snapshot.base, StyleType::Title),
        table,
        ui::style_text(
            &format!(
                "Rates as of {}",
                session::format_rates_date(snapshot.fetched_at)
            ),
            StyleType::Subtle
        )
    )
}

pub async fn run_with<W: Write>(
    config: &AppConfig,
    acquisition: &RateAcquisition<'_>,
    store: &dyn SnapshotStore,
    mut out: W,
) -> Result<()> {
    let session = open_session(config, acquisition, store, &mut out).await?;
    writeln!(out, "\n{}", display_as_table(&session))?;
    session.terminate();
    Ok(())
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let store = FileSnapshotStore::new(config.db_file_path()?);
    let source = ExchangeRateApiSource::new(config.fetch_timeout())?;
    let probe = HttpProbe::new(&config.probe_urls, config.probe_timeout())?;
    let acquisition = RateAcquisition::new(
        &source,
        &probe,
        &config.required_currencies,
        config.fetch_timeout(),
    );
    run_with(config, &acquisition, &store, io::stdout()).await
}
