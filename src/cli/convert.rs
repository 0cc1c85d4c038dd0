use super::ui::{self, StyleType};
use crate::core::config::{AppConfig, CurrencyName};
use crate::core::conversion::{self, ConversionRequest, ConversionResult};
use crate::core::error::{ConversionError, SessionError};
use crate::core::session::{self, Session};
use crate::core::RateAcquisition;
use crate::providers::{ExchangeRateApiSource, HttpProbe};
use crate::store::{FileSnapshotStore, SnapshotStore};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use std::io::{self, BufRead, Write};
use tracing::debug;

const SOURCE_PROMPT: &str = "\n-> Select source currency (number from the list above): ";
const TARGET_PROMPT: &str = "\n-> Select target currency (number from the list above): ";
const CONTINUE_PROMPT: &str = "\nWould you like to perform another conversion? (yes/no): ";

/// Line based question/answer over any reader and writer. End of input is
/// reported as `None` and ends the session.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn warn(&mut self, text: &str) -> io::Result<()> {
        writeln!(
            self.output,
            "{}",
            ui::style_text(&format!("⚠ {text}"), StyleType::Warning)
        )
    }

    pub fn choose_currency<'c>(
        &mut self,
        choices: &'c [CurrencyName],
        prompt: &str,
    ) -> io::Result<Option<&'c CurrencyName>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(number) => match session::choose(choices, number) {
                    Some(choice) => return Ok(Some(choice)),
                    None => self.warn(&format!(
                        "Invalid selection. Enter a number between 1 and {}",
                        choices.len()
                    ))?,
                },
                Err(_) => self.warn("Please enter a numeric value")?,
            }
        }
    }

    pub fn ask_amount(&mut self, max_amount: f64) -> io::Result<Option<f64>> {
        loop {
            let Some(answer) = self.ask("-> ")? else {
                return Ok(None);
            };
            let Some(amount) = conversion::parse_amount(&answer) else {
                self.warn("Please enter a numeric value")?;
                continue;
            };
            match conversion::check_amount(amount, max_amount) {
                Ok(()) => return Ok(Some(amount)),
                Err(ConversionError::AmountTooLarge { max, .. }) => self.warn(&format!(
                    "Amount cannot exceed {}",
                    conversion::format_amount(max)
                ))?,
                Err(_) => self.warn("Amount must be greater than 0")?,
            }
        }
    }

    pub fn ask_continue(&mut self) -> io::Result<bool> {
        loop {
            let answer = self.ask(CONTINUE_PROMPT)?.map(|a| a.to_lowercase());
            match answer.as_deref() {
                None | Some("n") | Some("no") => return Ok(false),
                Some("y") | Some("yes") => return Ok(true),
                Some(_) => self.warn("Please enter 'yes' or 'no'")?,
            }
        }
    }
}

enum TargetOutcome<'c> {
    Converted(&'c CurrencyName, ConversionResult),
    Restart,
    EndOfInput,
}

pub fn write_currency_list<W: Write>(out: &mut W, choices: &[CurrencyName]) -> io::Result<()> {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Currency"),
        ui::header_cell("Code"),
    ]);
    for (i, choice) in choices.iter().enumerate() {
        table.add_row(vec![
            ui::number_cell((i + 1).to_string()),
            Cell::new(&choice.name),
            Cell::new(&choice.code),
        ]);
    }
    writeln!(
        out,
        "\nAvailable currencies (remember the numbers, they are used for both currencies):"
    )?;
    writeln!(out, "{table}")
}

pub fn write_result<W: Write>(
    out: &mut W,
    source: &CurrencyName,
    target: &CurrencyName,
    result: &ConversionResult,
) -> io::Result<()> {
    let line = ui::separator('=');
    writeln!(out, "\n{line}")?;
    writeln!(out, "{}", ui::style_text("Conversion result:", StyleType::Title))?;
    writeln!(
        out,
        "{} {} ({})",
        conversion::format_amount(result.amount),
        source.name,
        source.code
    )?;
    writeln!(
        out,
        "→ {} {} ({})",
        conversion::format_amount(result.converted),
        target.name,
        target.code
    )?;
    writeln!(
        out,
        "{}",
        ui::style_text(
            &format!(
                "Rates as of {}",
                session::format_rates_date(result.fetched_at)
            ),
            StyleType::Subtle
        )
    )?;
    writeln!(out, "{line}")
}

/// Runs the select/amount/select/convert loop until the user declines to
/// continue or input ends.
pub fn conversion_loop<R: BufRead, W: Write>(
    session: &mut Session<'_>,
    prompter: &mut Prompter<R, W>,
) -> io::Result<()> {
    let choices = session.currencies().to_vec();
    write_currency_list(prompter.output(), &choices)?;

    loop {
        let Some(source) = prompter.choose_currency(&choices, SOURCE_PROMPT)? else {
            break;
        };
        writeln!(
            prompter.output(),
            "\nGot it, currency \"{}\", what amount?",
            source.name
        )?;
        let Some(amount) = prompter.ask_amount(session.max_amount())? else {
            break;
        };

        let outcome = loop {
            let Some(target) = prompter.choose_currency(&choices, TARGET_PROMPT)? else {
                break TargetOutcome::EndOfInput;
            };
            let request = ConversionRequest::new(amount, &source.code, &target.code);
            match session.convert(&request) {
                Ok(result) => break TargetOutcome::Converted(target, result),
                Err(ConversionError::SameCurrency(_)) => prompter.warn(&format!(
                    "You selected the same currency ({}) for both source and target. \
                     Please select a different target currency.",
                    source.name
                ))?,
                Err(e) => {
                    writeln!(
                        prompter.output(),
                        "{}",
                        ui::style_text(&format!("✗ Conversion error: {e}"), StyleType::Error)
                    )?;
                    break TargetOutcome::Restart;
                }
            }
        };

        match outcome {
            TargetOutcome::Converted(target, result) => {
                debug!(
                    source = %result.source,
                    target = %result.target,
                    rate = result.rate,
                    "Converted"
                );
                write_result(prompter.output(), source, target, &result)?;
            }
            TargetOutcome::Restart => {}
            TargetOutcome::EndOfInput => break,
        }

        if !prompter.ask_continue()? {
            break;
        }
    }

    writeln!(
        prompter.output(),
        "\nThank you for using the currency converter! Goodbye!"
    )
}

/// Acquires rates (or falls back to stored ones) and reports the outcome.
/// A session error has already been shown to the user when it is returned.
pub async fn open_session<'a, W: Write>(
    config: &'a AppConfig,
    acquisition: &RateAcquisition<'_>,
    store: &dyn SnapshotStore,
    out: &mut W,
) -> Result<Session<'a>> {
    writeln!(out, "Checking exchange rates...")?;
    let pb = ui::new_spinner("Updating data...");
    let started = Session::start(config, acquisition, store, Utc::now()).await;
    pb.finish_and_clear();

    match started {
        Ok(session) => {
            writeln!(out, "{}", ui::banner_text(&session::status_banner(session.active())))?;
            let missing = session.missing_required();
            if !missing.is_empty() {
                writeln!(
                    out,
                    "{}",
                    ui::style_text(
                        &format!(
                            "⚠ The following currencies are missing from the data: {}",
                            missing.join(", ")
                        ),
                        StyleType::Warning
                    )
                )?;
            }
            Ok(session)
        }
        Err(e) => {
            writeln!(out, "{}", ui::banner_text(&session::no_data_banner(&e)))?;
            writeln!(out, "Check your internet connection or try again later.")?;
            Err(e.into())
        }
    }
}

pub async fn run_with<R: BufRead, W: Write>(
    config: &AppConfig,
    acquisition: &RateAcquisition<'_>,
    store: &dyn SnapshotStore,
    input: R,
    mut output: W,
) -> Result<()> {
    let mut session = open_session(config, acquisition, store, &mut output).await?;
    writeln!(output, "\nWelcome to the currency converter!")?;

    let mut prompter = Prompter::new(input, output);
    conversion_loop(&mut session, &mut prompter)?;
    session.terminate();
    Ok(())
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let store = FileSnapshotStore::new(config.db_file_path()?);
    debug!(path = %store.path().display(), "Using snapshot store");
    let source = ExchangeRateApiSource::new(config.fetch_timeout())?;
    let probe = HttpProbe::new(&config.probe_urls, config.probe_timeout())?;
    let acquisition = RateAcquisition::new(
        &source,
        &probe,
        &config.required_currencies,
        config.fetch_timeout(),
    );

    let stdin = io::stdin();
    run_with(config, &acquisition, &store, stdin.lock(), io::stdout()).await
}

/// True for errors that `open_session` has already explained to the user.
pub fn is_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<SessionError>().is_some()
}
