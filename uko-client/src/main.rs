//! uko-predictor - terminal front end for the Uko Single Predictor
//!
//! Collects name, date of birth, tribe and (optionally) gender, submits them
//! to the scoring service and reveals the resulting percentage.
//!
//! Fields given on the command line are used as-is; anything missing or
//! invalid is prompted for on stdin.

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use uko_client::animator::{status_line, AnimatorTiming, PercentageBand};
use uko_client::share::{CommandShareTarget, ShareTarget, SystemClipboard};
use uko_client::{HttpBackend, ResultAnimator, ShareOutcome, SubmissionController, SubmitError};
use uko_common::config::{load_toml_config, BuildMode, ClientConfig};
use uko_common::{FormField, Gender, PredictionResult, TribeOption};

type InputLines = Lines<BufReader<Stdin>>;

#[derive(Parser, Debug)]
#[command(name = "uko-predictor", version, about = "Find out how single you are")]
struct Cli {
    /// Scoring service base URL (overrides UKO_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Config file (default: <config dir>/uko/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Full name
    #[arg(long)]
    name: Option<String>,

    /// Date of birth, MM/DD/YYYY
    #[arg(long)]
    dob: Option<String>,

    /// Tribe, as listed by --list-tribes
    #[arg(long)]
    tribe: Option<String>,

    /// male, female or other
    #[arg(long)]
    gender: Option<String>,

    /// Print the tribe catalog and exit
    #[arg(long)]
    list_tribes: bool,

    /// Share the result without asking
    #[arg(long)]
    share: bool,

    /// Show the result immediately instead of counting up
    #[arg(long)]
    no_animate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = load_toml_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                toml_config
                    .logging
                    .level
                    .parse::<tracing::Level>()
                    .unwrap_or(tracing::Level::WARN)
                    .into(),
            ),
        )
        .init();

    info!("Starting uko-predictor v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ClientConfig::resolve(cli.api_url.as_deref(), &toml_config, BuildMode::current());
    if cli.no_animate {
        config.reveal_duration = Duration::ZERO;
    }

    let controller = SubmissionController::new(Arc::new(HttpBackend::new(&config)?));
    controller.init().await;

    let catalog = controller.catalog().await;
    if let Some(err) = &catalog.load_error {
        eprintln!("! {}", err);
    }
    if cli.list_tribes {
        for option in &catalog.options {
            println!("{}", option.label);
        }
        return Ok(());
    }

    let share_target = config
        .share_command
        .clone()
        .and_then(CommandShareTarget::new)
        .map(|target| Arc::new(target) as Arc<dyn ShareTarget>);
    let animator = ResultAnimator::new(
        AnimatorTiming::from(&config),
        Arc::new(SystemClipboard::new()),
        share_target,
    )
    .with_share_url(config.share_url.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut presets = [
        (FormField::Name, cli.name),
        (FormField::Dob, cli.dob),
        (FormField::Tribe, cli.tribe),
        (FormField::Gender, cli.gender),
    ];

    let mut keep_answers = false;
    loop {
        if !keep_answers {
            for (field, preset) in presets.iter_mut() {
                fill_field(&controller, &mut lines, *field, preset.take(), &catalog.options).await?;
            }
        }
        keep_answers = false;

        let result = match controller.submit().await {
            Ok(result) => result,
            Err(SubmitError::Invalid(errors)) => {
                for (field, message) in errors.failing() {
                    eprintln!("  {}: {}", field, message);
                }
                if let Some(err) = &catalog.load_error {
                    eprintln!("! {}", err);
                }
                bail!("Form is not valid");
            }
            Err(SubmitError::Busy) => bail!("Submission is not available right now"),
            Err(SubmitError::Failed(err)) => {
                // the form keeps its answers; the user decides what to do next
                eprintln!("! {}", err.user_message());
                if confirm(&mut lines, "Retry with the same answers? [y/N] ").await? {
                    keep_answers = true;
                    continue;
                }
                if confirm(&mut lines, "Start over? [y/N] ").await? {
                    controller.reset().await;
                    continue;
                }
                return Err(anyhow!("{}", err.user_message()));
            }
        };

        reveal(&animator, &result).await?;

        if cli.share || confirm(&mut lines, "Share your result? [y/N] ").await? {
            match animator.share_result().await {
                Ok(ShareOutcome::Shared) => println!("Shared!"),
                Ok(ShareOutcome::Copied) => println!("Copied!"),
                Ok(ShareOutcome::NoResult) => {}
                Err(_) => {
                    if let Some(message) = animator.snapshot().clipboard_error {
                        eprintln!("! {}", message);
                    }
                    animator.dismiss_error();
                }
            }
        }

        if !confirm(&mut lines, "Try again? [y/N] ").await? {
            return Ok(());
        }
        controller.reset().await;
    }
}

/// Set one field, re-prompting until it validates
async fn fill_field(
    controller: &SubmissionController,
    lines: &mut InputLines,
    field: FormField,
    preset: Option<String>,
    tribes: &[TribeOption],
) -> Result<()> {
    if field == FormField::Tribe && tribes.is_empty() {
        eprintln!("  No tribes available to choose from");
        return Ok(());
    }

    let mut pending = preset;
    loop {
        let raw = match pending.take() {
            Some(value) => value,
            None => {
                print_prompt(field, tribes)?;
                lines
                    .next_line()
                    .await?
                    .ok_or_else(|| anyhow!("Input closed before {} was entered", field))?
            }
        };

        let value = match field {
            FormField::Tribe => pick_tribe(raw.trim(), tribes),
            FormField::Gender => {
                let choice = raw.trim();
                if !choice.is_empty() && choice.parse::<Gender>().is_err() {
                    eprintln!("  Choose male, female or other (or leave blank)");
                    continue;
                }
                choice.to_string()
            }
            _ => raw,
        };

        controller.set_field(field, &value).await;
        let message = controller.field_errors().await.get(field).to_string();
        if message.is_empty() {
            return Ok(());
        }
        eprintln!("  {}", message);
    }
}

/// Accept a tribe by list number or by name
fn pick_tribe(choice: &str, tribes: &[TribeOption]) -> String {
    choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| tribes.get(i))
        .map(|option| option.value.clone())
        .unwrap_or_else(|| choice.to_string())
}

fn print_prompt(field: FormField, tribes: &[TribeOption]) -> Result<()> {
    let mut stdout = std::io::stdout();
    match field {
        FormField::Tribe => {
            for (i, option) in tribes.iter().enumerate() {
                writeln!(stdout, "  {:>2}. {}", i + 1, option.label)?;
            }
        }
        FormField::Gender => {
            let labels: Vec<&str> = Gender::ALL.iter().map(Gender::label).collect();
            writeln!(stdout, "  ({})", labels.join(" / "))?;
        }
        _ => {}
    }
    write!(stdout, "{}: ", field.label())?;
    stdout.flush()?;
    Ok(())
}

async fn confirm(lines: &mut InputLines, question: &str) -> Result<bool> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", question)?;
    stdout.flush()?;
    Ok(lines
        .next_line()
        .await?
        .map(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
        .unwrap_or(false))
}

/// Count up to the result, redrawing one line per frame
async fn reveal(animator: &ResultAnimator, result: &PredictionResult) -> Result<()> {
    let mut rx = animator.subscribe();
    let mut run = animator.start(result.clone()).await;
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let shown = rx.borrow_and_update().displayed_percentage;
                write!(stdout, "\r{:>3}%  {}", shown, status_line(result, shown))?;
                stdout.flush()?;
            }
            _ = &mut run => break,
        }
    }

    let shown = animator.snapshot().displayed_percentage;
    let band = match PercentageBand::of(result.percentage) {
        PercentageBand::Low => "low",
        PercentageBand::Medium => "medium",
        PercentageBand::High => "high",
    };
    writeln!(stdout, "\r{:>3}%  {} [{}]", shown, status_line(result, shown), band)?;
    writeln!(stdout, "\"{}\"", result.message)?;
    writeln!(stdout, "Tribe: {}  Zodiac: {}", result.tribe, result.zodiac)?;
    Ok(())
}
