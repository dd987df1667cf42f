//! `triage`: classify and route a single support ticket.
//!
//! ```bash
//! # Stub mode (no credential)
//! triage --text "I was charged twice this month"
//!
//! # Remote model, pretty output
//! LLM_API_KEY=sk-... triage --file ticket.txt --output pretty
//! ```
//!
//! The record is printed on stdout; logs go to stderr.

mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use triage_runtime::{Settings, TriagePipeline};

use crate::logging::LogFormat;
use crate::output::{Envelope, OutputFormat};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "triage", author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    input: TicketInput,

    /// Output rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Settings file (YAML); environment variables still override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-attempt model timeout, e.g. "10s" (overrides TIMEOUT_SECONDS)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct TicketInput {
    /// Ticket text
    #[arg(long)]
    text: Option<String>,

    /// Path to a ticket file ("-" reads stdin)
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TicketInput {
    fn load(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        match &self.file {
            Some(path) if path.as_os_str() == "-" => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read ticket from stdin")?;
                Ok(text)
            }
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read ticket file {}", path.display())),
            None => anyhow::bail!("either --text or --file is required"),
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_yaml_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::from_env().context("invalid settings in environment")?,
    };

    if let Some(timeout) = cli.timeout {
        settings.timeout_seconds = whole_seconds(timeout);
        settings.validate().context("invalid --timeout")?;
    }

    Ok(settings)
}

/// Round up to whole seconds.
fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    logging::init(settings.log_filter(), cli.log_format)?;

    let correlation_id = logging::new_correlation_id();
    let ticket = cli.input.load()?;
    let pipeline = TriagePipeline::new(&settings).context("failed to build pipeline")?;

    tracing::info!(
        correlation_id = %correlation_id,
        mode = settings.mode(),
        caller = pipeline.caller_name(),
        environment = %settings.environment,
        "Triage started"
    );

    let outcome = pipeline.process(&ticket, &correlation_id).await;
    let envelope = Envelope::new(&outcome, &settings, chrono::Utc::now());
    println!("{}", envelope.render(cli.output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_text_and_file_are_exclusive() {
        let err = Cli::try_parse_from(["triage", "--text", "a", "--file", "b.txt"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["triage"]).is_err());
    }

    #[test]
    fn test_parses_options() {
        let cli = Cli::try_parse_from([
            "triage",
            "--text",
            "refund please",
            "--output",
            "pretty",
            "--timeout",
            "1500ms",
            "--log-format",
            "text",
        ])
        .unwrap();

        assert_eq!(cli.input.load().unwrap(), "refund please");
        assert_eq!(cli.output, OutputFormat::Pretty);
        assert_eq!(cli.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_secs(10)), 10);
        assert_eq!(whole_seconds(Duration::from_millis(1)), 1);
    }

    #[test]
    fn test_missing_ticket_file() {
        let cli = Cli::try_parse_from(["triage", "--file", "/nonexistent/ticket.txt"]).unwrap();
        let err = cli.input.load().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ticket.txt"));
    }
}
