use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use vocalc_core::{normalize, AngleUnit, Evaluator, Normalized, Outcome, Session, Settings};
use vocalc_runtime::{
    Announcer, Control, Feedback, FeedbackSink, HeuristicSolver, NullRecognizer,
    RecognitionEvent, RuntimeConfig, RuntimeError, SingleFlight, SpeechSynthesizer, VoiceLoop,
};

/// vocalc - Voice-driven calculator
#[derive(Parser)]
#[command(name = "vocalc", version, about)]
struct Cli {
    /// Settings file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "VOCALC_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an expression
    Eval {
        /// Expression, e.g. "sqrt(9)+2"
        expression: String,
        /// Interpret trig arguments as radians
        #[arg(long, conflicts_with = "degrees")]
        radians: bool,
        /// Interpret trig arguments as degrees
        #[arg(long)]
        degrees: bool,
        /// Decimal places in the result (0-10)
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Show how an utterance is understood
    Parse {
        /// Spoken text, e.g. "five plus three"
        #[arg(required = true, num_args = 1..)]
        utterance: Vec<String>,
    },
    /// Read transcripts from stdin, one utterance per line
    ///
    /// Lines starting with ':' are controls: ':calc', ':solve <question>',
    /// ':start', ':stop', ':quit'.
    Session {
        /// Write the history as CSV on exit
        #[arg(long)]
        export_csv: Option<PathBuf>,
        /// Runtime timing config (JSON)
        #[arg(long)]
        runtime_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info,vocalc_core=debug,vocalc_runtime=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    tracing::debug!(?settings, "loaded settings");

    match cli.command {
        Command::Eval {
            expression,
            radians,
            degrees,
            decimals,
        } => cmd_eval(settings, &expression, radians, degrees, decimals, cli.format),
        Command::Parse { utterance } => cmd_parse(&utterance.join(" "), cli.format),
        Command::Session {
            export_csv,
            runtime_config,
        } => cmd_session(settings, export_csv, runtime_config, cli.format).await,
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn cmd_eval(
    mut settings: Settings,
    expression: &str,
    radians: bool,
    degrees: bool,
    decimals: Option<u8>,
    format: Format,
) -> anyhow::Result<()> {
    if radians {
        settings.set_angle_unit(AngleUnit::Radians);
    } else if degrees {
        settings.set_angle_unit(AngleUnit::Degrees);
    }
    if let Some(places) = decimals {
        settings.set_decimal_places(places)?;
    }

    let evaluation = Evaluator::from_settings(&settings)
        .evaluate(expression)
        .with_context(|| format!("cannot evaluate {expression:?}"))?;

    match format {
        Format::Text => println!("{}", evaluation.formatted),
        Format::Json => println!("{}", serde_json::to_string(&evaluation)?),
    }
    Ok(())
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    utterance: &'a str,
    #[serde(flatten)]
    normalized: Normalized,
}

fn cmd_parse(utterance: &str, format: Format) -> anyhow::Result<()> {
    let normalized = normalize(utterance).with_context(|| format!("cannot parse {utterance:?}"))?;

    match format {
        Format::Text => match &normalized {
            Normalized::Command(tag) => println!("command: {tag}"),
            Normalized::Expression(expr) => println!("expression: {expr}"),
        },
        Format::Json => println!(
            "{}",
            serde_json::to_string(&ParseOutput {
                utterance,
                normalized,
            })?
        ),
    }
    Ok(())
}

async fn cmd_session(
    settings: Settings,
    export_csv: Option<PathBuf>,
    runtime_config: Option<PathBuf>,
    format: Format,
) -> anyhow::Result<()> {
    let config = match runtime_config {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RuntimeConfig::from_json(&json)?
        }
        None => RuntimeConfig::default(),
    };
    tracing::debug!(?config, "loaded runtime configuration");

    let (events_tx, events_rx) = mpsc::channel(64);
    let (controls_tx, controls_rx) = mpsc::channel(16);

    let solver = SingleFlight::new(Arc::new(HeuristicSolver), config.solver_timeout);
    let voice_loop = VoiceLoop::new(
        Session::new(settings),
        config,
        Arc::new(NullRecognizer),
        Announcer::new(Arc::new(ConsoleSynthesizer { format })),
        solver,
        Arc::new(TerminalSink { format }),
    );
    let running = tokio::spawn(voice_loop.run(events_rx, controls_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.strip_prefix(':') {
            Some(control) => match parse_control(control) {
                Some(Control::Shutdown) => break,
                Some(control) => controls_tx.send(control).await?,
                None => eprintln!("unknown control {line:?}"),
            },
            None => {
                events_tx
                    .send(RecognitionEvent::Final(line.to_string()))
                    .await?
            }
        }
    }

    controls_tx.send(Control::Shutdown).await?;
    let session = running.await.context("voice loop panicked")?;

    if let Some(path) = export_csv {
        if session.history().is_empty() {
            eprintln!("No history to export");
        } else {
            std::fs::write(&path, session.history().to_csv())
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), entries = session.history().len(), "History exported");
        }
    }
    Ok(())
}

fn parse_control(text: &str) -> Option<Control> {
    let (name, rest) = text.split_once(' ').unwrap_or((text, ""));
    match name {
        "calc" | "calculate" | "=" => Some(Control::Calculate),
        "solve" if !rest.trim().is_empty() => Some(Control::Solve(rest.trim().to_string())),
        "start" => Some(Control::StartListening),
        "stop" => Some(Control::StopListening),
        "quit" | "q" => Some(Control::Shutdown),
        _ => None,
    }
}

/// Prints loop feedback to stdout.
struct TerminalSink {
    format: Format,
}

impl FeedbackSink for TerminalSink {
    fn feedback(&self, feedback: Feedback) {
        match (self.format, feedback) {
            (Format::Text, Feedback::Hearing(text)) => println!("... {text}"),
            (Format::Text, Feedback::Status(message)) => println!("[{message}]"),
            (Format::Text, Feedback::SolverError(message)) => println!("Error: {message}"),
            (Format::Text, Feedback::Outcome(outcome)) => print_outcome(&outcome),
            (Format::Json, feedback) => println!("{}", feedback_json(&feedback)),
        }
    }
}

fn print_outcome(outcome: &Outcome) {
    println!("{}", outcome.feedback());
    if let Outcome::Solved { answer, .. } = outcome {
        println!("{answer}");
    }
}

fn feedback_json(feedback: &Feedback) -> serde_json::Value {
    match feedback {
        Feedback::Hearing(text) => serde_json::json!({ "hearing": text }),
        Feedback::Status(message) => serde_json::json!({ "status": message }),
        Feedback::SolverError(message) => serde_json::json!({ "solver_error": message }),
        Feedback::Outcome(outcome) => {
            let mut value = serde_json::to_value(outcome).unwrap_or_default();
            if let Some(object) = value.as_object_mut() {
                object.insert("feedback".to_string(), outcome.feedback().into());
            }
            value
        }
    }
}

/// Stands in for a speech engine by printing what would be said.
struct ConsoleSynthesizer {
    format: Format,
}

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str, _language: &str, _rate: f32) -> Result<(), RuntimeError> {
        match self.format {
            Format::Text => println!("(says) {text}"),
            Format::Json => println!("{}", serde_json::json!({ "speak": text })),
        }
        Ok(())
    }

    async fn cancel(&self) {}
}
