//! Command-line entry point.

use crate::auth::DefaultCredential;
use crate::config::{Config, Overrides};
use crate::evaluation::{Evaluation, Outcome, report_missing_input};
use crate::project::ProjectClient;
use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Evaluate an interview transcript with a hosted code-interpreter agent
#[derive(Parser, Debug)]
#[command(name = "interview-eval", version, about)]
pub struct Cli {
    /// Transcript to evaluate (default: interview-transcript.txt next to the executable)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Project endpoint URL (overrides PROJECT_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model deployment name (overrides MODEL_DEPLOYMENT_NAME)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Do not clear the terminal before running
    #[arg(long)]
    pub no_clear: bool,

    /// Config file (default: <config dir>/interview-eval/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            input_file: self.file.clone(),
            no_clear: self.no_clear,
        }
    }
}

/// Run an evaluation and map the result to an exit code.
pub async fn run(cli: Cli) -> ExitCode {
    match run_inner(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_inner(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.verbose);

    // Process environment wins over .env
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        tracing::warn!("Ignoring unreadable .env file: {e}");
    }

    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;
    if config.clear_screen && io::stdout().is_terminal() {
        clear_screen()?;
    }

    let mut out = io::stdout().lock();
    let outcome = evaluate(&config, &mut out).await?;
    out.flush()?;

    Ok(exit_code(outcome))
}

/// Check the input file, then connect and run the evaluation.
///
/// A missing input file is reported before endpoint or model are required.
async fn evaluate<W: Write>(config: &Config, out: &mut W) -> crate::error::Result<Outcome> {
    let input = config.input_path()?;
    if report_missing_input(&input, out)? {
        return Ok(Outcome::MissingInput);
    }

    let endpoint = config.endpoint()?;
    let model = config.model()?;

    let credential = Arc::new(DefaultCredential::new(config.tenant_id.clone()));
    let client = ProjectClient::new(endpoint, config.api_version.clone(), credential)?;
    tracing::debug!(endpoint = client.endpoint(), model, "Project client ready");

    Evaluation::new(model).run(&client, &input, out).await
}

fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::MissingInput | Outcome::Completed => ExitCode::SUCCESS,
        Outcome::ResponseFailed => ExitCode::FAILURE,
    }
}

fn init_tracing(verbose: bool) {
    if verbose {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("interview_eval=debug"))
            .with_writer(io::stderr)
            .try_init();
    } else if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .try_init();
    }
}

fn clear_screen() -> io::Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}
