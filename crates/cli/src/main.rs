// orderqa CLI - validate, reconcile and model batches of order extracts

mod exit_codes;
mod names;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "orderqa")]
#[command(about = "Data-quality checks, reconciliation and data marts for order extracts")]
#[command(version)]
struct Cli {
    /// Log progress (info level) to stderr. RUST_LOG overrides.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every extract in a directory, reconcile them, and write the outputs
    #[command(after_help = "\
Examples:
  orderqa run incoming/
  orderqa run incoming/ --out results/
  orderqa run incoming/ --config orders.toml --json
  orderqa run incoming/ --strict || echo 'findings to resolve'")]
    Run {
        /// Directory holding the order extracts
        input: PathBuf,

        /// Pipeline config (TOML). Defaults apply when omitted.
        #[arg(long, short = 'c', env = "ORDERQA_CONFIG")]
        config: Option<PathBuf>,

        /// Directory the report, marts, archive and review file are written to
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Exit 3 when the issue report is not empty
        #[arg(long)]
        strict: bool,
    },

    /// Validate a pipeline config without running
    #[command(after_help = "\
Examples:
  orderqa validate orders.toml")]
    Validate {
        /// Path to the pipeline config (TOML)
        config: PathBuf,
    },

    /// Check file names against the extract naming taxonomy
    #[command(after_help = "\
Examples:
  orderqa check-names 010203_Orders_2024_01_01_00_00_00.csv
  orderqa check-names incoming/*.csv --config orders.toml")]
    CheckNames {
        /// File names or paths; only the last path component is checked
        #[arg(required = true)]
        files: Vec<String>,

        /// Take the extension and name pattern from this config
        #[arg(long, short = 'c', env = "ORDERQA_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<orderqa_recon::ReconError> for CliError {
    fn from(err: orderqa_recon::ReconError) -> Self {
        use orderqa_recon::ReconError;
        match err {
            ReconError::ConfigParse(_)
            | ReconError::ConfigValidation(_)
            | ReconError::InvalidPattern { .. } => CliError::config(err.to_string()),
            ReconError::Load { .. } | ReconError::Io(_) => CliError::io(err.to_string()),
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { input, config, out, json, strict } => {
            run::cmd_run(input, config, out, json, strict)
        }
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::CheckNames { files, config } => names::cmd_check_names(files, config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
