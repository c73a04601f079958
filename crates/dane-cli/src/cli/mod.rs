//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands, ScanArgs, ValidateArgs};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Run the CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration, then apply DANESCAN_* overrides
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    // Determine output format
    let output_format = cli.output.or(config.output_format).unwrap_or_default();

    // Create context for commands
    let ctx = commands::Context {
        explain: cli.explain || config.explain_by_default,
        config,
        config_path,
        output_format,
        verbose: cli.verbose,
    };

    // Dispatch to appropriate command; without one, --scan picks the mode
    let outcome = match cli.command {
        Some(Commands::Validate(args)) => commands::validate::execute(ctx, args).await?,
        None if !cli.scan => commands::validate::execute(ctx, ValidateArgs::default()).await?,
        Some(Commands::Scan(args)) => {
            commands::scan::execute(ctx, args).await?;
            Outcome::Success
        }
        None => {
            commands::scan::execute(ctx, ScanArgs::default()).await?;
            Outcome::Success
        }
        Some(Commands::Query(args)) => {
            commands::query::execute(ctx, args).await?;
            Outcome::Success
        }
        Some(Commands::Config(args)) => {
            commands::config::execute(ctx, args).await?;
            Outcome::Success
        }
    };
    Ok(outcome.into())
}

/// How a command that ran to completion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The presented chain does not match the TLSA record
    Bogus,
}

impl Outcome {
    pub const fn from_verdict(verdict: bool) -> Self {
        if verdict {
            Self::Success
        } else {
            Self::Bogus
        }
    }

    /// Process exit status
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Bogus => 1,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        Self::from(outcome.code())
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "warn,dane=debug,dane_client=debug,dane_tls=debug,dane_cli=debug"
    } else {
        "warn"
    };

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
