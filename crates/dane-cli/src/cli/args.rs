//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use dane_core::Transport;
use std::path::PathBuf;

use crate::config::Trust;
use crate::output::OutputFormat;

/// DANE validator and TLSA adoption scanner
///
/// Without a subcommand, validates the configured domain, or scans the
/// configured domain list when --scan is given.
/// Use --explain on any command to learn what it does.
#[derive(Parser, Debug)]
#[command(name = "danescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Run a bulk TLSA scan of the configured domain list
    #[arg(long)]
    pub scan: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Explain what this command does (educational mode)
    #[arg(long, global = true)]
    pub explain: bool,

    /// Increase verbosity (debug logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file path
    #[arg(long, global = true, env = "DANESCAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a server's certificate chain against its TLSA record
    Validate(ValidateArgs),

    /// Scan many domains for TLSA records
    Scan(ScanArgs),

    /// Print the TLSA records of a service
    Query(QueryArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Service selection shared by validate and query
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct ServiceArgs {
    /// Domain to check (defaults to the configured domain)
    pub domain: Option<String>,

    /// Service port
    #[arg(short, long)]
    pub port: Option<String>,

    /// Service transport (tcp or udp)
    #[arg(short, long)]
    pub transport: Option<Transport>,

    /// Resolver address (host:port)
    #[arg(short, long)]
    pub resolver: Option<String>,
}

// ============================================================================
// Validate command
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// TLS trust mode used while fetching the chain
    #[arg(long, value_enum)]
    pub trust: Option<Trust>,

    /// Operator root CA (PEM) added to the trust store in pkix mode
    #[arg(long)]
    pub extra_root: Option<PathBuf>,

    /// Match only the certificate the record's usage designates
    #[arg(long)]
    pub usage_aware: bool,
}

// ============================================================================
// Scan command
// ============================================================================

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Domains to scan instead of the domain list
    pub domains: Vec<String>,

    /// rank,domain list to read domains from
    #[arg(short = 'l', long, conflicts_with = "domains")]
    pub list: Option<PathBuf>,

    /// Chance to keep each listed domain (1.0 keeps all)
    #[arg(long)]
    pub sample: Option<f64>,

    /// Maximum number of domains to scan
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Service port
    #[arg(short, long)]
    pub port: Option<String>,

    /// Service transport (tcp or udp)
    #[arg(short, long)]
    pub transport: Option<Transport>,

    /// Resolver address (host:port)
    #[arg(short, long)]
    pub resolver: Option<String>,

    /// Queries per second
    #[arg(long)]
    pub rate: Option<u32>,

    /// Rate limiter burst size
    #[arg(long)]
    pub burst: Option<u32>,

    /// Stop after this many seconds without answers
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Stop after this many seconds in total
    #[arg(long)]
    pub deadline: Option<u64>,
}

// ============================================================================
// Query command
// ============================================================================

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub service: ServiceArgs,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key to set (e.g., resolver, rate)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}
