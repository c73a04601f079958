//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use dane_core::{Classification, ScanEntry};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// CSV output (scan entries, query records)
    Csv,
    /// YAML output
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => anyhow::bail!(
                "Unknown output format: {}\n\
                 Valid formats: pretty, json, csv, yaml",
                s
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Print a value as JSON or YAML.
///
/// Returns `Ok(false)` for formats that need a command-specific rendering.
pub fn print_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Pretty | OutputFormat::Csv => return Ok(false),
    }
    Ok(true)
}

/// Write rows as CSV with a header line.
pub fn write_csv<T, W>(writer: W, rows: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Flat CSV row for a scan entry
#[derive(Debug, Serialize)]
pub struct EntryRow<'a> {
    pub domain: &'a str,
    pub transaction_id: u16,
    pub classification: Classification,
    pub rcode: &'a str,
}

impl<'a> From<&'a ScanEntry> for EntryRow<'a> {
    fn from(entry: &'a ScanEntry) -> Self {
        Self {
            domain: &entry.domain,
            transaction_id: entry.transaction_id,
            classification: entry.classification,
            rcode: entry.rcode.as_deref().unwrap_or_default(),
        }
    }
}

/// Colored `YES` / `NO`
pub fn classification_label(classification: Classification) -> ColoredString {
    match classification {
        Classification::Yes => "YES".green().bold(),
        Classification::No => "NO".red(),
    }
}

/// `<domain> => YES|NO` with colors
pub fn entry_line(entry: &ScanEntry) -> String {
    format!("{} => {}", entry.domain, classification_label(entry.classification))
}

/// Progress bar for classified/total on stderr.
pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {elapsed}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message("Classified");
    pb
}
