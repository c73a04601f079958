//! Configuration management.

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use dane_core::Transport;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Environment variable prefix for overrides (`DANESCAN_RESOLVER`, ...)
pub const ENV_PREFIX: &str = "DANESCAN_";

/// Keys accepted by `config set` and `DANESCAN_*` overrides.
pub const KEYS: &[(&str, &str)] = &[
    ("resolver", "Resolver for single-domain lookups (host:port)"),
    ("scan_resolver", "Resolver for bulk scans (host:port)"),
    ("domain", "Domain validated when no subcommand is given"),
    ("port", "Service port label"),
    ("transport", "Service transport (tcp/udp)"),
    ("trust", "TLS trust mode (dane/pkix)"),
    ("extra_root", "Operator root CA (PEM) for pkix trust, or empty to unset"),
    ("domain_list", "rank,domain list used by bulk scans"),
    ("sample_probability", "Chance to keep each listed domain (1.0 keeps all)"),
    ("max_domains", "Upper bound on domains per scan"),
    ("rate", "Queries per second"),
    ("burst", "Rate limiter burst size"),
    ("timeout_secs", "Single-query timeout"),
    ("idle_timeout_secs", "Scan stops after this long without answers"),
    ("deadline_secs", "Hard limit on scan duration, or empty for none"),
    ("output_format", "Default output format (pretty/json/csv/yaml)"),
    ("explain_by_default", "Always explain commands (true/false)"),
];

/// How the TLS client treats the server's chain
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trust {
    /// Skip chain and hostname checks; the TLSA record decides
    #[default]
    Dane,
    /// Also require a chain to a public or operator root
    Pkix,
}

impl From<Trust> for dane::TrustMode {
    fn from(trust: Trust) -> Self {
        match trust {
            Trust::Dane => Self::Dane,
            Trust::Pkix => Self::Pkix,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Resolver for single-domain lookups.
    pub resolver: String,

    /// Resolver for bulk scans.
    pub scan_resolver: String,

    /// Domain validated in single-domain mode.
    pub domain: String,

    /// Service port label.
    pub port: String,

    /// Service transport label.
    pub transport: Transport,

    /// TLS trust mode for fetching chains.
    pub trust: Trust,

    /// Operator root added to the PKIX trust store.
    pub extra_root: Option<PathBuf>,

    /// `rank,domain` list for bulk scans.
    pub domain_list: PathBuf,

    /// Chance to keep each listed domain.
    pub sample_probability: f64,

    /// Upper bound on domains per scan.
    pub max_domains: usize,

    /// Queries per second during scans.
    pub rate: u32,

    /// Rate limiter burst.
    pub burst: u32,

    /// Single-query timeout in seconds.
    pub timeout_secs: u64,

    /// Scan idle timeout in seconds.
    pub idle_timeout_secs: u64,

    /// Overall scan deadline in seconds.
    pub deadline_secs: Option<u64>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Always show explanations (as if --explain was passed).
    pub explain_by_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver: "10.0.0.3:53".into(),
            scan_resolver: "8.8.8.8:53".into(),
            domain: "app.ilabbank.com".into(),
            port: "443".into(),
            transport: Transport::Tcp,
            trust: Trust::Dane,
            extra_root: None,
            domain_list: PathBuf::from("alexa.txt"),
            sample_probability: 0.1,
            max_domains: 10_000,
            rate: 200,
            burst: 50,
            timeout_secs: 2,
            idle_timeout_secs: 5,
            deadline_secs: None,
            output_format: None,
            explain_by_default: false,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "dane", "danescan")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from file, then apply `DANESCAN_*` overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(std::env::vars().filter_map(|(name, value)| {
            name.strip_prefix(ENV_PREFIX)
                .map(|key| (key.to_lowercase(), value))
        }))?;
        Ok(config)
    }

    /// Load configuration from file only.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Apply `(key, value)` pairs. Unknown keys are ignored.
    pub fn apply_overrides<I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            if KEYS.iter().any(|(known, _)| *known == key) {
                self.set(&key, &value)
                    .with_context(|| format!("{ENV_PREFIX}{}", key.to_uppercase()))?;
            }
        }
        Ok(())
    }

    /// Set one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "resolver" => self.resolver = value.to_string(),
            "scan_resolver" => self.scan_resolver = value.to_string(),
            "domain" => self.domain = value.to_string(),
            "port" => {
                value
                    .parse::<u16>()
                    .with_context(|| format!("invalid port {value:?}"))?;
                self.port = value.to_string();
            }
            "transport" => self.transport = value.parse()?,
            "trust" => {
                self.trust = Trust::from_str(value, true).map_err(|e| anyhow::anyhow!(e))?;
            }
            "extra_root" => self.extra_root = optional(value).map(PathBuf::from),
            "domain_list" => self.domain_list = PathBuf::from(value),
            "sample_probability" => self.sample_probability = value.parse()?,
            "max_domains" => self.max_domains = value.parse()?,
            "rate" => self.rate = value.parse()?,
            "burst" => self.burst = value.parse()?,
            "timeout_secs" => self.timeout_secs = value.parse()?,
            "idle_timeout_secs" => self.idle_timeout_secs = value.parse()?,
            "deadline_secs" => self.deadline_secs = optional(value).map(str::parse).transpose()?,
            "output_format" | "output" => self.output_format = Some(value.parse()?),
            "explain_by_default" | "explain" => self.explain_by_default = value.parse()?,
            _ => {
                let available: Vec<String> = KEYS
                    .iter()
                    .map(|(name, help)| format!("  {name:<20} - {help}"))
                    .collect();
                anyhow::bail!(
                    "Unknown config key: {}\n\nAvailable keys:\n{}",
                    key,
                    available.join("\n")
                );
            }
        }
        Ok(())
    }
}

fn optional(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != "none").then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.resolver, "10.0.0.3:53");
        assert_eq!(config.scan_resolver, "8.8.8.8:53");
        assert_eq!(config.domain, "app.ilabbank.com");
        assert_eq!(config.port, "443");
        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.rate, 200);
        assert_eq!(config.burst, 50);
        assert_eq!(config.max_domains, 10_000);
        assert_eq!(config.sample_probability, 0.1);
        assert_eq!(config.extra_root, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("resolver = \"127.0.0.1:5353\"\nrate = 20\n").unwrap();
        assert_eq!(config.resolver, "127.0.0.1:5353");
        assert_eq!(config.rate, 20);
        assert_eq!(config.burst, 50);
        assert_eq!(config.domain_list, PathBuf::from("alexa.txt"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load_file(&path).unwrap(), Config::default());

        let mut config = Config::default();
        config.set("transport", "udp").unwrap();
        config.set("trust", "pkix").unwrap();
        config.set("deadline_secs", "90").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.transport, Transport::Udp);
        assert_eq!(loaded.trust, Trust::Pkix);
        assert_eq!(loaded.deadline_secs, Some(90));
    }

    #[test]
    fn test_set_validation() {
        let mut config = Config::default();
        assert!(config.set("port", "https").is_err());
        assert!(config.set("rate", "-1").is_err());
        assert!(config.set("colour", "blue").is_err());

        config.set("extra_root", "/usr/local/internal-ca/ca.crt").unwrap();
        assert_eq!(
            config.extra_root,
            Some(PathBuf::from("/usr/local/internal-ca/ca.crt"))
        );
        config.set("extra_root", "").unwrap();
        assert_eq!(config.extra_root, None);
        config.set("sample_probability", "1.0").unwrap();
        assert!(config.set("sample_probability", "often").is_err());
        config.set("output", "json").unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(vec![
                ("scan_resolver".to_string(), "1.1.1.1:53".to_string()),
                ("burst".to_string(), "5".to_string()),
                ("config".to_string(), "/ignored".to_string()),
            ])
            .unwrap();
        assert_eq!(config.scan_resolver, "1.1.1.1:53");
        assert_eq!(config.burst, 5);

        let err = config
            .apply_overrides(vec![("rate".to_string(), "fast".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("DANESCAN_RATE"));
    }
}
