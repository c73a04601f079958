//! Command implementations.

pub mod config;
pub mod query;
pub mod scan;
pub mod validate;

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::args::ServiceArgs;
use crate::config::Config;
use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration (file plus environment overrides)
    pub config: Config,

    /// Where the configuration lives
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Whether to show educational explanations
    pub explain: bool,

    /// Verbose output
    pub verbose: bool,
}

/// A service with every blank filled from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub domain: String,
    pub port: String,
    pub transport: dane::Transport,
    pub resolver: String,
}

impl Context {
    /// Resolve service arguments against the configured defaults.
    pub fn service(&self, args: ServiceArgs) -> Service {
        Service {
            domain: args.domain.unwrap_or_else(|| self.config.domain.clone()),
            port: args.port.unwrap_or_else(|| self.config.port.clone()),
            transport: args.transport.unwrap_or(self.config.transport),
            resolver: args
                .resolver
                .unwrap_or_else(|| self.config.resolver.clone()),
        }
    }

    /// Client for single-query lookups.
    pub fn lookup_client(&self, resolver: &str) -> anyhow::Result<dane::DaneClient> {
        Ok(dane::DaneClient::builder(resolver)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context {
            config: Config::default(),
            config_path: PathBuf::from("config.toml"),
            output_format: OutputFormat::Pretty,
            explain: false,
            verbose: false,
        }
    }

    #[test]
    fn test_service_defaults_from_config() {
        let service = context().service(ServiceArgs::default());
        assert_eq!(service.domain, "app.ilabbank.com");
        assert_eq!(service.port, "443");
        assert_eq!(service.transport, dane::Transport::Tcp);
        assert_eq!(service.resolver, "10.0.0.3:53");
    }

    #[test]
    fn test_service_arguments_win() {
        let service = context().service(ServiceArgs {
            domain: Some("mail.example".into()),
            port: Some("25".into()),
            transport: None,
            resolver: Some("127.0.0.1:5353".into()),
        });
        assert_eq!(service.domain, "mail.example");
        assert_eq!(service.port, "25");
        assert_eq!(service.resolver, "127.0.0.1:5353");
    }

    #[test]
    fn test_lookup_client_uses_timeout() {
        let mut ctx = context();
        ctx.config.timeout_secs = 7;
        let client = ctx.lookup_client("127.0.0.1:53").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(7));

        ctx.config.timeout_secs = 0;
        assert!(ctx.lookup_client("127.0.0.1:53").is_err());
    }
}
