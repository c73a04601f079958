//! `danescan validate` - single-domain DANE validation.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::ValidateArgs;
use crate::cli::Outcome;
use crate::education::Explain;
use crate::output::print_structured;
use dane::{
    association_data, summarize, MatchPolicy, MatchingType, Selector, TlsCertificateSource,
    TlsaQuery, TlsaRecord, Validation,
};

/// One presented certificate, as printed
#[derive(Debug, Serialize)]
struct CertificateView {
    subject: String,
    issuer: String,
    not_after: String,
    sha256: String,
}

#[derive(Debug, Serialize)]
struct ValidationView<'a> {
    domain: &'a str,
    query: &'a str,
    record: &'a TlsaRecord,
    certificates: Vec<CertificateView>,
    verdict: bool,
}

pub async fn execute(ctx: Context, args: ValidateArgs) -> Result<Outcome> {
    let service = ctx.service(args.service);
    let trust = args.trust.unwrap_or(ctx.config.trust);
    let extra_root = args.extra_root.or_else(|| ctx.config.extra_root.clone());
    let policy = if args.usage_aware {
        MatchPolicy::UsageAware
    } else {
        MatchPolicy::WholeChain
    };

    let query = TlsaQuery::new(&service.port, service.transport, &service.domain)?;
    if ctx.explain {
        Explain::validate(query.name(), &service.domain, &service.port).print();
    }

    let client = ctx.lookup_client(&service.resolver)?;
    let mut source = TlsCertificateSource::builder().trust_mode(trust.into());
    if let Some(root) = extra_root {
        source = source.extra_root(root);
    }
    let source = source.build().context("setting up the TLS client")?;

    let outcome = dane::validate_domain_with_policy(
        &client,
        &source,
        &service.port,
        service.transport,
        &service.domain,
        policy,
    )
    .await
    .with_context(|| format!("validating {}", query.name()))?;

    let view = ValidationView {
        domain: &service.domain,
        query: query.name(),
        record: &outcome.record,
        certificates: certificate_views(&outcome),
        verdict: outcome.verdict,
    };

    if !print_structured(ctx.output_format, &view)? {
        if ctx.verbose {
            print_details(&view);
        }
        if outcome.verdict {
            println!("{}", "success!!!".green().bold());
        } else {
            println!("{}", "bogus certificate!!!".red().bold());
        }
    }

    Ok(Outcome::from_verdict(outcome.verdict))
}

fn certificate_views(outcome: &Validation) -> Vec<CertificateView> {
    outcome
        .chain
        .iter()
        .map(|der| {
            let sha256 = association_data(der, Selector::Full, MatchingType::Sha256)
                .map(hex::encode)
                .unwrap_or_default();
            match summarize(der) {
                Ok(summary) => CertificateView {
                    subject: summary.subject,
                    issuer: summary.issuer,
                    not_after: summary.not_after,
                    sha256,
                },
                Err(e) => CertificateView {
                    subject: format!("(unparseable: {e})"),
                    issuer: String::new(),
                    not_after: String::new(),
                    sha256,
                },
            }
        })
        .collect()
}

fn print_details(view: &ValidationView<'_>) {
    println!("{} {}", "Query:".bold(), view.query.cyan());
    println!("{} {}", "Record:".bold(), view.record);
    println!();

    println!("{}", "Presented chain:".bold().underline());
    for (i, cert) in view.certificates.iter().enumerate() {
        println!("  {} {}", format!("[{i}]").dimmed(), cert.subject);
        println!("      issuer:    {}", cert.issuer);
        println!("      not after: {}", cert.not_after);
        println!("      sha256:    {}", cert.sha256.dimmed());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dane::CertificateChain;

    #[test]
    fn test_certificate_views() {
        let outcome = Validation {
            record: "3 0 0 0102".parse().unwrap(),
            chain: CertificateChain::new(vec![vec![0x01, 0x02]]),
            verdict: true,
        };
        let views = certificate_views(&outcome);
        assert_eq!(views.len(), 1);
        assert!(views[0].subject.starts_with("(unparseable"));
        assert_eq!(
            views[0].sha256,
            "a12871fee210fb8619291eaea194581cbd2531e4b23759d225f6806923f63222"
        );
    }
}
