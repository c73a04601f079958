//! `danescan scan` - bulk TLSA adoption scan.

use anyhow::Result;
use colored::Colorize;
use indicatif::ProgressBar;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::Context;
use crate::cli::args::ScanArgs;
use crate::domains::{load_domains, Sampling};
use crate::education::Explain;
use crate::output::{self, print_structured, EntryRow, OutputFormat};
use dane::{
    CancellationToken, DaneClient, RateLimitConfig, ScanConfig, ScanEntry, ScanReport,
};

pub async fn execute(ctx: Context, args: ScanArgs) -> Result<()> {
    let cfg = &ctx.config;
    let resolver = args.resolver.unwrap_or_else(|| cfg.scan_resolver.clone());
    let port = args.port.unwrap_or_else(|| cfg.port.clone());
    let transport = args.transport.unwrap_or(cfg.transport);
    let rate = args.rate.unwrap_or(cfg.rate);
    let burst = args.burst.unwrap_or(cfg.burst);
    let max = args.max.unwrap_or(cfg.max_domains);

    let domains = if args.domains.is_empty() {
        let path = args.list.unwrap_or_else(|| cfg.domain_list.clone());
        let sampling = Sampling::new(args.sample.unwrap_or(cfg.sample_probability), max)?;
        load_domains(&path, &sampling)?
    } else {
        args.domains.into_iter().take(max).collect()
    };

    if ctx.explain {
        Explain::scan(domains.len(), &resolver, rate, burst).print();
    }

    let mut scan_config = ScanConfig::new().idle_timeout(Duration::from_secs(
        args.idle_timeout.unwrap_or(cfg.idle_timeout_secs),
    ));
    if let Some(secs) = args.deadline.or(cfg.deadline_secs) {
        scan_config = scan_config.deadline(Duration::from_secs(secs));
    }
    let client = DaneClient::builder(&resolver)
        .rate_limit(RateLimitConfig::new(rate, burst))
        .scan(scan_config)
        .build()?;

    // Ctrl-C stops the scan but still prints what was found so far
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let total = domains.len() as u64;
    let mut scan = client
        .scan(domains)
        .port(port)
        .transport(transport)
        .cancel_on(cancel);

    let printer = if ctx.output_format == OutputFormat::Pretty {
        let (tx, rx) = mpsc::unbounded_channel();
        scan = scan.progress(tx);
        let bar = output::progress_bar(total);
        Some((tokio::spawn(print_entries(rx, bar.clone())), bar))
    } else {
        None
    };

    let report = scan.send().await?;

    if let Some((handle, bar)) = printer {
        handle.await?;
        bar.finish_and_clear();
    }

    render(&ctx, &report)?;

    if report.stop.is_failure() {
        anyhow::bail!("scan aborted: {}", report.stop);
    }
    Ok(())
}

/// Print classifications as they arrive, above the progress bar.
async fn print_entries(mut rx: UnboundedReceiver<ScanEntry>, bar: ProgressBar) {
    while let Some(entry) = rx.recv().await {
        bar.suspend(|| println!("{}", output::entry_line(&entry)));
        bar.inc(1);
    }
}

fn render(ctx: &Context, report: &ScanReport) -> Result<()> {
    if print_structured(ctx.output_format, report)? {
        return Ok(());
    }

    if ctx.output_format == OutputFormat::Csv {
        let rows: Vec<EntryRow<'_>> = report.entries.iter().map(EntryRow::from).collect();
        return output::write_csv(std::io::stdout().lock(), &rows);
    }

    println!("{}", summary_line(report));
    if report.stop != dane::StopReason::Completed {
        println!(
            "{} {} ({} of {} dispatched queries unanswered)",
            "Stopped:".dimmed(),
            report.stop,
            report.unanswered.len(),
            report.dispatched
        );
    }
    if ctx.verbose && !report.unanswered.is_empty() {
        println!("{}", "Unanswered:".bold());
        for domain in &report.unanswered {
            println!("  {}", domain.dimmed());
        }
    }
    Ok(())
}

fn summary_line(report: &ScanReport) -> String {
    format!(
        "Found {} TLSA records in {} domains in {:.6}s",
        report.found,
        report.requested,
        report.elapsed.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dane::StopReason;

    #[test]
    fn test_summary_line() {
        let report = ScanReport {
            started_at: Utc::now(),
            elapsed: Duration::from_millis(2500),
            requested: 1000,
            dispatched: 1000,
            found: 12,
            entries: Vec::new(),
            unanswered: Vec::new(),
            stop: StopReason::Completed,
        };
        assert_eq!(
            summary_line(&report),
            "Found 12 TLSA records in 1000 domains in 2.500000s"
        );
    }
}
