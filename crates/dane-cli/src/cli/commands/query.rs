//! `danescan query` - print the TLSA records of a service.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::QueryArgs;
use crate::education::Explain;
use crate::output::{self, print_structured, OutputFormat};
use dane::{TlsaQuery, TlsaRecord};

#[derive(Debug, Serialize)]
struct QueryView<'a> {
    name: &'a str,
    records: &'a [TlsaRecord],
}

/// Flat CSV row for one record
#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    name: &'a str,
    usage: u8,
    selector: u8,
    matching_type: u8,
    association_data: String,
}

impl<'a> RecordRow<'a> {
    fn new(name: &'a str, record: &TlsaRecord) -> Self {
        Self {
            name,
            usage: record.certificate_usage.into(),
            selector: record.selector.into(),
            matching_type: record.matching_type.into(),
            association_data: record.association_hex(),
        }
    }
}

pub async fn execute(ctx: Context, args: QueryArgs) -> Result<()> {
    let service = ctx.service(args.service);
    let query = TlsaQuery::new(&service.port, service.transport, &service.domain)?;

    if ctx.explain {
        Explain::query(query.name()).print();
    }

    let client = ctx.lookup_client(&service.resolver)?;
    let records = client
        .tlsa()
        .resolve_all_query(&query)
        .await
        .with_context(|| format!("looking up {}", query.name()))?;

    let view = QueryView {
        name: query.name(),
        records: &records,
    };
    if print_structured(ctx.output_format, &view)? {
        return Ok(());
    }

    if ctx.output_format == OutputFormat::Csv {
        let rows: Vec<RecordRow<'_>> = records
            .iter()
            .map(|r| RecordRow::new(query.name(), r))
            .collect();
        return output::write_csv(std::io::stdout().lock(), &rows);
    }

    for record in &records {
        println!("{}", record.to_zone_line(query.name()));
        if ctx.verbose {
            println!(
                "  {} {:?}, {} {:?}, {} {:?}",
                "usage".dimmed(),
                record.certificate_usage,
                "selector".dimmed(),
                record.selector,
                "matching".dimmed(),
                record.matching_type
            );
        }
    }
    Ok(())
}
