//! `danescan config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::print_structured;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    if print_structured(ctx.output_format, config)? {
        return Ok(());
    }

    println!("{}", "Current Configuration:".bold());
    println!("  {}", ctx.config_path.display().to_string().dimmed());
    println!();

    let unset = || "(not set)".dimmed().to_string();
    let rows = [
        ("resolver", config.resolver.clone()),
        ("scan_resolver", config.scan_resolver.clone()),
        ("domain", config.domain.clone()),
        ("port", config.port.clone()),
        ("transport", config.transport.to_string()),
        ("trust", format!("{:?}", config.trust).to_lowercase()),
        (
            "extra_root",
            config
                .extra_root
                .as_ref()
                .map_or_else(unset, |p| p.display().to_string()),
        ),
        ("domain_list", config.domain_list.display().to_string()),
        ("sample_probability", config.sample_probability.to_string()),
        ("max_domains", config.max_domains.to_string()),
        ("rate", config.rate.to_string()),
        ("burst", config.burst.to_string()),
        ("timeout_secs", config.timeout_secs.to_string()),
        ("idle_timeout_secs", config.idle_timeout_secs.to_string()),
        (
            "deadline_secs",
            config.deadline_secs.map_or_else(unset, |d| d.to_string()),
        ),
        (
            "output_format",
            config
                .output_format
                .map_or_else(unset, |f| f.to_string()),
        ),
        ("explain_by_default", config.explain_by_default.to_string()),
    ];
    for (key, value) in rows {
        println!("  {} {}", format!("{key}:").bold(), value);
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    // Edit the file as stored, without environment overrides baked in
    let mut config = Config::load_file(&ctx.config_path)?;
    config.set(key, value)?;
    config.save(&ctx.config_path)?;

    println!(
        "{} {} set to {}.",
        "Success:".green().bold(),
        key,
        value.cyan()
    );
    Ok(())
}
