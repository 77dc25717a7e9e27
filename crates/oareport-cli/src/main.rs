//! oareport - open-access report for publication exports
//!
//! Looks up every DOI of every exported publication on oaDOI and writes one
//! CSV row per lookup next to what the local repository records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oareport_oadoi::{ClientConfig, OadoiClient};

mod config;
mod discover;

use config::Config;

/// Environment fallback for `--email`
const EMAIL_ENV: &str = "OADOI_EMAIL";

#[derive(Parser)]
#[command(name = "oareport")]
#[command(about = "Compare local open-access records with oaDOI")]
#[command(version)]
struct Cli {
    /// Publication exports (NDJSON). Default: *Publication-export.json in the
    /// current directory
    files: Vec<PathBuf>,

    /// Contact email sent to oaDOI (falls back to config, then $OADOI_EMAIL)
    #[arg(long)]
    email: Option<String>,

    /// Maximum concurrent lookups
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: Option<u16>,

    /// Dispatch threads (raised to --concurrency if lower)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Write CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// oaDOI endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Config file path (default: ./oareport.toml or ~/.config/oareport/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    show_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = oareport_core::ProgressContext::new();

    // Logging:
    //   TTY:     warn unless -v; spinners show activity
    //   non-TTY: info unless -q/-v; logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = cli.quiet || (is_tty && !cli.verbose);
    oareport_core::init_logging(quiet, cli.verbose, multi)
        .context("Failed to initialize logging")?;

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    let email = resolve_email(
        cli.email.clone(),
        config.api.email.clone(),
        std::env::var(EMAIL_ENV).ok(),
    );
    let client_config = ClientConfig {
        base_url: cli.base_url.clone().unwrap_or(config.api.base_url.clone()),
        email: email.clone().unwrap_or_default(),
    };
    let pipeline_config = pipeline_config(&cli, &config)?;

    if cli.show_config {
        print_config(&client_config, &pipeline_config, email.is_some());
        return Ok(());
    }

    anyhow::ensure!(
        email.is_some(),
        "An email is required: pass --email, set api.email in the config file, or set {EMAIL_ENV}"
    );
    let client = OadoiClient::new(client_config)?;
    let output = prepare_output(&cli, &pipeline_config)?;

    let summary = oareport_pipeline::run(&pipeline_config, &client, output, &progress)?;
    if is_tty {
        summary.print();
    } else {
        summary.log();
    }
    Ok(())
}

/// First non-empty email among the command line, the config file and the
/// environment.
fn resolve_email(
    cli: Option<String>,
    config: Option<String>,
    env: Option<String>,
) -> Option<String> {
    [cli, config, env]
        .into_iter()
        .flatten()
        .map(|e| e.trim().to_string())
        .find(|e| !e.is_empty())
}

/// Merge CLI flags over the config file and discover inputs if none named.
fn pipeline_config(cli: &Cli, config: &Config) -> Result<oareport_pipeline::Config> {
    let inputs = if cli.files.is_empty() {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        discover::discover_inputs(&cwd)?
    } else {
        cli.files.clone()
    };

    let defaults = oareport_pipeline::Config::default();
    Ok(oareport_pipeline::Config {
        inputs,
        concurrency: cli
            .concurrency
            .map_or(config.http.concurrency, usize::from),
        workers: cli.workers.or(config.http.workers).unwrap_or(defaults.workers),
        channel_capacity: config.http.channel_capacity,
        sherpa_base_url: config.output.sherpa_base_url.clone(),
        ..defaults
    })
}

/// Validate the run, then open the CSV destination. Checking first keeps an
/// existing `--output` file intact when there is nothing to process.
fn prepare_output(
    cli: &Cli,
    pipeline: &oareport_pipeline::Config,
) -> Result<Box<dyn Write + Send>> {
    pipeline.validate()?;
    Ok(match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    })
}

fn print_config(client: &ClientConfig, pipeline: &oareport_pipeline::Config, has_email: bool) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["oaDOI base URL", &client.base_url]);
    table.add_row(vec![
        "Email",
        if has_email { client.email.as_str() } else { "not set" },
    ]);
    table.add_row(vec!["Concurrency", &pipeline.concurrency.to_string()]);
    table.add_row(vec!["Dispatch threads", &pipeline.dispatch_threads().to_string()]);
    table.add_row(vec!["Channel capacity", &pipeline.channel_capacity.to_string()]);
    table.add_row(vec!["SHERPA/RoMEO base", &pipeline.sherpa_base_url]);
    table.add_row(vec!["Input files", &pipeline.inputs.len().to_string()]);

    eprintln!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn email_precedence() {
        assert_eq!(
            resolve_email(some("cli@x.org"), some("file@x.org"), some("env@x.org")),
            some("cli@x.org")
        );
        assert_eq!(
            resolve_email(None, some("file@x.org"), some("env@x.org")),
            some("file@x.org")
        );
        assert_eq!(resolve_email(None, None, some("env@x.org")), some("env@x.org"));
        assert_eq!(resolve_email(None, None, None), None);
    }

    #[test]
    fn blank_email_falls_through() {
        assert_eq!(
            resolve_email(some("  "), None, some(" env@x.org ")),
            some("env@x.org")
        );
        assert_eq!(resolve_email(some(""), some(""), None), None);
    }

    #[test]
    fn cli_overrides_config_file() {
        let cli = Cli::parse_from(["oareport", "-n", "9", "-w", "2", "a.json", "b.json"]);
        let mut config = Config::default();
        config.http.concurrency = 3;
        config.http.workers = Some(40);
        config.http.channel_capacity = 7;

        let merged = pipeline_config(&cli, &config).unwrap();
        assert_eq!(merged.inputs, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(merged.concurrency, 9);
        assert_eq!(merged.workers, 2);
        assert_eq!(merged.dispatch_threads(), 9);
        assert_eq!(merged.channel_capacity, 7);
    }

    #[test]
    fn config_file_used_without_flags() {
        let cli = Cli::parse_from(["oareport", "a.json"]);
        let mut config = Config::default();
        config.http.concurrency = 3;
        config.http.workers = Some(40);

        let merged = pipeline_config(&cli, &config).unwrap();
        assert_eq!(merged.concurrency, 3);
        assert_eq!(merged.workers, 40);
    }

    #[test]
    fn no_inputs_rejected_before_output_opened() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.csv");
        std::fs::write(&report, "previous run\n").unwrap();

        let out = report.to_string_lossy().into_owned();
        let cli = Cli::parse_from(["oareport", "-o", out.as_str()]);
        let mut merged = pipeline_config(&cli, &Config::default()).unwrap();
        merged.inputs.clear();

        assert!(prepare_output(&cli, &merged).is_err());
        assert_eq!(std::fs::read_to_string(&report).unwrap(), "previous run\n");
    }

    #[test]
    fn zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["oareport", "-n", "0"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["oareport", "-q", "-v"]).is_err());
    }
}
