use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use newsfeed::config::Config;
use newsfeed::feed::collect;
use newsfeed::output::{render_json, render_text};

#[derive(Parser, Debug)]
#[command(
    name = "newsfeed",
    version,
    about = "Fetch RSS/Atom feeds and print the most recent entries"
)]
struct Args {
    /// RSS, Atom or RSS 1.0 feed URLs
    #[arg(required = true, value_name = "URL")]
    urls: Vec<String>,

    /// Maximum number of entries to print [default: 10]
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    limit: Option<i64>,

    /// HTTP timeout per feed in seconds [default: 15]
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Only print entries mentioning this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    keyword: Option<String>,

    /// Disable TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Print entries as a JSON array
    #[arg(long)]
    json: bool,

    /// Config file [default: ~/.config/newsfeed/config.toml]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
    if args.keyword.is_some() {
        config.keyword = args.keyword;
    }
    if args.insecure {
        config.verify_tls = false;
    }
    let limit = args.limit.unwrap_or(config.cli.limit);
    let options = config
        .collect_options(limit)
        .context("Invalid command-line options")?;

    let collected = collect(&args.urls, &options).await;

    for warning in &collected.warnings {
        eprintln!("[WARN] {warning}");
    }

    if collected.entries.is_empty() {
        eprintln!("No feed entries found.");
        return Ok(ExitCode::FAILURE);
    }

    if args.json {
        let json = render_json(&collected.entries).context("Failed to serialize entries")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&collected.entries));
    }

    Ok(ExitCode::SUCCESS)
}
