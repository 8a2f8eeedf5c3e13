use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;

use newsfeed::config::Config;
use newsfeed::signage::{resolve_feeds, router, FeedSource, Refresher, SharedSnapshot};

#[derive(Parser, Debug)]
#[command(
    name = "newsfeed-signage",
    version,
    about = "Serve an auto-refreshing headline display over HTTP"
)]
struct Args {
    /// RSS, Atom or RSS 1.0 feed URLs (overrides the feeds file)
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Feed list file, plain text or OPML [default: feeds.txt]
    #[arg(long, value_name = "FILE")]
    feeds_file: Option<PathBuf>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Port to listen on [default: 8080]
    #[arg(long)]
    port: Option<u16>,

    /// Maximum number of entries to keep [default: 240]
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    limit: Option<i64>,

    /// HTTP timeout per feed in seconds [default: 15]
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Only keep entries mentioning this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    keyword: Option<String>,

    /// Disable TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Seconds between feed refreshes, at least 5 [default: 300]
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    refresh_seconds: Option<f64>,

    /// Config file [default: ~/.config/newsfeed/config.toml]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) -> Vec<String> {
        if let Some(path) = self.feeds_file {
            config.signage.feeds_file = path;
        }
        if let Some(bind) = self.bind {
            config.signage.bind = bind;
        }
        if let Some(port) = self.port {
            config.signage.port = port;
        }
        if let Some(limit) = self.limit {
            config.signage.limit = limit;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if self.keyword.is_some() {
            config.keyword = self.keyword;
        }
        if self.insecure {
            config.verify_tls = false;
        }
        if let Some(seconds) = self.refresh_seconds {
            config.signage.refresh_seconds = seconds;
        }
        self.urls
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    let urls = args.apply(&mut config);

    let options = config
        .collect_options(config.signage.limit)
        .context("Invalid command-line options")?;
    let interval = config
        .refresh_interval()
        .context("Invalid command-line options")?;

    let (urls, source) = resolve_feeds(urls, &config.signage.feeds_file).with_context(|| {
        format!(
            "Failed to load feed list '{}'",
            config.signage.feeds_file.display()
        )
    })?;
    if source == FeedSource::Builtin {
        tracing::info!("No feed URLs supplied and feed file missing or empty, using built-in feeds");
    }
    tracing::info!(feeds = urls.len(), source = %source, "Using feed list");

    let feed_count = urls.len();
    let snapshot = SharedSnapshot::new();
    let refresher =
        Refresher::new(urls, &options, snapshot.clone()).context("Failed to build HTTP client")?;

    let initial = refresher.refresh_once().await;
    tracing::info!(
        entries = initial.entries.len(),
        feeds = feed_count,
        "Loaded entries at startup"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let refresh_task = tokio::spawn(refresher.run(interval, stop_rx));

    let listener = tokio::net::TcpListener::bind((config.signage.bind.as_str(), config.signage.port))
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.signage.bind, config.signage.port
            )
        })?;
    tracing::info!(
        addr = %format!("http://{}:{}", config.signage.bind, config.signage.port),
        refresh_secs = interval.as_secs_f64(),
        "Signage server listening, open / in a browser"
    );

    axum::serve(listener, router(snapshot))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Signage server error")?;

    tracing::info!("Stopping server");
    // Ignore the error: the loop may already have exited
    let _ = stop_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(5), refresh_task)
        .await
        .is_err()
    {
        tracing::warn!("Refresh still running at shutdown, abandoning it");
    }

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down gracefully"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }
}
