//! news-feed
//!
//! Fetches a news RSS feed (through the rss2json proxy or directly), keeps the
//! latest items, turns their descriptions into short plain-text previews with
//! German dates and mounts the result into an HTML page, stdout or a terminal
//! view.

use anyhow::{Context, Result};
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod config;
mod container;
mod error;
mod feed_funcs;
mod news;
mod render_funcs;
mod text_funcs;
mod ui;

use config::{Config, Source, View};
use container::{HtmlPage, NewsContainer, StdoutContainer};
use feed_funcs::{DirectClient, FeedClient, ProxyClient};

const TUI_LOG_FILE: &str = "news-feed.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(config.view)?;

    tracing::info!(
        rss_url = %config.rss_url,
        source = ?config.source,
        view = ?config.view,
        "Starting news-feed"
    );

    let client = build_client(&config)?;

    match config.view {
        View::Tui => ui::run(client, config.limits).await,
        View::Html => {
            let mut container: Box<dyn NewsContainer> = match &config.page {
                Some(path) => Box::new(HtmlPage::new(path, config.container_id.as_str())),
                None => Box::new(StdoutContainer),
            };
            news::fetch_and_render(client.as_ref(), container.as_mut(), config.limits)
                .await
                .context("Failed to write news container")?;
            Ok(())
        }
    }
}

fn build_client(config: &Config) -> Result<Box<dyn FeedClient>> {
    let client: Box<dyn FeedClient> = match config.source {
        Source::Proxy => Box::new(
            ProxyClient::new(&config.proxy_url, &config.rss_url)
                .context("Failed to build HTTP client")?,
        ),
        Source::Direct => Box::new(
            DirectClient::new(&config.rss_url).context("Failed to build HTTP client")?,
        ),
    };
    Ok(client)
}

fn init_logging(view: View) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match view {
        // stdout carries the fragment
        View::Html => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        // the terminal belongs to the viewer
        View::Tui => {
            let file = File::create(TUI_LOG_FILE)
                .with_context(|| format!("Failed to create {TUI_LOG_FILE}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }

    Ok(())
}
