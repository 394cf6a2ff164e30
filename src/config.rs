use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_RSS_URL: &str = "https://cryptonews.com/news/feed";
pub const DEFAULT_PROXY_URL: &str = "https://api.rss2json.com/v1/api.json";
pub const DEFAULT_CONTAINER_ID: &str = "news-container";
pub const DEFAULT_MAX_ITEMS: usize = 10;
pub const DEFAULT_PREVIEW_WORDS: usize = 40;

/// Where the feed comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// RSS converted to JSON by the rss2json proxy
    Proxy,
    /// RSS fetched and parsed directly
    Direct,
}

/// Where the result is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Html,
    Tui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_items: usize,
    pub preview_words: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            preview_words: DEFAULT_PREVIEW_WORDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rss_url: String,
    pub proxy_url: String,
    pub source: Source,
    pub view: View,
    /// HTML page to inject into; `None` prints the fragment instead
    pub page: Option<PathBuf>,
    pub container_id: String,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rss_url: DEFAULT_RSS_URL.to_string(),
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            source: Source::Proxy,
            view: View::Html,
            page: None,
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let source = match var("NEWS_SOURCE").as_deref().map(str::trim) {
            None | Some("proxy") => Source::Proxy,
            Some("direct") => Source::Direct,
            Some(other) => bail!("NEWS_SOURCE must be \"proxy\" or \"direct\", got {other:?}"),
        };
        let view = match var("NEWS_VIEW").as_deref().map(str::trim) {
            None | Some("html") => View::Html,
            Some("tui") => View::Tui,
            Some(other) => bail!("NEWS_VIEW must be \"html\" or \"tui\", got {other:?}"),
        };

        let limits = Limits {
            max_items: parse_count(var("NEWS_MAX_ITEMS"), "NEWS_MAX_ITEMS")?
                .unwrap_or(defaults.limits.max_items),
            preview_words: parse_count(var("NEWS_PREVIEW_WORDS"), "NEWS_PREVIEW_WORDS")?
                .unwrap_or(defaults.limits.preview_words),
        };

        Ok(Self {
            rss_url: var("NEWS_RSS_URL").unwrap_or(defaults.rss_url),
            proxy_url: var("NEWS_PROXY_URL").unwrap_or(defaults.proxy_url),
            source,
            view,
            page: var("NEWS_PAGE").map(PathBuf::from),
            container_id: var("NEWS_CONTAINER_ID").unwrap_or(defaults.container_id),
            limits,
        })
    }
}

fn parse_count(value: Option<String>, key: &str) -> Result<Option<usize>> {
    value
        .map(|v| {
            v.trim()
                .parse::<usize>()
                .with_context(|| format!("{key} must be a non-negative integer, got {v:?}"))
        })
        .transpose()
}
