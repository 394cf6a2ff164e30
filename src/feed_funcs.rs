//! Feed fetching
//!
//! Two sources produce the same `FeedResponse`: the rss2json proxy (JSON)
//! and the raw RSS document read with the `rss` crate.

use async_trait::async_trait;
use rss::Channel;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FeedError;

/// One entry as delivered by the proxy. Every field is best effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A response that already passed the `status == "ok"` check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedResponse {
    pub status: String,
    pub items: Vec<FeedItem>,
}

#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self) -> Result<FeedResponse, FeedError>;
}

/// Build `<proxy>?rss_url=<percent-encoded feed url>`
pub fn proxy_request_url(proxy_url: &str, rss_url: &str) -> String {
    let base = proxy_url.trim_end_matches(['?', '&']);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}rss_url={}", urlencoding::encode(rss_url))
}

/// Decode a proxy body. `null`, non-objects and any status other than `"ok"`
/// are `Unavailable`; an `ok` body with a broken shape is a JSON error.
pub fn decode_proxy_body(body: &[u8]) -> Result<FeedResponse, FeedError> {
    let value: Value = serde_json::from_slice(body)?;

    let status = value.get("status").and_then(Value::as_str);
    if status != Some("ok") {
        return Err(FeedError::Unavailable {
            status: status.map(str::to_string),
        });
    }

    Ok(serde_json::from_value(value)?)
}

/// Map a parsed RSS channel onto the proxy's item shape.
pub fn from_channel(channel: &Channel) -> FeedResponse {
    let items = channel
        .items()
        .iter()
        .map(|item| FeedItem {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            pub_date: item.pub_date().map(str::to_string),
            description: item
                .description()
                .or_else(|| item.content())
                .map(str::to_string),
        })
        .collect();

    FeedResponse {
        status: "ok".to_string(),
        items,
    }
}

/// Fetches through the rss2json conversion proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    url: String,
}

impl ProxyClient {
    pub fn new(proxy_url: &str, rss_url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: proxy_request_url(proxy_url, rss_url),
        })
    }

    #[cfg(test)]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedClient for ProxyClient {
    async fn fetch(&self) -> Result<FeedResponse, FeedError> {
        tracing::debug!(url = %self.url, "Requesting feed through proxy");
        let response = self.client.get(&self.url).send().await?;
        // The proxy reports failures in the body, so the HTTP status is only logged.
        tracing::debug!(status = %response.status(), "Proxy responded");
        let body = response.bytes().await?;
        decode_proxy_body(&body)
    }
}

/// Fetches the RSS document itself
#[derive(Debug, Clone)]
pub struct DirectClient {
    client: reqwest::Client,
    rss_url: String,
}

impl DirectClient {
    pub fn new(rss_url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            rss_url: rss_url.to_string(),
        })
    }
}

#[async_trait]
impl FeedClient for DirectClient {
    async fn fetch(&self) -> Result<FeedResponse, FeedError> {
        tracing::debug!(url = %self.rss_url, "Requesting RSS feed");
        let content = self.client.get(&self.rss_url).send().await?.bytes().await?;
        let channel = Channel::read_from(&content[..])?;
        Ok(from_channel(&channel))
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{refused_url, serve_once};
    use super::*;

    const RSS_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Crypto</title>
    <link>https://example.com</link>
    <description>News</description>
    <item>
      <title>Bitcoin steigt</title>
      <link>https://example.com/a</link>
      <pubDate>Mon, 01 May 2023 08:00:00 +0000</pubDate>
      <description><![CDATA[<p>Der Kurs <b>steigt</b>.</p>]]></description>
    </item>
    <item>
      <title>Ohne Beschreibung</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_proxy_request_url_encodes_feed() {
        let url = proxy_request_url(
            "https://api.rss2json.com/v1/api.json",
            "https://cryptonews.com/news/feed",
        );
        assert_eq!(
            url,
            "https://api.rss2json.com/v1/api.json?rss_url=https%3A%2F%2Fcryptonews.com%2Fnews%2Ffeed"
        );
    }

    #[test]
    fn test_proxy_request_url_keeps_existing_query() {
        let url = proxy_request_url("https://proxy.test/api?key=abc", "https://f.test/rss?a=1&b=2");
        assert_eq!(
            url,
            "https://proxy.test/api?key=abc&rss_url=https%3A%2F%2Ff.test%2Frss%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn test_proxy_request_url_trailing_separators() {
        assert_eq!(
            proxy_request_url("https://proxy.test/api?", "https://f.test/rss"),
            "https://proxy.test/api?rss_url=https%3A%2F%2Ff.test%2Frss"
        );
        assert_eq!(
            proxy_request_url("https://proxy.test/api?key=abc&", "https://f.test/rss"),
            "https://proxy.test/api?key=abc&rss_url=https%3A%2F%2Ff.test%2Frss"
        );
    }

    #[test]
    fn test_decode_ok_body() {
        let body = br#"{
            "status": "ok",
            "feed": {"title": "ignored"},
            "items": [
                {"title": "A", "link": "https://a.test", "pubDate": "2023-05-01 10:00:00", "description": "<p>x</p>", "guid": "1"},
                {"title": "B"}
            ]
        }"#;
        let response = decode_proxy_body(body).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].pub_date.as_deref(), Some("2023-05-01 10:00:00"));
        assert_eq!(response.items[1].description, None);
    }

    #[test]
    fn test_decode_non_ok_status_is_unavailable() {
        let err = decode_proxy_body(br#"{"status":"error","message":"rate limited"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Unavailable { status: Some(ref s) } if s == "error"));
    }

    #[test]
    fn test_decode_null_and_non_object_are_unavailable() {
        assert!(decode_proxy_body(b"null").unwrap_err().is_unavailable());
        assert!(decode_proxy_body(b"[1, 2]").unwrap_err().is_unavailable());
        assert!(decode_proxy_body(br#"{"items": []}"#).unwrap_err().is_unavailable());
    }

    #[test]
    fn test_decode_invalid_json_is_parse_error() {
        let err = decode_proxy_body(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FeedError::Json(_)));
    }

    #[test]
    fn test_decode_ok_without_items_is_parse_error() {
        let err = decode_proxy_body(br#"{"status":"ok"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Json(_)));
    }

    #[test]
    fn test_from_channel_maps_items() {
        let channel = Channel::read_from(RSS_DOC.as_bytes()).unwrap();
        let response = from_channel(&channel);
        assert_eq!(response.status, "ok");
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].title.as_deref(), Some("Bitcoin steigt"));
        assert_eq!(response.items[0].link.as_deref(), Some("https://example.com/a"));
        assert_eq!(
            response.items[0].pub_date.as_deref(),
            Some("Mon, 01 May 2023 08:00:00 +0000")
        );
        assert_eq!(
            response.items[0].description.as_deref(),
            Some("<p>Der Kurs <b>steigt</b>.</p>")
        );
        assert_eq!(response.items[1].description, None);
    }

    #[tokio::test]
    async fn test_proxy_client_fetches_body() {
        let body = r#"{"status":"ok","items":[{"title":"A"}]}"#.to_string();
        let base = serve_once("200 OK", "application/json", body).await;
        let client = ProxyClient::new(&base, "https://feed.test/rss").unwrap();
        assert!(client.url().contains("rss_url=https%3A%2F%2Ffeed.test%2Frss"));

        let response = client.fetch().await.unwrap();
        assert_eq!(response.items.len(), 1);
    }

    #[tokio::test]
    async fn test_proxy_client_reads_error_status_from_body() {
        let body = r#"{"status":"error","message":"Cannot download this RSS feed"}"#.to_string();
        let base = serve_once("422 Unprocessable Entity", "application/json", body).await;
        let client = ProxyClient::new(&base, "https://feed.test/rss").unwrap();

        let err = client.fetch().await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_proxy_client_connection_refused() {
        let base = refused_url().await;
        let client = ProxyClient::new(&base, "https://feed.test/rss").unwrap();

        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }

    #[tokio::test]
    async fn test_direct_client_parses_rss() {
        let base = serve_once("200 OK", "application/rss+xml", RSS_DOC.to_string()).await;
        let client = DirectClient::new(&base).unwrap();

        let response = client.fetch().await.unwrap();
        assert_eq!(response.items.len(), 2);
    }

    #[tokio::test]
    async fn test_direct_client_rejects_non_rss() {
        let base = serve_once("200 OK", "text/html", "<html><body>nope</body></html>".to_string()).await;
        let client = DirectClient::new(&base).unwrap();

        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Rss(_)));
    }
}
