//! RSS/Atom acquisition: fetch, repair, parse, normalize.

use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::header;
use tracing::{debug, info, warn};

use haberdar_common::text;
use haberdar_common::types::{Enclosure, FeedItem};

use crate::date;
use crate::error::FeedError;
use crate::sanitize::sanitize_xml;

/// Feed endpoints reject default client identifiers, so announce
/// ourselves honestly but descriptively.
const FEED_USER_AGENT: &str = "haberdar/0.1 (+https://haberdar.dev; feed fetcher)";
const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A parsed feed with its normalized entries.
#[derive(Debug, Clone)]
pub struct FeedResult {
    pub title: String,
    pub description: Option<String>,
    pub site_url: Option<String>,
    pub items: Vec<FeedItem>,
}

pub struct FeedReader {
    client: reqwest::Client,
}

impl FeedReader {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build feed HTTP client");
        Self { client }
    }

    /// Fetch and parse a feed URL into normalized items.
    pub async fn fetch(&self, url: &str) -> Result<FeedResult, FeedError> {
        let resp = self
            .client
            .get(url)
            .header(header::USER_AGENT, FEED_USER_AGENT)
            .header(header::ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                code: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await?;
        let result = parse_feed(&bytes, url)?;
        info!(url, items = result.items.len(), "feed: parsed successfully");
        Ok(result)
    }
}

impl Default for FeedReader {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Parse a raw feed body. The sanitized stream is tried first; if that
/// fails, the original bytes go straight to the parser. Aggressive repair
/// occasionally breaks a document that would have parsed fine as-is, and
/// vice versa, so both paths are required.
pub fn parse_feed(bytes: &[u8], url: &str) -> Result<FeedResult, FeedError> {
    let sanitized = sanitize_xml(bytes);

    let (feed, parsed_text) = match feed_rs::parser::parse(sanitized.as_bytes()) {
        Ok(feed) => (feed, sanitized),
        Err(first_err) => {
            warn!(url, error = %first_err, "feed: sanitized parse failed, retrying raw bytes");
            match feed_rs::parser::parse(bytes) {
                Ok(feed) => (feed, String::from_utf8_lossy(bytes).into_owned()),
                Err(raw_err) => {
                    return Err(FeedError::Parse(format!(
                        "sanitized: {first_err}; raw: {raw_err}"
                    )));
                }
            }
        }
    };

    // feed-rs drops dates it cannot parse and synthesizes ids for items
    // without a guid, so both are recovered from the markup itself.
    let raw_dates = raw_entry_field(&parsed_text, "pubDate|dc:date|published|updated");
    let raw_guids = raw_entry_field(&parsed_text, "guid|id");

    let title = feed
        .title
        .map(|t| text::clean(&t.content))
        .unwrap_or_default();
    let description = feed.description.map(|d| text::clean(&d.content));
    let site_url = feed.links.first().map(|l| l.href.clone());

    let items: Vec<FeedItem> = feed
        .entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            map_entry(
                entry,
                raw_dates.get(idx).and_then(|d| d.as_deref()),
                raw_guids.get(idx).and_then(|g| g.as_deref()),
            )
        })
        .collect();

    Ok(FeedResult {
        title,
        description,
        site_url,
        items,
    })
}

fn map_entry(
    entry: feed_rs::model::Entry,
    raw_date: Option<&str>,
    raw_guid: Option<&str>,
) -> Option<FeedItem> {
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

    let title = entry
        .title
        .as_ref()
        .map(|t| text::clean(&t.content))
        .unwrap_or_default();

    let description = entry
        .summary
        .as_ref()
        .map(|s| text::clean(&s.content))
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_deref())
                .map(text::clean)
        })
        .unwrap_or_default();

    let published_at = resolve_published(entry.published.or(entry.updated), raw_date, &link);

    let author = entry
        .authors
        .first()
        .map(|p| p.name.clone())
        .filter(|n| !n.is_empty());

    let enclosure = entry.media.iter().flat_map(|m| m.content.iter()).find_map(|c| {
        c.url.as_ref().map(|u| Enclosure {
            url: u.to_string(),
            mime_type: c.content_type.as_ref().map(|m| m.to_string()),
            length: c.size,
        })
    });

    // Opaque dedup key within this feed only. Falls back to the link when
    // the document carries no guid of its own.
    let guid = raw_guid
        .map(|g| text::clean(g))
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| link.clone());

    Some(FeedItem {
        title,
        link,
        description,
        published_at,
        author,
        guid,
        enclosure,
    })
}

/// Pick the entry timestamp: the parser's own date when it understood one,
/// the recovered raw date string through the normalizer otherwise, and
/// "now" as the last resort. Approximate freshness beats a dropped item.
fn resolve_published(
    parsed: Option<DateTime<Utc>>,
    raw_date: Option<&str>,
    link: &str,
) -> DateTime<Utc> {
    if let Some(dt) = parsed {
        return dt;
    }
    if let Some(raw) = raw_date {
        match date::normalize(raw) {
            Ok(dt) => return dt,
            Err(e) => debug!(link, error = %e, "feed: unusable item date"),
        }
    }
    Utc::now()
}

/// The first matching tag's raw text content per `<item>`/`<entry>`, in
/// document order. `tags` is a regex alternation of tag names.
fn raw_entry_field(xml: &str, tags: &str) -> Vec<Option<String>> {
    let item_re = Regex::new(r"(?i)<(item|entry)[\s>]").expect("valid regex");
    let field_re = Regex::new(&format!(
        r"(?is)<(?:{tags})(?:\s[^>]*)?>\s*(?:<!\[CDATA\[)?([^<\]]+?)(?:\]\]>)?\s*</"
    ))
    .expect("valid regex");

    let starts: Vec<usize> = item_re.find_iter(xml).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(xml.len());
            field_re
                .captures(&xml[start..end])
                .map(|c| c[1].trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED_URL: &str = "https://example.com/rss";

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0"><channel>
<title>Test Kanal</title>
<link>https://example.com</link>
<description>Haberler</description>
{items}
</channel></rss>"#
        )
    }

    #[test]
    fn parses_plain_rss() {
        let body = rss(
            r#"<item>
<title>Ba&#351;l&#305;k bir</title>
<link>https://example.com/1</link>
<guid>tag-1</guid>
<description>&lt;p&gt;Kısa özet&lt;/p&gt;</description>
<pubDate>Sun, 15 Jun 2025 17:00:00 +0300</pubDate>
</item>"#,
        );
        let result = parse_feed(body.as_bytes(), FEED_URL).unwrap();
        assert_eq!(result.title, "Test Kanal");
        assert_eq!(result.items.len(), 1);

        let item = &result.items[0];
        assert_eq!(item.title, "Başlık bir");
        assert_eq!(item.description, "Kısa özet");
        assert_eq!(item.guid, "tag-1");
        assert_eq!(
            item.published_at,
            Utc.with_ymd_and_hms(2025, 6, 15, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn survives_control_characters() {
        let body = rss(
            "<item><title>Flash\x07 haber</title><link>https://example.com/2</link></item>",
        );
        let result = parse_feed(body.as_bytes(), FEED_URL).unwrap();
        assert_eq!(result.items[0].title, "Flash haber");
    }

    #[test]
    fn recovers_locale_date_feed_rs_drops() {
        let body = rss(
            r#"<item>
<title>Tarihli</title>
<link>https://example.com/3</link>
<pubDate>15.06.2025 - 17:00</pubDate>
</item>"#,
        );
        let result = parse_feed(body.as_bytes(), FEED_URL).unwrap();
        assert_eq!(
            result.items[0].published_at,
            Utc.with_ymd_and_hms(2025, 6, 15, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn guid_falls_back_to_link() {
        let body = rss("<item><title>t</title><link>https://example.com/4</link></item>");
        let result = parse_feed(body.as_bytes(), FEED_URL).unwrap();
        assert_eq!(result.items[0].guid, "https://example.com/4");
    }

    #[test]
    fn linkless_items_are_dropped() {
        let body = rss("<item><title>orphan</title></item>");
        let result = parse_feed(body.as_bytes(), FEED_URL).unwrap();
        assert!(result.items.is_empty());
    }

    #[test]
    fn garbage_fails_both_paths() {
        let err = parse_feed(b"this is not xml at all", FEED_URL).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[tokio::test]
    async fn http_404_is_a_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rss")
            .with_status(404)
            .create_async()
            .await;

        let reader = FeedReader::default();
        let err = reader
            .fetch(&format!("{}/rss", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Status { code: 404 }));
    }

    #[tokio::test]
    async fn fetches_and_parses_over_http() {
        let mut server = mockito::Server::new_async().await;
        let body = rss("<item><title>t</title><link>https://example.com/5</link></item>");
        let _mock = server
            .mock("GET", "/rss")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(body)
            .create_async()
            .await;

        let reader = FeedReader::default();
        let result = reader.fetch(&format!("{}/rss", server.url())).await.unwrap();
        assert_eq!(result.items.len(), 1);
    }
}
