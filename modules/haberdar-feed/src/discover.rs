//! Feed autodiscovery from page markup.

use regex::Regex;

use haberdar_common::urls;

/// Discover RSS/Atom feed URLs advertised in a webpage's `<link>` tags.
/// Relative hrefs are resolved against `base_url`; duplicates are kept in
/// first-seen order.
pub fn discover_feed_urls(html: &str, base_url: &str) -> Vec<String> {
    let link_re = Regex::new(
        r#"(?i)<link[^>]+type\s*=\s*["']application/(?:rss\+xml|atom\+xml)["'][^>]*>"#,
    )
    .expect("valid regex");
    let href_re = Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid regex");

    let mut seen = std::collections::HashSet::new();
    let mut feeds = Vec::new();

    for tag in link_re.find_iter(html) {
        let Some(href_cap) = href_re.captures(tag.as_str()) else {
            continue;
        };
        let Some(resolved) = urls::absolutize(&href_cap[1], base_url) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            feeds.push(resolved);
        }
    }

    feeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_and_absolutizes_feed_links() {
        let html = r#"<html><head>
<link rel="alternate" type="application/rss+xml" title="RSS" href="/rss.xml">
<link rel="alternate" type="application/atom+xml" href="https://example.com/atom.xml">
<link rel="stylesheet" href="/style.css">
</head></html>"#;

        let feeds = discover_feed_urls(html, "https://example.com/news");
        assert_eq!(
            feeds,
            vec![
                "https://example.com/rss.xml".to_string(),
                "https://example.com/atom.xml".to_string(),
            ]
        );
    }

    #[test]
    fn dedupes_repeated_links() {
        let html = r#"
<link type="application/rss+xml" href="/rss.xml">
<link type="application/rss+xml" href="/rss.xml">"#;
        let feeds = discover_feed_urls(html, "https://example.com");
        assert_eq!(feeds.len(), 1);
    }

    #[test]
    fn empty_when_no_feed_links() {
        assert!(discover_feed_urls("<html></html>", "https://example.com").is_empty());
    }
}
