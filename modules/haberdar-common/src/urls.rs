/// Strip tracking parameters from URLs so the same article shared through
/// different channels dedups to one key.
pub fn sanitize_url(url: &str) -> String {
    const TRACKING_PARAMS: &[&str] = &[
        "fbclid",
        "gclid",
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "ref",
        "mc_cid",
        "mc_eid",
    ];

    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    if parsed.query().is_none() {
        return url.to_string();
    }

    let clean_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(clean_pairs);
    }

    parsed.to_string()
}

/// Resolve a possibly-relative URL against a base page URL.
pub fn absolutize(href: &str, base_url: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = url::Url::parse(base_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utm_params() {
        let url = "https://example.com/story?utm_source=x&id=5";
        assert_eq!(sanitize_url(url), "https://example.com/story?id=5");
    }

    #[test]
    fn drops_query_when_only_tracking() {
        let url = "https://example.com/story?utm_source=x&fbclid=abc";
        assert_eq!(sanitize_url(url), "https://example.com/story");
    }

    #[test]
    fn passes_through_unparseable() {
        assert_eq!(sanitize_url("not a url"), "not a url");
    }

    #[test]
    fn absolutizes_relative_href() {
        assert_eq!(
            absolutize("/img/hero.jpg", "https://example.com/news/story").as_deref(),
            Some("https://example.com/img/hero.jpg")
        );
        assert_eq!(
            absolutize("https://cdn.example.com/a.jpg", "https://example.com").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }
}
