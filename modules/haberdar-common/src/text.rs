//! Markup stripping and whitespace normalization shared by the feed
//! reader and the scraper.

use regex::Regex;

/// Strip markup and entities from a fragment and collapse whitespace.
pub fn clean(raw: &str) -> String {
    let stripped = strip_tags(raw);
    let decoded = decode_entities(&stripped);
    collapse_whitespace(&decoded)
}

/// Remove script/style subtrees, then every remaining tag.
pub fn strip_tags(html: &str) -> String {
    let container_re = Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>")
        .expect("valid regex");
    let without_containers = container_re.replace_all(html, " ");

    let comment_re = Regex::new(r"(?s)<!--.*?-->").expect("valid regex");
    let without_comments = comment_re.replace_all(&without_containers, " ");

    let tag_re = Regex::new(r"<[^>]*>").expect("valid regex");
    tag_re.replace_all(&without_comments, " ").into_owned()
}

/// Decode the named entities that actually occur in feed payloads, plus
/// numeric references. Unknown entities are left as-is.
pub fn decode_entities(text: &str) -> String {
    let mut out = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rdquo;", "\u{201d}")
        .replace("&ldquo;", "\u{201c}")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}");

    let numeric_re = Regex::new(r"&#(x?[0-9a-fA-F]+);").expect("valid regex");
    out = numeric_re
        .replace_all(&out, |caps: &regex::Captures| {
            let body = &caps[1];
            let code = if let Some(hex) = body.strip_prefix('x') {
                u32::from_str_radix(hex, 16).ok()
            } else {
                body.parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    // &amp; last, so "&amp;lt;" does not turn into "<"
    out.replace("&amp;", "&")
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace but keep paragraph breaks: runs containing two or
/// more newlines become a single blank line.
pub fn collapse_preserving_paragraphs(text: &str) -> String {
    let para_re = Regex::new(r"\n\s*\n").expect("valid regex");
    let paragraphs: Vec<String> = para_re
        .split(text)
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect();
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses() {
        let html = "<div>  Hello <b>world</b>\n\n  again </div>";
        assert_eq!(clean(html), "Hello world again");
    }

    #[test]
    fn removes_script_content_entirely() {
        let html = "<p>before</p><script>var x = '<evil>';</script><p>after</p>";
        assert_eq!(clean(html), "before after");
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
    }

    #[test]
    fn amp_decoded_last() {
        // Double-encoded input decodes one level, not two
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn keeps_paragraph_breaks() {
        let text = "first  line\n\n\nsecond   line";
        assert_eq!(
            collapse_preserving_paragraphs(text),
            "first line\n\nsecond line"
        );
    }
}
