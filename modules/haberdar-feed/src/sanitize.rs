//! Byte-level repair for feeds that are almost, but not quite, XML.
//!
//! Real-world publisher feeds routinely carry a UTF-16 BOM, stray control
//! characters from CMS copy-paste, double-encoded entities, and CDATA
//! sections that never close. The parser gets the repaired stream first;
//! the reader falls back to the raw bytes if the repair itself broke an
//! otherwise-parseable document.

use regex::Regex;

/// Decode a raw feed body into repaired XML text.
pub fn sanitize_xml(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = strip_bom(&text);
    let text = strip_control_chars(text);
    let text = collapse_double_entities(&text);
    let text = close_open_cdata(text);
    force_utf8_declaration(&text)
}

fn strip_bom(text: &str) -> &str {
    text.trim_start_matches('\u{feff}')
}

/// Drop control characters that are invalid in XML 1.0. Tab, LF and CR
/// stay.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Collapse one level of double encoding: `&amp;amp;` becomes `&amp;`,
/// `&amp;lt;` becomes `&lt;`.
fn collapse_double_entities(text: &str) -> String {
    let re = Regex::new(r"&amp;(amp|lt|gt|quot|apos|#x?[0-9a-fA-F]+);").expect("valid regex");
    re.replace_all(text, "&$1;").into_owned()
}

/// Close any CDATA section left open, otherwise the parser swallows the
/// rest of the document.
fn close_open_cdata(text: String) -> String {
    let opens = text.matches("<![CDATA[").count();
    let closes = text.matches("]]>").count();
    if opens > closes {
        let mut fixed = text;
        for _ in 0..(opens - closes) {
            fixed.push_str("]]>");
        }
        fixed
    } else {
        text
    }
}

/// Rewrite the declared encoding to UTF-8. The body has already been
/// decoded lossily, so a stale `encoding="iso-8859-9"` declaration would
/// make the parser mangle it a second time.
fn force_utf8_declaration(text: &str) -> String {
    let re = Regex::new(r#"(<\?xml[^>]*encoding=["'])([^"']+)(["'])"#).expect("valid regex");
    re.replace(text, "${1}utf-8${3}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_double_encoded_ampersand_once() {
        assert_eq!(collapse_double_entities("a &amp;amp; b"), "a &amp; b");
        // Already-correct entities are untouched
        assert_eq!(collapse_double_entities("a &amp; b"), "a &amp; b");
    }

    #[test]
    fn strips_bell_character_and_rest_survives() {
        let dirty = "<rss><channel><title>News\x07flash</title></channel></rss>";
        let clean = sanitize_xml(dirty.as_bytes());
        assert_eq!(
            clean,
            "<rss><channel><title>Newsflash</title></channel></rss>"
        );
    }

    #[test]
    fn keeps_tabs_and_newlines() {
        let text = "<a>\n\tx\r\n</a>";
        assert_eq!(sanitize_xml(text.as_bytes()), text);
    }

    #[test]
    fn strips_leading_bom() {
        let with_bom = "\u{feff}<rss/>";
        assert_eq!(sanitize_xml(with_bom.as_bytes()), "<rss/>");
    }

    #[test]
    fn closes_unterminated_cdata() {
        let broken = "<item><title><![CDATA[Breaking</title></item>";
        let fixed = sanitize_xml(broken.as_bytes());
        assert!(fixed.ends_with("]]>"));
    }

    #[test]
    fn rewrites_declared_encoding() {
        let decl = r#"<?xml version="1.0" encoding="iso-8859-9"?><rss/>"#;
        let fixed = sanitize_xml(decl.as_bytes());
        assert!(fixed.contains(r#"encoding="utf-8""#));
    }
}
