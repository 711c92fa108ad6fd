//! Heuristic extraction over a parsed document.
//!
//! Everything here is synchronous and side-effect free: the scraper
//! fetches bytes, this module turns them into structured content.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};

use haberdar_common::{text, urls};
use haberdar_feed::date;

use crate::score;

/// Raw extraction output before timing/transport bookkeeping is added.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub title: String,
    pub body: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub score: f64,
}

/// Extract structured article content from a page.
pub fn extract(html: &str, page_url: &str) -> Extracted {
    let doc = Html::parse_document(html);

    let title = extract_title(&doc);
    let body_pick = select_body(&doc);
    let (body, body_score) = match &body_pick {
        Some((el, s)) => (container_body(el), *s),
        None => (String::new(), 0.0),
    };

    let summary = extract_summary(&doc);
    let author = extract_author(&doc);
    let published_at = extract_date(&doc);
    let image_url = extract_image(&doc, body_pick.as_ref().map(|(el, _)| el), page_url);

    Extracted {
        title,
        body,
        summary,
        author,
        published_at,
        image_url,
        score: body_score,
    }
}

// --- Title ---

fn extract_title(doc: &Html) -> String {
    // Structured metadata wins when it is substantial
    if let Some(meta) = meta_content(
        doc,
        &[
            r#"meta[property="og:title"]"#,
            r#"meta[name="twitter:title"]"#,
        ],
    ) {
        if meta.chars().count() > score::META_TITLE_MIN_LEN {
            return meta;
        }
    }

    // Score every heading on the page
    let all_elements: Vec<ElementRef> = doc
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect();
    let total = all_elements.len().max(1);

    let mut best: Option<(f64, String)> = None;
    for (pos, el) in all_elements.iter().enumerate() {
        let name = el.value().name();
        if name != "h1" && name != "h2" {
            continue;
        }
        let txt = text::collapse_whitespace(&visible_text(*el));
        let len = txt.chars().count();
        if len == 0 {
            continue;
        }
        let parent_class = el
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| class_id(&p))
            .unwrap_or_default();
        let s = score::score_heading(len, pos as f64 / total as f64, &class_id(el), &parent_class);
        if best.as_ref().map_or(true, |(bs, _)| s > *bs) {
            best = Some((s, txt));
        }
    }

    if let Some((s, txt)) = &best {
        if *s > 0.0 {
            return txt.clone();
        }
    }
    if let Some(t) = page_title(doc) {
        return t;
    }
    best.map(|(_, txt)| txt).unwrap_or_default()
}

/// The `<title>` tag with the trailing " - Site" / " | Site" suffix
/// stripped.
fn page_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").expect("valid selector");
    let raw = doc.select(&sel).next()?;
    let cleaned = text::collapse_whitespace(&raw.text().collect::<String>());
    if cleaned.is_empty() {
        return None;
    }
    Some(strip_site_suffix(&cleaned))
}

fn strip_site_suffix(title: &str) -> String {
    for sep in [" - ", " | ", " \u{2013} "] {
        if let Some(idx) = title.rfind(sep) {
            let prefix = title[..idx].trim();
            if prefix.chars().count() >= score::META_TITLE_MIN_LEN {
                return prefix.to_string();
            }
        }
    }
    title.to_string()
}

// --- Body ---

fn select_body<'a>(doc: &'a Html) -> Option<(ElementRef<'a>, f64)> {
    let candidate_sel = Selector::parse("article, main, section, div").expect("valid selector");
    let p_sel = Selector::parse("p").expect("valid selector");
    let a_sel = Selector::parse("a").expect("valid selector");

    let mut best: Option<(ElementRef, f64)> = None;
    for el in doc.select(&candidate_sel) {
        if is_boilerplate(&el) || has_boilerplate_ancestor(&el) {
            continue;
        }

        let text_len = text::collapse_whitespace(&visible_text(el)).chars().count();
        if text_len <= score::BODY_MIN_TEXT_LEN {
            continue;
        }

        let paragraph_count = el
            .select(&p_sel)
            .filter(|p| !boilerplate_between(p, &el))
            .count();

        let link_text_len: usize = el
            .select(&a_sel)
            .filter(|a| !boilerplate_between(a, &el))
            .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
            .sum();

        let child_container_count = el
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| {
                matches!(
                    c.value().name(),
                    "div" | "section" | "ul" | "table" | "aside" | "figure"
                )
            })
            .count();

        let s = score::score_container(
            text_len,
            paragraph_count,
            &class_id(&el),
            child_container_count,
            link_text_len,
        );
        if best.as_ref().map_or(true, |(_, bs)| s > *bs) {
            best = Some((el, s));
        }
    }
    best
}

/// The winning container's paragraphs, its direct child blocks when it
/// has no paragraphs, or its raw text as the last resort.
fn container_body(el: &ElementRef) -> String {
    let p_sel = Selector::parse("p").expect("valid selector");

    let paragraphs: Vec<String> = el
        .select(&p_sel)
        .filter(|p| !boilerplate_between(p, el))
        .map(|p| text::collapse_whitespace(&visible_text(p)))
        .filter(|t| !t.is_empty())
        .collect();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    let blocks: Vec<String> = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| !is_boilerplate(c))
        .map(|c| text::collapse_whitespace(&visible_text(c)))
        .filter(|t| !t.is_empty())
        .collect();
    if !blocks.is_empty() {
        return blocks.join("\n\n");
    }

    text::collapse_whitespace(&visible_text(*el))
}

// --- Secondary fields ---

fn extract_summary(doc: &Html) -> Option<String> {
    meta_content(
        doc,
        &[
            r#"meta[property="og:description"]"#,
            r#"meta[name="twitter:description"]"#,
            r#"meta[name="description"]"#,
        ],
    )
    .or_else(|| {
        first_text(
            doc,
            &[".summary", ".spot", ".lead", ".excerpt", ".article-summary"],
        )
    })
}

fn extract_author(doc: &Html) -> Option<String> {
    meta_content(
        doc,
        &[
            r#"meta[name="author"]"#,
            r#"meta[property="article:author"]"#,
        ],
    )
    .or_else(|| {
        first_text(
            doc,
            &[
                ".author",
                ".yazar",
                "[rel=\"author\"]",
                ".author-name",
                ".byline",
            ],
        )
    })
}

fn extract_date(doc: &Html) -> Option<DateTime<Utc>> {
    if let Some(raw) = meta_content(
        doc,
        &[
            r#"meta[property="article:published_time"]"#,
            r#"meta[property="article:modified_time"]"#,
            r#"meta[name="publish-date"]"#,
            r#"meta[name="date"]"#,
        ],
    ) {
        if let Ok(dt) = date::normalize(&raw) {
            return Some(dt);
        }
    }

    let time_sel = Selector::parse("time[datetime]").expect("valid selector");
    if let Some(raw) = doc.select(&time_sel).find_map(|t| t.value().attr("datetime")) {
        if let Ok(dt) = date::normalize(raw) {
            return Some(dt);
        }
    }

    first_text(doc, &[".date", ".tarih", ".publish-date", ".article-date"])
        .and_then(|raw| date::normalize(&raw).ok())
}

fn extract_image(doc: &Html, body: Option<&ElementRef>, page_url: &str) -> Option<String> {
    if let Some(meta) = meta_content(
        doc,
        &[
            r#"meta[property="og:image"]"#,
            r#"meta[name="twitter:image"]"#,
        ],
    ) {
        return urls::absolutize(&meta, page_url);
    }

    let img_sel = Selector::parse("img[src]").expect("valid selector");
    let img = match body {
        Some(b) => b.select(&img_sel).next(),
        None => doc.select(&img_sel).next(),
    }?;
    urls::absolutize(img.value().attr("src")?, page_url)
}

// --- Shared helpers ---

fn meta_content(doc: &Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let s = Selector::parse(sel).expect("valid selector");
        if let Some(content) = doc.select(&s).find_map(|m| m.value().attr("content")) {
            let cleaned = text::clean(content);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let s = Selector::parse(sel).expect("valid selector");
        if let Some(el) = doc.select(&s).next() {
            let cleaned = text::collapse_whitespace(&visible_text(el));
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

fn class_id(el: &ElementRef) -> String {
    let e = el.value();
    format!(
        "{} {}",
        e.attr("class").unwrap_or(""),
        e.attr("id").unwrap_or("")
    )
}

fn is_boilerplate(el: &ElementRef) -> bool {
    let name = el.value().name();
    if score::BOILERPLATE_TAGS.contains(&name) {
        return true;
    }
    score::contains_keyword(&class_id(el), score::BOILERPLATE_KEYWORDS)
}

fn has_boilerplate_ancestor(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_boilerplate(&a))
}

/// True when a boilerplate element sits between `el` and `container`.
fn boilerplate_between(el: &ElementRef, container: &ElementRef) -> bool {
    for anc in el.ancestors() {
        if anc.id() == container.id() {
            return false;
        }
        if let Some(a) = ElementRef::wrap(anc) {
            if is_boilerplate(&a) {
                return true;
            }
        }
    }
    false
}

/// Text of the subtree, skipping boilerplate descendants.
fn visible_text(el: ElementRef) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                out.push_str(&t.text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_boilerplate(&child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}
