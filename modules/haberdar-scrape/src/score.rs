//! Scoring weights for candidate selection.
//!
//! Extraction runs against unstructured, inconsistent markup with no
//! schema guarantee, so every bonus and penalty lives here as a named
//! constant: tunable in one place, testable in isolation.

/// Metadata titles shorter than this are ignored (og:title stuffed with
/// the site name alone, for example).
pub const META_TITLE_MIN_LEN: usize = 10;

// --- Heading (title) scoring ---

/// Ideal headline length band.
pub const TITLE_LEN_MIN: usize = 20;
pub const TITLE_LEN_MAX: usize = 150;
pub const TITLE_LENGTH_BONUS: f64 = 3.0;

/// Heading appears in the first third of the document.
pub const TITLE_POSITION_CUTOFF: f64 = 1.0 / 3.0;
pub const TITLE_POSITION_BONUS: f64 = 2.0;

/// Heading class/id carries a headline-ish keyword.
pub const TITLE_CLASS_BONUS: f64 = 5.0;
/// Parent container class/id carries a content-ish keyword.
pub const TITLE_PARENT_BONUS: f64 = 2.0;

pub const TITLE_KEYWORDS: &[&str] = &["title", "headline", "baslik", "başlık", "manset", "manşet"];

// --- Body container scoring ---

/// Containers with less text than this are never body candidates.
pub const BODY_MIN_TEXT_LEN: usize = 200;

/// Tiered length bonuses; cumulative, so a 2500-char container earns all
/// three.
pub const BODY_LEN_TIER_1: usize = 500;
pub const BODY_LEN_TIER_2: usize = 1000;
pub const BODY_LEN_TIER_3: usize = 2000;
pub const BODY_LEN_TIER_BONUS: f64 = 1.0;

/// Container class/id carries a content-ish keyword.
pub const BODY_KEYWORD_BONUS: f64 = 3.0;
pub const BODY_KEYWORDS: &[&str] = &[
    "content", "article", "body", "text", "story", "icerik", "içerik", "detay", "haber",
];

/// Paragraph-density bonuses; cumulative at the two tiers.
pub const BODY_PARA_TIER_1: usize = 3;
pub const BODY_PARA_TIER_2: usize = 5;
pub const BODY_PARA_BONUS: f64 = 1.5;

/// One child container per this many characters of text is tolerable;
/// denser nesting signals a layout grid, not an article.
pub const CHILD_PER_TEXT_CHARS: usize = 250;
pub const CHILD_RATIO_PENALTY: f64 = 2.0;

/// Links may cover at most this fraction of the text before the container
/// reads as navigation masquerading as content.
pub const LINK_TEXT_RATIO_MAX: f64 = 0.3;
pub const LINK_RATIO_PENALTY: f64 = 3.0;

/// Class/id fragments that mark a subtree as non-content.
pub const BOILERPLATE_KEYWORDS: &[&str] = &[
    "comment", "sidebar", "social", "share", "advert", "banner", "menu", "footer", "widget",
    "promo", "related", "breadcrumb", "paywall", "newsletter",
];

/// Tags removed wholesale before body scoring.
pub const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "aside", "footer", "form", "iframe", "noscript", "svg", "button",
    "select", "figcaption",
];

/// Score a heading candidate for title selection.
pub fn score_heading(
    text_len: usize,
    position_ratio: f64,
    class_id: &str,
    parent_class_id: &str,
) -> f64 {
    let mut score = 0.0;
    if (TITLE_LEN_MIN..=TITLE_LEN_MAX).contains(&text_len) {
        score += TITLE_LENGTH_BONUS;
    }
    if position_ratio <= TITLE_POSITION_CUTOFF {
        score += TITLE_POSITION_BONUS;
    }
    if contains_keyword(class_id, TITLE_KEYWORDS) {
        score += TITLE_CLASS_BONUS;
    }
    if contains_keyword(parent_class_id, BODY_KEYWORDS) {
        score += TITLE_PARENT_BONUS;
    }
    score
}

/// Score a block container as the article body candidate.
pub fn score_container(
    text_len: usize,
    paragraph_count: usize,
    class_id: &str,
    child_container_count: usize,
    link_text_len: usize,
) -> f64 {
    let mut score = 0.0;

    for tier in [BODY_LEN_TIER_1, BODY_LEN_TIER_2, BODY_LEN_TIER_3] {
        if text_len >= tier {
            score += BODY_LEN_TIER_BONUS;
        }
    }

    if contains_keyword(class_id, BODY_KEYWORDS) {
        score += BODY_KEYWORD_BONUS;
    }

    if paragraph_count > BODY_PARA_TIER_1 {
        score += BODY_PARA_BONUS;
    }
    if paragraph_count > BODY_PARA_TIER_2 {
        score += BODY_PARA_BONUS;
    }

    if child_container_count * CHILD_PER_TEXT_CHARS > text_len {
        score -= CHILD_RATIO_PENALTY;
    }

    if text_len > 0 && link_text_len as f64 / text_len as f64 > LINK_TEXT_RATIO_MAX {
        score -= LINK_RATIO_PENALTY;
    }

    score
}

pub fn contains_keyword(haystack: &str, keywords: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
