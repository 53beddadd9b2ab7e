//! Script text scrubbing.
//!
//! Narration must never read out URLs, outlet names, or citation cruft the
//! model copied from the article.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").unwrap());

static OUTLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:techcrunch|the verge|ars technica|wired|reuters|bloomberg|venturebeat|engadget|hacker news)\b",
    )
    .unwrap()
});

static BARE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\S+\.(?:com|org|net|io|ai|dev|tech|news)\b").unwrap());

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

/// Phrases that read as sourcing boilerplate when spoken.
static BANNED_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)according to (?:reports|the article)|sources say|as reported by|click the link|link in bio|in the description",
    )
    .unwrap()
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Remove source references and collapse whitespace.
pub fn sanitize(text: &str) -> String {
    let mut out = URL.replace_all(text, " ").into_owned();
    out = OUTLET.replace_all(&out, " ").into_owned();
    out = BARE_DOMAIN.replace_all(&out, " ").into_owned();
    out = CITATION.replace_all(&out, " ").into_owned();
    out = BANNED_PHRASE.replace_all(&out, " ").into_owned();

    MULTI_SPACE.replace_all(&out, " ").trim().to_string()
}
