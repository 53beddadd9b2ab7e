//! Trend extraction over recently ingested articles.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::repository::SourceItem;

/// Capitalized tokens of three or more characters (product and company names)
static PROPER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9]{2,}\b").unwrap());

/// Domain terms tracked regardless of capitalization
const TRACKED_TERMS: &[&str] = &[
    "ai", "agent", "agents", "benchmark", "chip", "gpu", "llm", "model", "models",
    "open-source", "robot", "robotics", "startup",
];

/// Capitalized words that are sentence furniture, not topics
const STOPWORDS: &[&str] = &[
    "After", "All", "And", "Because", "But", "For", "From", "Here", "How", "Its",
    "Just", "New", "Not", "Now", "One", "Our", "She", "The", "They", "This",
    "Today", "What", "When", "Why", "With", "You",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingKeyword {
    pub keyword: String,
    pub score: f64,
}

/// Extract topic keywords from one text.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = PROPER_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect();

    let lowered = text.to_lowercase();
    for term in TRACKED_TERMS {
        if lowered.split_whitespace().any(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-') == *term
        }) {
            keywords.push(term.to_string());
        }
    }

    keywords
}

/// Rank keywords across recent articles by frequency weighted with the
/// popularity of the articles carrying them. Returns at most `top_n`.
pub fn trending_keywords(items: &[SourceItem], top_n: usize) -> Vec<TrendingKeyword> {
    let mut scores: HashMap<String, f64> = HashMap::new();

    for item in items {
        let mut seen_in_item: Vec<String> = Vec::new();
        for keyword in extract_keywords(&item.title)
            .into_iter()
            .chain(extract_keywords(&item.body))
        {
            let canonical = keyword.to_lowercase();
            // One mention per article per keyword
            if seen_in_item.contains(&canonical) {
                continue;
            }
            seen_in_item.push(canonical.clone());
            *scores.entry(canonical).or_insert(0.0) +=
                1.0 + (item.popularity as f64 / 100.0).min(5.0);
        }
    }

    let mut ranked: Vec<TrendingKeyword> = scores
        .into_iter()
        .map(|(keyword, score)| TrendingKeyword { keyword, score })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    ranked.truncate(top_n);
    ranked
}

/// How many trending keywords appear in the given title.
pub fn trend_matches(title: &str, trends: &[TrendingKeyword]) -> usize {
    let lowered = title.to_lowercase();
    trends
        .iter()
        .filter(|t| lowered.contains(&t.keyword))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_item(id: i64, title: &str, body: &str, popularity: i64) -> SourceItem {
        SourceItem {
            id,
            title: title.to_string(),
            body: body.to_string(),
            popularity,
            reply_count: 0,
            persona: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_keywords_proper_nouns() {
        let keywords = extract_keywords("Nvidia ships a new Blackwell variant");
        assert!(keywords.contains(&"Nvidia".to_string()));
        assert!(keywords.contains(&"Blackwell".to_string()));
    }

    #[test]
    fn test_extract_keywords_skips_stopwords() {
        let keywords = extract_keywords("The New thing from Anthropic");
        assert!(!keywords.contains(&"The".to_string()));
        assert!(!keywords.contains(&"New".to_string()));
        assert!(keywords.contains(&"Anthropic".to_string()));
    }

    #[test]
    fn test_extract_keywords_tracked_terms() {
        let keywords = extract_keywords("the new model beats every benchmark");
        assert!(keywords.contains(&"model".to_string()));
        assert!(keywords.contains(&"benchmark".to_string()));
    }

    #[test]
    fn test_trending_popularity_weighting() {
        let items = vec![
            make_item(1, "Nvidia earnings", "", 400),
            make_item(2, "Quiet Gemini update", "", 0),
            make_item(3, "More Gemini news", "", 0),
        ];
        let trends = trending_keywords(&items, 10);
        let nvidia = trends.iter().find(|t| t.keyword == "nvidia").unwrap();
        let gemini = trends.iter().find(|t| t.keyword == "gemini").unwrap();

        // One popular mention outweighs two quiet ones
        assert!(nvidia.score > gemini.score);
    }

    #[test]
    fn test_trending_counts_once_per_article() {
        let items = vec![make_item(1, "Gemini Gemini Gemini", "Gemini again", 0)];
        let trends = trending_keywords(&items, 10);
        let gemini = trends.iter().find(|t| t.keyword == "gemini").unwrap();
        assert_eq!(gemini.score, 1.0);
    }

    #[test]
    fn test_trending_respects_top_n() {
        let items = vec![make_item(1, "Nvidia Anthropic Gemini Mistral", "", 0)];
        assert_eq!(trending_keywords(&items, 2).len(), 2);
    }

    #[test]
    fn test_trend_matches() {
        let trends = vec![
            TrendingKeyword {
                keyword: "nvidia".to_string(),
                score: 3.0,
            },
            TrendingKeyword {
                keyword: "gemini".to_string(),
                score: 2.0,
            },
        ];
        assert_eq!(trend_matches("Nvidia responds to Gemini", &trends), 2);
        assert_eq!(trend_matches("Quiet day in tech", &trends), 0);
    }
}
