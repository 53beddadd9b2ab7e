//! Composite candidate scoring.

use crate::repository::SourceItem;

use super::trends::{trend_matches, TrendingKeyword};

/// Composite curation score.
///
/// Components and their caps:
/// - reply sentiment quality, weighted 0.4 (max 4.0)
/// - trending keywords matched in the title, 1 point each (max 3.0)
/// - reply volume, 0.2 per reply (max 2.0)
/// - raw popularity, 1 point per 200 (max 1.0)
pub fn composite_score(
    item: &SourceItem,
    sentiment_quality: f64,
    trends: &[TrendingKeyword],
) -> f64 {
    let sentiment_part = 0.4 * sentiment_quality;
    let trend_part = (trend_matches(&item.title, trends) as f64).min(3.0);
    let reply_part = (item.reply_count as f64 / 10.0 * 2.0).min(2.0);
    let popularity_part = (item.popularity as f64 / 200.0).min(1.0);

    sentiment_part + trend_part + reply_part + popularity_part
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_item(title: &str, popularity: i64, reply_count: i64) -> SourceItem {
        SourceItem {
            id: 1,
            title: title.to_string(),
            body: String::new(),
            popularity,
            reply_count,
            persona: None,
            created_at: Utc::now(),
        }
    }

    fn keyword(k: &str) -> TrendingKeyword {
        TrendingKeyword {
            keyword: k.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_all_components_max_out() {
        let trends = vec![
            keyword("nvidia"),
            keyword("gemini"),
            keyword("anthropic"),
            keyword("mistral"),
        ];
        let item = make_item("Nvidia Gemini Anthropic Mistral showdown", 10_000, 100);
        // 0.4*10 + 3 + 2 + 1
        assert_eq!(composite_score(&item, 10.0, &trends), 10.0);
    }

    #[test]
    fn test_trend_component_capped_at_three() {
        let trends = vec![
            keyword("nvidia"),
            keyword("gemini"),
            keyword("anthropic"),
            keyword("mistral"),
        ];
        let item = make_item("Nvidia Gemini Anthropic Mistral", 0, 0);
        assert_eq!(composite_score(&item, 0.0, &trends), 3.0);
    }

    #[test]
    fn test_reply_component_scales_then_caps() {
        let item = make_item("plain", 0, 5);
        assert_eq!(composite_score(&item, 0.0, &[]), 1.0);

        let item = make_item("plain", 0, 50);
        assert_eq!(composite_score(&item, 0.0, &[]), 2.0);
    }

    #[test]
    fn test_popularity_component() {
        let item = make_item("plain", 100, 0);
        assert_eq!(composite_score(&item, 0.0, &[]), 0.5);
    }
}
