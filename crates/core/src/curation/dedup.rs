//! Near-duplicate detection against already-produced content.

use crate::embedding::similarity;
use crate::repository::SourceItem;

/// Characters of article body included in the fingerprint.
const FINGERPRINT_BODY_CHARS: usize = 200;

/// Text fingerprint an article is embedded from: the title plus the opening
/// of the body.
pub fn fingerprint(item: &SourceItem) -> String {
    let excerpt: String = item.body.chars().take(FINGERPRINT_BODY_CHARS).collect();
    format!("{} {}", item.title, excerpt)
}

/// In-memory set of embeddings for one curation cycle.
///
/// Seeded from completed productions, grows as candidates are accepted, and
/// is discarded when the cycle ends. Shared across tracks so cross-track
/// duplicates are caught too.
pub struct DedupCorpus {
    entries: Vec<(String, Vec<f32>)>,
    threshold: f64,
}

impl DedupCorpus {
    pub fn new(threshold: f64) -> Self {
        Self {
            entries: Vec::new(),
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, text: String, embedding: Vec<f32>) {
        self.entries.push((text, embedding));
    }

    /// True when the embedding is strictly more similar than the threshold
    /// to any corpus entry. Exactly-at-threshold is not a duplicate.
    pub fn is_duplicate(&self, embedding: &[f32]) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, existing)| similarity(embedding, existing) > self.threshold)
            .map(|(text, _)| text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_item(title: &str, body: &str) -> SourceItem {
        SourceItem {
            id: 1,
            title: title.to_string(),
            body: body.to_string(),
            popularity: 0,
            reply_count: 0,
            persona: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fingerprint_combines_title_and_excerpt() {
        let item = make_item("Headline", "body text");
        assert_eq!(fingerprint(&item), "Headline body text");
    }

    #[test]
    fn test_fingerprint_truncates_long_body() {
        let item = make_item("T", &"x".repeat(500));
        let fp = fingerprint(&item);
        assert_eq!(fp.len(), "T ".len() + 200);
    }

    #[test]
    fn test_fingerprint_truncates_on_char_boundary() {
        // Multibyte characters must not be split
        let item = make_item("T", &"é".repeat(300));
        let fp = fingerprint(&item);
        assert_eq!(fp.chars().count(), 2 + 200);
    }

    #[test]
    fn test_duplicate_above_threshold() {
        let mut corpus = DedupCorpus::new(0.90);
        corpus.insert("existing".to_string(), vec![1.0, 0.0]);

        // Identical vector: similarity 1.0 > 0.90
        assert_eq!(corpus.is_duplicate(&[1.0, 0.0]), Some("existing"));
    }

    #[test]
    fn test_exactly_at_threshold_is_not_duplicate() {
        // Similarity of these unit vectors is exactly cos(theta); pick
        // vectors whose cosine equals the threshold.
        let threshold = 0.6;
        let mut corpus = DedupCorpus::new(threshold);
        corpus.insert("existing".to_string(), vec![1.0, 0.0]);

        // cos = 0.6 exactly
        assert_eq!(corpus.is_duplicate(&[0.6, 0.8]), None);
    }

    #[test]
    fn test_dissimilar_is_not_duplicate() {
        let mut corpus = DedupCorpus::new(0.90);
        corpus.insert("existing".to_string(), vec![1.0, 0.0]);
        assert_eq!(corpus.is_duplicate(&[0.0, 1.0]), None);
    }

    #[test]
    fn test_empty_corpus_never_matches() {
        let corpus = DedupCorpus::new(0.0);
        assert_eq!(corpus.is_duplicate(&[1.0, 0.0]), None);
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_corpus_grows_monotonically() {
        let mut corpus = DedupCorpus::new(0.90);
        assert_eq!(corpus.len(), 0);
        corpus.insert("a".to_string(), vec![1.0, 0.0]);
        corpus.insert("b".to_string(), vec![0.0, 1.0]);
        assert_eq!(corpus.len(), 2);

        // Both entries now reject near-identical newcomers
        assert!(corpus.is_duplicate(&[0.99, 0.01]).is_some());
        assert!(corpus.is_duplicate(&[0.01, 0.99]).is_some());
    }
}
