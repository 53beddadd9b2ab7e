//! Lexicon-based reply sentiment.
//!
//! A small built-in polarity lexicon stands in for a full sentiment model;
//! replies are short and informal, so coverage of common opinion words is
//! what matters.

/// Word polarity weights, roughly on a [-4, 4] scale.
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("brilliant", 2.8),
    ("cool", 1.3),
    ("excellent", 2.7),
    ("excited", 2.2),
    ("fantastic", 2.6),
    ("fascinating", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("helpful", 1.9),
    ("huge", 1.3),
    ("impressive", 2.3),
    ("incredible", 2.6),
    ("interesting", 1.7),
    ("love", 3.2),
    ("perfect", 2.7),
    ("promising", 1.8),
    ("revolutionary", 2.2),
    ("smart", 1.8),
    ("solid", 1.5),
    ("useful", 1.8),
    ("win", 2.8),
    ("wow", 2.8),
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("broken", -1.8),
    ("disappointing", -2.2),
    ("dumb", -2.3),
    ("fail", -2.3),
    ("fake", -2.0),
    ("garbage", -2.7),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("hype", -0.8),
    ("overrated", -1.7),
    ("scam", -2.6),
    ("scary", -1.9),
    ("stupid", -2.4),
    ("terrible", -2.1),
    ("trash", -2.6),
    ("useless", -1.9),
    ("worst", -3.1),
    ("wrong", -1.6),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "isnt", "isn't", "dont", "don't"];

/// Compound polarity of one text, in [-1, 1].
pub fn compound(text: &str) -> f64 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .collect();

    let mut sum = 0.0;
    for (i, word) in words.iter().enumerate() {
        let Some(&(_, weight)) = LEXICON.iter().find(|(w, _)| w == word) else {
            continue;
        };
        let negated = i > 0 && NEGATIONS.contains(&words[i - 1].as_str());
        sum += if negated { -weight } else { weight };
    }

    // Normalize into [-1, 1], saturating for long rants
    sum / (sum * sum + 15.0).sqrt()
}

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Audience-quality score for an article's replies, in [0, 10].
///
/// Strong positive engagement scores high, pile-ons score low, silence lands
/// near the neutral baseline.
pub fn reply_quality(replies: &[String]) -> f64 {
    if replies.is_empty() {
        return 1.0;
    }

    let scores: Vec<f64> = replies.iter().map(|r| compound(r)).collect();
    let n = scores.len() as f64;
    let positive = scores.iter().filter(|s| **s > POSITIVE_THRESHOLD).count() as f64;
    let negative = scores.iter().filter(|s| **s < NEGATIVE_THRESHOLD).count() as f64;
    let avg = scores.iter().sum::<f64>() / n;

    let score =
        (positive / n) * 4.0 - (negative / n) * 3.0 + (avg + 1.0) + (n / 10.0).min(1.0);
    score.clamp(0.0, 10.0)
}
