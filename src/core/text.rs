//! Text helpers shared by the detector and the recall engine
//!
//! Tokens are case-folded runs of alphanumerics (apostrophes kept so that
//! contractions like "isn't" stay one word).

use std::collections::HashSet;

/// Split text into lowercase words, keeping apostrophes inside words
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct words strictly longer than `min_len` characters
pub fn tokens(text: &str, min_len: usize) -> HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.chars().count() > min_len)
        .collect()
}

/// Jaccard similarity of two token sets; 0.0 when both are empty
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamp into [0, 1], mapping NaN to 0
pub fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_keep_contractions() {
        assert_eq!(
            words("The API isn't up; it DOESN\u{2019}T work."),
            vec!["the", "api", "isn't", "up", "it", "doesn't", "work"]
        );
    }

    #[test]
    fn test_tokens_min_len() {
        let t = tokens("the service is enabled", 3);
        assert!(t.contains("service"));
        assert!(t.contains("enabled"));
        assert!(!t.contains("the"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_jaccard() {
        let a = tokens("service enabled", 3);
        let b = tokens("service disabled", 3);
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard_empty_is_zero() {
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
        assert_eq!(jaccard(&tokens("a b c", 0), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_round2_and_unit() {
        assert_eq!(round2(0.6500000001), 0.65);
        assert_eq!(unit(1.4), 1.0);
        assert_eq!(unit(-0.2), 0.0);
        assert_eq!(unit(f64::NAN), 0.0);
    }
}
