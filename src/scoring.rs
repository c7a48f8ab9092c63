//! Keyword difficulty estimation.
//!
//! Difficulty rises with the install volume of the competitors and falls as
//! a keyword becomes more frequent across their listings. Output is always
//! an integer in `1..=100`.

use serde::{Deserialize, Serialize};

const MAX_DIFFICULTY: f64 = 100.0;
const INSTALL_SCALE: f64 = 100_000.0;
const FALLBACK_NUMERATOR: f64 = 50.0;

/// A keyword with its accumulated frequency score and estimated difficulty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoredKeyword {
    pub keyword: String,
    pub score: u64,
    pub difficulty: u8,
}

/// Mean of the positive install counts, or 0 when there are none.
pub fn average_installs(installs: &[u64]) -> f64 {
    let positive: Vec<f64> = installs
        .iter()
        .filter(|&&n| n > 0)
        .map(|&n| n as f64)
        .collect();
    if positive.is_empty() {
        return 0.0;
    }
    positive.iter().sum::<f64>() / positive.len() as f64
}

/// Difficulty for one keyword with frequency score `score`.
pub fn difficulty(score: f64, average_installs: f64) -> u8 {
    let scale = (average_installs / INSTALL_SCALE).max(1.0);
    let raw = (average_installs / (1.0 + score)) / scale.max(1.0);
    let bounded = raw.min(MAX_DIFFICULTY).round();

    if bounded.is_finite() && bounded > 0.0 {
        return bounded as u8;
    }

    (FALLBACK_NUMERATOR / (1.0 + score))
        .max(1.0)
        .min(MAX_DIFFICULTY)
        .round() as u8
}

/// Score the top `keyword_limit` entries of a descending frequency list.
pub fn score_keywords(
    sorted: &[(String, u64)],
    average_installs: f64,
    keyword_limit: usize,
) -> Vec<ScoredKeyword> {
    sorted
        .iter()
        .take(keyword_limit)
        .map(|(keyword, score)| ScoredKeyword {
            keyword: keyword.clone(),
            score: *score,
            difficulty: difficulty(*score as f64, average_installs),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn average_ignores_zero_and_handles_empty() {
        assert_eq!(average_installs(&[]), 0.0);
        assert_eq!(average_installs(&[0, 0]), 0.0);
        assert_eq!(average_installs(&[1_000, 0, 3_000]), 2_000.0);
    }

    #[test]
    fn no_installs_uses_fallback() {
        // 50 / (1 + 6) = 7.14
        assert_eq!(difficulty(6.0, 0.0), 7);
        assert_eq!(difficulty(0.0, 0.0), 50);
        assert_eq!(difficulty(1_000.0, 0.0), 1);
    }

    #[test]
    fn large_markets_saturate_at_100() {
        // avg 10M: scale 100, raw = 10M / 4 / 100 = 25_000
        assert_eq!(difficulty(3.0, 10_000_000.0), 100);
    }

    #[test]
    fn small_markets_scale_linearly() {
        // avg 50K: scale 1, raw = 50_000 / 1_001 ≈ 49.95
        assert_eq!(difficulty(1_000.0, 50_000.0), 50);
    }

    #[test]
    fn tiny_raw_value_rounds_to_fallback() {
        // raw = 10 / 101 ≈ 0.099 rounds to 0, fallback max(1, 50 / 101) = 1
        assert_eq!(difficulty(100.0, 10.0), 1);
    }

    #[test]
    fn difficulty_always_within_bounds() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..1000 {
            let score: f64 = rng.gen_range(0.0..10_000.0);
            let avg: f64 = if rng.gen_bool(0.2) {
                0.0
            } else {
                rng.gen_range(0.0..5_000_000_000.0)
            };
            let d = difficulty(score, avg);
            assert!((1..=100).contains(&d), "score={score} avg={avg} d={d}");
        }
    }

    #[test]
    fn score_keywords_takes_top_n_in_order() {
        let sorted: Vec<(String, u64)> = (0..200)
            .map(|i| (format!("kw{i}"), 500 - i as u64))
            .collect();
        let scored = score_keywords(&sorted, 0.0, 120);
        assert_eq!(scored.len(), 120);
        assert_eq!(scored[0].keyword, "kw0");
        assert_eq!(scored[119].keyword, "kw119");
        assert!(scored.iter().all(|k| (1..=100).contains(&k.difficulty)));
    }
}
