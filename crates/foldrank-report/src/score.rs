//! Composite score computation
//!
//! One comparable number per candidate, from whichever weighted metrics
//! that candidate actually has. The total is normalized by the number of
//! contributing metrics, not the table size, so a candidate missing
//! optional metrics is not penalized for the gap. The trade-off: scores
//! of candidates with very different metric coverage are not strictly
//! comparable. That is a documented limitation, not a defect.

use crate::aggregate::Candidate;
use crate::config::ScoreWeights;
use crate::metrics::RawMetricSet;

/// Weighted scorer over a candidate's metric set
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: ScoreWeights,
}

impl CompositeScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Compute the composite score and the contributing-metric count.
    ///
    /// A candidate with zero contributing metrics scores exactly 0.0 with
    /// count 0; the count is what distinguishes it from a real score that
    /// happens to round to zero.
    pub fn compute(&self, metrics: &RawMetricSet) -> (f64, usize) {
        let mut total = 0.0;
        let mut count = 0usize;

        for (metric, weight) in self.weights.iter() {
            if let Some(value) = metrics.get(metric).and_then(|v| v.as_f64()) {
                total += weight * value;
                count += 1;
            }
        }

        if count == 0 {
            return (0.0, 0);
        }
        (total / count as f64, count)
    }

    /// Score a batch of candidates in place
    pub fn score_candidates(&self, candidates: &mut [Candidate]) {
        for candidate in candidates.iter_mut() {
            let (score, count) = self.compute(&candidate.metrics);
            candidate.composite_score = score;
            candidate.contributing_metrics = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{metric_set, MetricValue};

    #[test]
    fn test_score_normalized_by_contributing_count() {
        let scorer = CompositeScorer::new(ScoreWeights::default());

        // Full coverage of two metrics: (-1 * 4.0 + 1 * 0.8) / 2
        let metrics = metric_set([
            ("ipsae_score", MetricValue::Float(4.0)),
            ("model_confidence", MetricValue::Float(0.8)),
        ]);
        let (score, count) = scorer.compute(&metrics);
        assert_eq!(count, 2);
        assert!((score - (-4.0 + 0.8) / 2.0).abs() < 1e-12);

        // Same values but only one present: -4.0 / 1
        let metrics = metric_set([("ipsae_score", MetricValue::Float(4.0))]);
        let (score, count) = scorer.compute(&metrics);
        assert_eq!(count, 1);
        assert!((score + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_and_unweighted_metrics_do_not_contribute() {
        let scorer = CompositeScorer::new(ScoreWeights::default());
        let metrics = metric_set([
            ("ipsae_score", MetricValue::Null),
            ("foldseek_top_bits", MetricValue::Float(245.0)),
            ("foldseek_top_hit", MetricValue::Text("PDB_5ABC".into())),
        ]);
        let (score, count) = scorer.compute(&metrics);
        assert_eq!(score, 0.0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_zero_contributors_is_exactly_zero() {
        let scorer = CompositeScorer::new(ScoreWeights::default());
        let (score, count) = scorer.compute(&RawMetricSet::new());
        assert_eq!(score, 0.0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_integer_metrics_contribute_numerically() {
        let scorer = CompositeScorer::new(ScoreWeights::default());
        let metrics = metric_set([("num_interface_contacts", MetricValue::Int(80))]);
        let (score, count) = scorer.compute(&metrics);
        assert_eq!(count, 1);
        assert!((score - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_coverage_ranks_by_normalized_score() {
        // Two candidates with identical individual values: one with both
        // metrics present, one with a single metric. Their scores follow
        // the per-candidate normalization, not the raw weighted sums.
        let scorer = CompositeScorer::new(ScoreWeights::default());

        let full = metric_set([
            ("model_confidence", MetricValue::Float(0.9)),
            ("ipsae_score", MetricValue::Float(3.0)),
        ]);
        let sparse = metric_set([("model_confidence", MetricValue::Float(0.9))]);

        let (full_score, full_count) = scorer.compute(&full);
        let (sparse_score, sparse_count) = scorer.compute(&sparse);

        assert_eq!(full_count, 2);
        assert_eq!(sparse_count, 1);
        // (0.9 - 3.0) / 2 = -1.05 vs 0.9 / 1 = 0.9
        assert!(sparse_score > full_score);
        assert!((full_score + 1.05).abs() < 1e-12);
        assert!((sparse_score - 0.9).abs() < 1e-12);
    }
}
