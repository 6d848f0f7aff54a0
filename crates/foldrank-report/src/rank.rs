//! Candidate ranking

use crate::aggregate::Candidate;
use serde::{Deserialize, Serialize};

/// The terminal, ordered result of a consolidation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedReport {
    /// Candidates sorted by composite score descending, ranks assigned
    pub candidates: Vec<Candidate>,
}

impl RankedReport {
    /// Sort candidates by score and assign 1-based ranks.
    ///
    /// The sort is stable: ties preserve the incoming order, which is
    /// itself deterministic because the locator sorts artifact paths.
    /// An empty input produces a valid empty report.
    pub fn from_scored(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (i, candidate) in candidates.iter_mut().enumerate() {
            candidate.rank = i + 1;
        }

        Self { candidates }
    }

    /// Number of ranked candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Is the report empty?
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best candidate, if any
    pub fn top(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RawMetricSet;

    fn candidate(design: &str, score: f64) -> Candidate {
        Candidate {
            design_id: design.to_string(),
            model_id: None,
            metrics: RawMetricSet::new(),
            composite_score: score,
            contributing_metrics: 1,
            rank: 0,
        }
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let candidates = vec![
            candidate("low", -2.0),
            candidate("tie_first", 1.5),
            candidate("tie_second", 1.5),
            candidate("high", 3.0),
        ];

        let report = RankedReport::from_scored(candidates);
        let order: Vec<&str> = report
            .candidates
            .iter()
            .map(|c| c.design_id.as_str())
            .collect();
        assert_eq!(order, ["high", "tie_first", "tie_second", "low"]);
        assert_eq!(report.candidates[0].rank, 1);
        assert_eq!(report.candidates[3].rank, 4);
    }

    #[test]
    fn test_empty_input_is_valid_report() {
        let report = RankedReport::from_scored(Vec::new());
        assert!(report.is_empty());
        assert!(report.top().is_none());
    }
}
