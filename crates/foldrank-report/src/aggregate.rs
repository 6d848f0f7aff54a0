//! Metric aggregation: accumulating per-tool results into design records
//!
//! The aggregator is the single writer of the in-memory record
//! collection. It consumes `(Identity, RawMetricSet)` pairs in arbitrary
//! order and flattens once, at the end, into immutable candidates.
//! Later writes for the same `(design, model, metric)` overwrite earlier
//! ones; with two tools writing the same key for the same identity the
//! merge is order-dependent, which is the documented compatibility
//! behavior, not an accident of iteration order.

use crate::identity::Identity;
use crate::metrics::RawMetricSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All metrics accumulated for one design
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignRecord {
    /// Tool-invariant metrics that apply to every model of the design
    pub design_metrics: RawMetricSet,
    /// Per-model metric sets, keyed by model id
    pub models: BTreeMap<String, RawMetricSet>,
}

/// One scorable candidate: a design, optionally crossed with a model,
/// carrying the union of its design-level and model-level metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Design identifier
    pub design_id: String,
    /// Model / sequence variant; `None` for design-level-only candidates
    pub model_id: Option<String>,
    /// Union of design-level and model-level metrics (model wins collisions)
    pub metrics: RawMetricSet,
    /// Composite ranking score (higher is better)
    pub composite_score: f64,
    /// Number of non-null weighted metrics that contributed to the score;
    /// 0 distinguishes "nothing to score" from a score near zero
    pub contributing_metrics: usize,
    /// 1-based rank after sorting (0 until ranked)
    pub rank: usize,
}

impl Candidate {
    /// Identity of this candidate
    pub fn identity(&self) -> Identity {
        Identity {
            design_id: self.design_id.clone(),
            model_id: self.model_id.clone(),
        }
    }
}

/// Accumulates parser output into `DesignRecord`s, then flattens
#[derive(Debug, Default)]
pub struct Aggregator {
    records: BTreeMap<String, DesignRecord>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one parsed artifact into the record collection.
    ///
    /// Design-level identities write into the design set; model-level
    /// identities into that model's set. Records are created lazily on
    /// first reference and never deleted during a run.
    pub fn insert(&mut self, identity: Identity, metrics: RawMetricSet) {
        let record = self.records.entry(identity.design_id).or_default();
        match identity.model_id {
            None => record.design_metrics.extend(metrics),
            Some(model_id) => {
                record.models.entry(model_id).or_default().extend(metrics);
            }
        }
    }

    /// Number of designs seen so far
    pub fn n_designs(&self) -> usize {
        self.records.len()
    }

    /// Total number of scorable identities: each model counts once, and a
    /// design with no models counts as one design-level candidate
    pub fn n_candidates(&self) -> usize {
        self.records
            .values()
            .map(|r| r.models.len().max(1))
            .sum()
    }

    /// Read access to an accumulated record
    pub fn record(&self, design_id: &str) -> Option<&DesignRecord> {
        self.records.get(design_id)
    }

    /// Flatten the record collection into one candidate per scorable
    /// identity.
    ///
    /// Each model inherits the design-level metrics, with its own values
    /// taking precedence on key collision. A design with no model-level
    /// artifacts yields a single design-level candidate. Metrics a
    /// candidate never received stay absent; the reporter renders the
    /// gaps, it does not invent values.
    pub fn flatten(&self) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(self.n_candidates());

        for (design_id, record) in &self.records {
            if record.models.is_empty() {
                candidates.push(Candidate {
                    design_id: design_id.clone(),
                    model_id: None,
                    metrics: record.design_metrics.clone(),
                    composite_score: 0.0,
                    contributing_metrics: 0,
                    rank: 0,
                });
                continue;
            }

            for (model_id, model_metrics) in &record.models {
                let mut metrics = record.design_metrics.clone();
                // Model-level keys win on collision
                metrics.extend(model_metrics.clone());
                candidates.push(Candidate {
                    design_id: design_id.clone(),
                    model_id: Some(model_id.clone()),
                    metrics,
                    composite_score: 0.0,
                    contributing_metrics: 0,
                    rank: 0,
                });
            }
        }

        candidates
    }
}
