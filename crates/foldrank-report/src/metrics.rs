//! Metric value representation
//!
//! Every parser produces a flat `RawMetricSet` mapping metric names to
//! values. `Null` is a real value (the parser looked for the metric and
//! could not produce it), distinct from a key being absent entirely
//! (the tool that would produce it never ran).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single metric value as produced by a per-tool parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integer metric (counts)
    Int(i64),
    /// Floating-point metric (scores, energies, areas)
    Float(f64),
    /// Categorical metric (e.g. a database hit name)
    Text(String),
    /// Expected but missing or malformed
    Null,
}

impl MetricValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Float(v) => Some(*v),
            MetricValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Is this the null sentinel?
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }

    /// Parse a raw text field into the most specific value it supports.
    ///
    /// Integers stay `Int`, other numbers become `Float`, everything
    /// else is kept as `Text`. Empty fields are `Null`.
    pub fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MetricValue::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return MetricValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return MetricValue::Float(f);
        }
        MetricValue::Text(trimmed.to_string())
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Float(v) => {
                // Scientific notation for very small magnitudes (Kd values),
                // plain formatting otherwise
                if *v != 0.0 && v.abs() < 1e-3 {
                    write!(f, "{:e}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Text(s) => write!(f, "{}", s),
            MetricValue::Null => Ok(()),
        }
    }
}

/// Flat mapping of metric name to value for one parsed artifact.
///
/// BTreeMap keeps iteration order deterministic, which the report column
/// ordering and the merge tests rely on.
pub type RawMetricSet = BTreeMap<String, MetricValue>;

/// Convenience constructor used by the parsers
pub fn metric_set<I, K>(entries: I) -> RawMetricSet
where
    I: IntoIterator<Item = (K, MetricValue)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
