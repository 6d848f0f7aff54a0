//! FOLDRANK metric consolidation and ranked reporting
//!
//! Consolidates heterogeneous per-design quality metrics from the binder
//! design pipeline into a single ranked report. Each upstream stage
//! (structure generation, sequence redesign, interface scoring, binding
//! affinity prediction, structural similarity search) writes its own file
//! format and naming scheme; no tool knows about the others.
//!
//! # Pipeline
//!
//! 1. Locate per-tool artifacts under the run tree (glob patterns)
//! 2. Parse each artifact into a flat metric set (never fatal)
//! 3. Resolve each artifact's (design, model) identity from its path
//! 4. Aggregate into per-design records, flatten into candidates
//! 5. Score each candidate with a weighted, availability-normalized sum
//! 6. Rank and render CSV / Markdown / JSON reports
//!
//! # CLI Contract
//!
//! ```bash
//! foldrank consolidate --root results/run_01 \
//!     --output-csv design_metrics_summary.csv \
//!     --output-markdown design_metrics_report.md \
//!     [--weights weights.json] [--top-n 10]
//! ```

pub mod aggregate;
pub mod config;
pub mod identity;
pub mod locate;
pub mod metrics;
pub mod parsers;
pub mod pipeline;
pub mod prodigy;
pub mod rank;
pub mod report;
pub mod score;
pub mod sequences;

// Re-exports
pub use aggregate::{Aggregator, Candidate, DesignRecord};
pub use config::{ConsolidateConfig, ScoreWeights, SearchPatterns};
pub use identity::{resolve_identity, Identity};
pub use locate::{locate_all, ArtifactRef, ToolKind};
pub use metrics::{MetricValue, RawMetricSet};
pub use pipeline::{ConsolidateResult, ConsolidateStage};
pub use rank::RankedReport;
pub use report::SummaryJson;
pub use score::CompositeScorer;
