//! Consolidation pipeline orchestration
//!
//! Single-threaded, single-pass batch: locate, parse, resolve, aggregate,
//! score, rank, write. Runs after all upstream jobs have completed.
//! Partial, honestly-incomplete results beat an aborted run: the only
//! fatal conditions are an invalid root directory and output write
//! failures. Everything else degrades to warnings and null metrics.

use crate::aggregate::Aggregator;
use crate::config::ConsolidateConfig;
use crate::identity::resolve_identity;
use crate::locate::locate_all;
use crate::parsers::parse_artifact;
use crate::rank::RankedReport;
use crate::report::{write_full_csv, write_markdown, SummaryJson};
use crate::score::CompositeScorer;
use anyhow::Result;
use std::path::PathBuf;

/// Outcome of a consolidation run
#[derive(Debug)]
pub struct ConsolidateResult {
    /// Artifacts discovered across all tools
    pub n_artifacts: usize,
    /// Artifacts skipped because no identity rule applied
    pub n_skipped: usize,
    /// Distinct designs seen
    pub n_designs: usize,
    /// Ranked candidates produced
    pub n_candidates: usize,
    /// Best candidate identity, if any
    pub top_candidate: Option<String>,
    /// Files written
    pub files_generated: Vec<PathBuf>,
}

/// The consolidation stage. Owns the record collection for the duration
/// of the run; nothing else mutates it.
pub struct ConsolidateStage {
    config: ConsolidateConfig,
}

impl ConsolidateStage {
    /// Create the stage. Fails fast on an invalid root directory, the
    /// one fatal input condition.
    pub fn new(config: ConsolidateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the complete consolidation pass
    pub fn run(&self) -> Result<ConsolidateResult> {
        log::info!("Consolidating metrics from: {}", self.config.root_dir.display());

        // Step 1: locate artifacts for every tool
        log::info!("\n[1/5] Locating artifacts...");
        let groups = locate_all(&self.config.root_dir, &self.config.patterns);
        let n_artifacts: usize = groups.iter().map(|(_, a)| a.len()).sum();
        for (tool, artifacts) in &groups {
            log::info!("  {} {} artifact(s)", artifacts.len(), tool);
        }

        // Step 2: parse and aggregate
        log::info!("\n[2/5] Parsing and aggregating...");
        let mut aggregator = Aggregator::new();
        let mut n_skipped = 0usize;

        for (tool, artifacts) in &groups {
            for artifact in artifacts {
                let identity = match resolve_identity(&artifact.path, *tool) {
                    Some(identity) => identity,
                    None => {
                        log::warn!(
                            "Skipping {} artifact with unresolvable identity: {}",
                            tool,
                            artifact.path.display()
                        );
                        n_skipped += 1;
                        continue;
                    }
                };
                let metrics = parse_artifact(artifact);
                log::debug!("  {} -> {} ({} metrics)", artifact.path.display(), identity, metrics.len());
                aggregator.insert(identity, metrics);
            }
        }
        log::info!(
            "  {} designs, {} scorable candidates",
            aggregator.n_designs(),
            aggregator.n_candidates()
        );

        // Step 3: flatten and score
        log::info!("\n[3/5] Computing composite scores...");
        let mut candidates = aggregator.flatten();
        let scorer = CompositeScorer::new(self.config.weights.clone());
        scorer.score_candidates(&mut candidates);

        let unscored = candidates.iter().filter(|c| c.contributing_metrics == 0).count();
        if unscored > 0 {
            log::warn!("  {} candidate(s) have no weighted metrics and score 0.0", unscored);
        }

        // Step 4: rank
        log::info!("\n[4/5] Ranking candidates...");
        let report = RankedReport::from_scored(candidates);
        if let Some(top) = report.top() {
            log::info!(
                "  Top candidate: {} (score {:.3}, {} contributing metrics)",
                top.identity(),
                top.composite_score,
                top.contributing_metrics
            );
        } else {
            log::info!("  No candidates found; writing empty report");
        }

        // Step 5: write outputs (failures here are fatal)
        log::info!("\n[5/5] Writing reports...");
        let mut files_generated = Vec::new();

        write_full_csv(&report, &self.config.output_csv)?;
        files_generated.push(self.config.output_csv.clone());
        log::info!("  ✓ {}", self.config.output_csv.display());

        write_markdown(&report, &self.config.output_markdown, self.config.top_n)?;
        files_generated.push(self.config.output_markdown.clone());
        log::info!("  ✓ {}", self.config.output_markdown.display());

        let summary = SummaryJson::build(&report, &self.config.root_dir, &self.config.weights);
        summary.write(&self.config.output_json)?;
        files_generated.push(self.config.output_json.clone());
        log::info!("  ✓ {}", self.config.output_json.display());

        log::info!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::info!("  Consolidation Complete");
        log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        log::info!("  Artifacts: {} ({} skipped)", n_artifacts, n_skipped);
        log::info!("  Candidates: {}", report.len());

        Ok(ConsolidateResult {
            n_artifacts,
            n_skipped,
            n_designs: aggregator.n_designs(),
            n_candidates: report.len(),
            top_candidate: report.top().map(|c| c.identity().to_string()),
            files_generated,
        })
    }
}
