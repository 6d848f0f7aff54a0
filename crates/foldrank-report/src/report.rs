//! Report rendering: full CSV record, Markdown summary, summary JSON
//!
//! The CSV carries every metric ever observed for any candidate; unknown
//! columns are appended after the documented priority order, sorted
//! lexically, and are never silently dropped.

use crate::aggregate::Candidate;
use crate::config::ScoreWeights;
use crate::rank::RankedReport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Identity and score columns that lead every CSV row
const IDENTITY_COLUMNS: &[&str] = &[
    "design_id",
    "model_id",
    "rank",
    "composite_score",
    "contributing_metrics",
];

/// Known metrics in their documented order; anything else observed is
/// appended after these, sorted lexically
const PRIORITY_METRICS: &[&str] = &[
    "ipsae_score",
    "predicted_binding_affinity",
    "predicted_kd",
    "buried_surface_area",
    "num_interface_contacts",
    "model_confidence",
    "plddt_avg",
    "ptm_score",
];

/// Quote a CSV cell only when it needs it
fn csv_cell(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn metric_cell(candidate: &Candidate, metric: &str) -> String {
    match candidate.metrics.get(metric) {
        Some(value) => csv_cell(&value.to_string()),
        None => String::new(),
    }
}

/// Build the complete tabular record, one row per ranked candidate.
///
/// An empty report still renders a well-formed header-only CSV.
pub fn build_full_csv(report: &RankedReport) -> String {
    // Union of observed metric keys across all candidates
    let mut observed: BTreeSet<&str> = BTreeSet::new();
    for candidate in &report.candidates {
        observed.extend(candidate.metrics.keys().map(|k| k.as_str()));
    }
    let extra_metrics: Vec<&str> = observed
        .iter()
        .filter(|k| !PRIORITY_METRICS.contains(*k))
        .copied()
        .collect();

    let mut csv = String::new();
    let mut header: Vec<&str> = Vec::new();
    header.extend_from_slice(IDENTITY_COLUMNS);
    header.extend_from_slice(PRIORITY_METRICS);
    header.extend_from_slice(&extra_metrics);
    csv.push_str(&header.join(","));
    csv.push('\n');

    for candidate in &report.candidates {
        let mut row: Vec<String> = vec![
            csv_cell(&candidate.design_id),
            csv_cell(candidate.model_id.as_deref().unwrap_or("")),
            candidate.rank.to_string(),
            candidate.composite_score.to_string(),
            candidate.contributing_metrics.to_string(),
        ];
        for metric in PRIORITY_METRICS.iter().chain(extra_metrics.iter()) {
            row.push(metric_cell(candidate, metric));
        }
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

/// Write the full CSV record. Write failure is fatal to the run.
pub fn write_full_csv(report: &RankedReport, path: &Path) -> Result<()> {
    std::fs::write(path, build_full_csv(report))
        .with_context(|| format!("Failed to write summary CSV: {}", path.display()))
}

// =============================================================================
// SUMMARY STATISTICS
// =============================================================================

/// min/max/mean over the non-null values of one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyStats {
    pub metric: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Compute stats for a metric across candidates; `None` when no candidate
/// carries a non-null value
pub fn family_stats(candidates: &[Candidate], metric: &str) -> Option<FamilyStats> {
    let values: Vec<f64> = candidates
        .iter()
        .filter_map(|c| c.metrics.get(metric).and_then(|v| v.as_f64()))
        .collect();
    if values.is_empty() {
        return None;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(FamilyStats {
        metric: metric.to_string(),
        count: values.len(),
        min,
        max,
        mean,
    })
}

// =============================================================================
// MARKDOWN REPORT
// =============================================================================

fn fmt_opt(candidate: &Candidate, metric: &str, decimals: usize) -> String {
    match candidate.metrics.get(metric).and_then(|v| v.as_f64()) {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

fn fmt_opt_exp(candidate: &Candidate, metric: &str) -> String {
    match candidate.metrics.get(metric).and_then(|v| v.as_f64()) {
        Some(v) => format!("{:.2e}", v),
        None => "N/A".to_string(),
    }
}

fn fmt_opt_int(candidate: &Candidate, metric: &str) -> String {
    match candidate.metrics.get(metric).and_then(|v| v.as_f64()) {
        Some(v) => format!("{}", v as i64),
        None => "N/A".to_string(),
    }
}

/// Render the human-readable Markdown report
pub fn build_markdown(report: &RankedReport, top_n: usize) -> String {
    let mut md = String::new();
    md.push_str("# Protein Design Consolidation Report\n\n");
    md.push_str(&format!(
        "**Total Candidates Analyzed:** {}\n\n",
        report.len()
    ));

    if report.is_empty() {
        md.push_str("No candidates found.\n");
        return md;
    }

    md.push_str("## Summary Statistics\n\n");

    if let Some(stats) = family_stats(&report.candidates, "ipsae_score") {
        md.push_str(&format!("- **IPSAE Scores:** {} candidates\n", stats.count));
        md.push_str(&format!(
            "  - Min: {:.3}, Max: {:.3}, Mean: {:.3}\n",
            stats.min, stats.max, stats.mean
        ));
    }
    if let Some(stats) = family_stats(&report.candidates, "predicted_binding_affinity") {
        md.push_str(&format!(
            "- **Binding Affinity (ΔG):** {} candidates\n",
            stats.count
        ));
        md.push_str(&format!(
            "  - Min: {:.3} kcal/mol, Max: {:.3} kcal/mol, Mean: {:.3} kcal/mol\n",
            stats.min, stats.max, stats.mean
        ));
    }
    if let Some(stats) = family_stats(&report.candidates, "buried_surface_area") {
        md.push_str(&format!(
            "- **Buried Surface Area:** {} candidates\n",
            stats.count
        ));
        md.push_str(&format!(
            "  - Min: {:.1} Ų, Max: {:.1} Ų, Mean: {:.1} Ų\n",
            stats.min, stats.max, stats.mean
        ));
    }

    md.push_str(&format!("\n## Top {} Candidates (by Composite Score)\n\n", top_n));
    md.push_str(
        "| Rank | Design ID | Model | Composite Score | Metrics | IPSAE | ΔG (kcal/mol) | Kd (M) | BSA (Ų) | Contacts |\n",
    );
    md.push_str(
        "|------|-----------|-------|-----------------|---------|-------|---------------|--------|----------|----------|\n",
    );

    for candidate in report.candidates.iter().take(top_n) {
        md.push_str(&format!(
            "| {} | {} | {} | {:.3} | {} | {} | {} | {} | {} | {} |\n",
            candidate.rank,
            candidate.design_id,
            candidate.model_id.as_deref().unwrap_or("-"),
            candidate.composite_score,
            candidate.contributing_metrics,
            fmt_opt(candidate, "ipsae_score", 3),
            fmt_opt(candidate, "predicted_binding_affinity", 2),
            fmt_opt_exp(candidate, "predicted_kd"),
            fmt_opt(candidate, "buried_surface_area", 1),
            fmt_opt_int(candidate, "num_interface_contacts"),
        ));
    }

    md.push_str("\n## Interpretation Guide\n\n");
    md.push_str("- **Composite Score**: Overall ranking combining all available weighted metrics, normalized by how many contributed (higher is better)\n");
    md.push_str("- **Metrics**: Number of weighted metrics that contributed; 0 means the candidate had nothing to score\n");
    md.push_str("- **IPSAE Score**: Interface PAE score - measures interface quality (lower is better)\n");
    md.push_str("- **ΔG**: Predicted binding affinity in kcal/mol (more negative is stronger binding)\n");
    md.push_str("- **Kd**: Predicted dissociation constant in M (lower indicates tighter binding)\n");
    md.push_str("- **BSA**: Buried surface area in Ų (larger generally indicates more interaction)\n");
    md.push_str("- **Contacts**: Number of interface contacts (more contacts typically means stronger interaction)\n\n");

    md.push_str("## Recommendations\n\n");

    if let Some(best) = report.top() {
        md.push_str(&format!(
            "The **top-ranked candidate is `{}`** based on composite scoring.\n\n",
            best.identity()
        ));

        let recommendations = threshold_recommendations(best);
        if !recommendations.is_empty() {
            md.push_str("Key features of the top candidate:\n\n");
            for rec in &recommendations {
                md.push_str(&format!("- {}\n", rec));
            }
        }

        md.push_str("\n**Next Steps:**\n");
        md.push_str("1. Review the structure files for the top-ranked candidates\n");
        md.push_str("2. Perform additional validation (MD simulations, experimental testing)\n");
        md.push_str("3. Consider the top 3-5 candidates for experimental characterization\n");
    }

    md
}

/// Qualitative calls from fixed per-metric thresholds
fn threshold_recommendations(candidate: &Candidate) -> Vec<String> {
    let mut recs = Vec::new();
    let get = |metric: &str| candidate.metrics.get(metric).and_then(|v| v.as_f64());

    if let Some(ipsae) = get("ipsae_score") {
        if ipsae < 5.0 {
            recs.push("✅ Excellent interface quality (IPSAE < 5.0)".to_string());
        } else if ipsae < 10.0 {
            recs.push("⚠️ Moderate interface quality (IPSAE < 10.0)".to_string());
        }
    }
    if let Some(dg) = get("predicted_binding_affinity") {
        if dg < -10.0 {
            recs.push("✅ Strong predicted binding affinity (ΔG < -10 kcal/mol)".to_string());
        } else if dg < -5.0 {
            recs.push("⚠️ Moderate predicted binding affinity".to_string());
        }
    }
    if let Some(bsa) = get("buried_surface_area") {
        if bsa > 1000.0 {
            recs.push("✅ Large buried surface area (> 1000 Ų)".to_string());
        }
    }
    if let Some(contacts) = get("num_interface_contacts") {
        if contacts > 50.0 {
            recs.push("✅ Good number of interface contacts (> 50)".to_string());
        }
    }
    recs
}

/// Write the Markdown report. Write failure is fatal to the run.
pub fn write_markdown(report: &RankedReport, path: &Path, top_n: usize) -> Result<()> {
    std::fs::write(path, build_markdown(report, top_n))
        .with_context(|| format!("Failed to write Markdown report: {}", path.display()))
}

// =============================================================================
// SUMMARY JSON
// =============================================================================

/// Machine-readable run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryJson {
    /// Crate version
    pub version: String,
    /// Generation timestamp (RFC3339)
    pub timestamp: String,
    /// Root directory that was scanned
    pub root_dir: String,
    /// Total ranked candidates
    pub total_candidates: usize,
    /// Candidates with at least one contributing metric
    pub scored_candidates: usize,
    /// Weight table used for the composite score
    pub weights: ScoreWeights,
    /// Best candidate, if any
    pub top_candidate: Option<TopCandidate>,
    /// Per-family statistics for the headline metrics
    pub statistics: Vec<FamilyStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCandidate {
    pub design_id: String,
    pub model_id: Option<String>,
    pub composite_score: f64,
    pub contributing_metrics: usize,
}

impl SummaryJson {
    /// Assemble the summary for a ranked report
    pub fn build(report: &RankedReport, root_dir: &Path, weights: &ScoreWeights) -> Self {
        let statistics = ["ipsae_score", "predicted_binding_affinity", "buried_surface_area"]
            .iter()
            .filter_map(|m| family_stats(&report.candidates, m))
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            root_dir: root_dir.display().to_string(),
            total_candidates: report.len(),
            scored_candidates: report
                .candidates
                .iter()
                .filter(|c| c.contributing_metrics > 0)
                .count(),
            weights: weights.clone(),
            top_candidate: report.top().map(|c| TopCandidate {
                design_id: c.design_id.clone(),
                model_id: c.model_id.clone(),
                composite_score: c.composite_score,
                contributing_metrics: c.contributing_metrics,
            }),
            statistics,
        }
    }

    /// Write pretty-printed JSON. Write failure is fatal to the run.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary JSON: {}", path.display()))
    }
}
