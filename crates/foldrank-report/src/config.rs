//! Configuration structures for the consolidation pipeline

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main consolidation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidateConfig {
    /// Root of the pipeline output tree to scan
    pub root_dir: PathBuf,

    /// Output CSV file (full tabular record)
    pub output_csv: PathBuf,

    /// Output Markdown report
    pub output_markdown: PathBuf,

    /// Output summary JSON
    pub output_json: PathBuf,

    /// Number of top candidates highlighted in the Markdown report
    pub top_n: usize,

    /// Per-tool search patterns
    pub patterns: SearchPatterns,

    /// Composite score weights
    pub weights: ScoreWeights,

    /// Verbose output
    pub verbose: bool,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            output_csv: PathBuf::from("design_metrics_summary.csv"),
            output_markdown: PathBuf::from("design_metrics_report.md"),
            output_json: PathBuf::from("design_metrics_summary.json"),
            top_n: 10,
            patterns: SearchPatterns::default(),
            weights: ScoreWeights::default(),
            verbose: false,
        }
    }
}

impl ConsolidateConfig {
    /// Validate the configuration. The root directory must exist; this is
    /// the only fatal input condition in the whole run.
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.is_dir() {
            anyhow::bail!(
                "Invalid root directory: {} (not found or not a directory)",
                self.root_dir.display()
            );
        }
        self.weights.validate()?;
        Ok(())
    }
}

/// Glob patterns locating each tool's artifacts under the run tree.
///
/// Each pattern is relative to the root directory. A pattern matching
/// nothing is an expected, common case: optional pipeline stages are
/// frequently skipped, and their metrics simply stay absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPatterns {
    /// Interface score files (one per scored model)
    pub ipsae: String,
    /// Binding affinity summary CSVs
    pub prodigy: String,
    /// Structural similarity hit lists (TSV)
    pub foldseek: String,
    /// Structure prediction confidence directories
    pub confidence: String,
    /// Sequence redesign output directories
    pub mpnn: String,
}

impl Default for SearchPatterns {
    fn default() -> Self {
        Self {
            ipsae: "*/ipsae_scores/*_10_10.txt".to_string(),
            prodigy: "*/prodigy/*_prodigy_summary.csv".to_string(),
            foldseek: "*/foldseek/*_foldseek_summary.tsv".to_string(),
            confidence: "*/predictions".to_string(),
            mpnn: "*_mpnn_optimized".to_string(),
        }
    }
}

/// Composite score weight table.
///
/// Maps metric name to a signed weight: positive means higher is better,
/// negative means lower is better. Magnitudes compensate for each metric's
/// natural numeric scale (a 0-1 confidence needs a larger weight than a
/// 0-100 pLDDT to contribute comparably).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights {
    weights: BTreeMap<String, f64>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        // Lower interface score is better
        weights.insert("ipsae_score".to_string(), -1.0);
        // More negative binding energy is better
        weights.insert("predicted_binding_affinity".to_string(), -1.0);
        // Larger buried surface area is generally better
        weights.insert("buried_surface_area".to_string(), 0.01);
        // More interface contacts is better
        weights.insert("num_interface_contacts".to_string(), 0.1);
        // Higher confidence is better
        weights.insert("model_confidence".to_string(), 1.0);
        // Higher pLDDT is better
        weights.insert("plddt_avg".to_string(), 0.1);
        Self { weights }
    }
}

impl ScoreWeights {
    /// Load a weight table from a JSON file ({"metric": weight, ...})
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read weight table: {}", path.display()))?;
        let weights: BTreeMap<String, f64> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse weight table: {}", path.display()))?;
        let table = Self { weights };
        table.validate()?;
        Ok(table)
    }

    /// Weight for a metric, if the table carries one
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.weights.get(metric).copied()
    }

    /// Iterate (metric, weight) pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of weighted metrics in the table
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Validate the table: at least one entry, all weights finite and nonzero
    pub fn validate(&self) -> Result<()> {
        if self.weights.is_empty() {
            anyhow::bail!("Weight table is empty: no metric can contribute to the composite score");
        }
        for (metric, weight) in &self.weights {
            if !weight.is_finite() || *weight == 0.0 {
                anyhow::bail!("Invalid weight {} for metric '{}'", weight, metric);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_cover_core_metrics() {
        let weights = ScoreWeights::default();
        assert_eq!(weights.get("ipsae_score"), Some(-1.0));
        assert_eq!(weights.get("model_confidence"), Some(1.0));
        assert_eq!(weights.get("foldseek_top_bits"), None);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_weight_table_rejects_zero_weight() {
        let mut weights = BTreeMap::new();
        weights.insert("ipsae_score".to_string(), 0.0);
        let table = ScoreWeights { weights };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_weight_table_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("weights.json");
        std::fs::write(&path, r#"{"ipsae_score": -2.0, "plddt_avg": 0.05}"#).unwrap();

        let table = ScoreWeights::load(&path).unwrap();
        assert_eq!(table.get("ipsae_score"), Some(-2.0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_config_validate_requires_root() {
        let config = ConsolidateConfig {
            root_dir: PathBuf::from("/nonexistent/run/tree"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
