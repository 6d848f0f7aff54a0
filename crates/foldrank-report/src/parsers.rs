//! Per-tool artifact parsers
//!
//! One parser per upstream tool, each a pure function from an artifact
//! path to a flat `RawMetricSet`. Parse failures never abort the run:
//! the affected metrics degrade to `Null` and a warning is logged. A
//! partially-present tree is the normal case, not an error.

use crate::locate::{ArtifactRef, ToolKind};
use crate::metrics::{metric_set, MetricValue, RawMetricSet};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Dispatch an artifact to its tool's parser
pub fn parse_artifact(artifact: &ArtifactRef) -> RawMetricSet {
    match artifact.tool {
        ToolKind::Ipsae => parse_ipsae(&artifact.path),
        ToolKind::Prodigy => parse_prodigy_summary(&artifact.path),
        ToolKind::Foldseek => parse_foldseek_summary(&artifact.path),
        ToolKind::Confidence => parse_confidence_dir(&artifact.path),
        ToolKind::Mpnn => parse_mpnn_dir(&artifact.path),
    }
}

// =============================================================================
// INTERFACE SCORES (label ':' value)
// =============================================================================

/// Parse an interface score file.
///
/// Expected format, one metric on its own labeled line:
/// ```text
/// IPSAE: 4.235
/// ```
pub fn parse_ipsae(path: &Path) -> RawMetricSet {
    let mut metrics = metric_set([("ipsae_score", MetricValue::Null)]);

    match try_parse_ipsae(path) {
        Ok(Some(score)) => {
            metrics.insert("ipsae_score".to_string(), MetricValue::Float(score));
        }
        Ok(None) => {
            log::warn!("No IPSAE line in {}", path.display());
        }
        Err(e) => {
            log::warn!("Could not parse interface score file {}: {:#}", path.display(), e);
        }
    }

    metrics
}

fn try_parse_ipsae(path: &Path) -> Result<Option<f64>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("IPSAE:") {
            let score: f64 = rest
                .trim()
                .parse()
                .with_context(|| format!("Malformed IPSAE value '{}'", rest.trim()))?;
            return Ok(Some(score));
        }
    }
    Ok(None)
}

// =============================================================================
// BINDING AFFINITY SUMMARY (delimited, typed columns)
// =============================================================================

/// Columns that identify the row rather than carrying a metric
const NON_METRIC_COLUMNS: &[&str] = &["structure_id"];

/// Map a summary column header to its canonical metric name by stripping
/// the unit suffix the upstream tool appends
fn canonical_column(header: &str) -> &str {
    match header {
        "buried_surface_area_A2" => "buried_surface_area",
        "predicted_binding_affinity_kcal_mol" => "predicted_binding_affinity",
        "predicted_kd_M" => "predicted_kd",
        "kd_temperature_C" => "kd_temperature",
        other => other,
    }
}

/// Parse a binding affinity summary CSV.
///
/// The first data row carries the candidate's metrics, with typed column
/// coercion (integers stay counts, other numerics become floats, the rest
/// is kept as text). When the file carries more than one data row the
/// rows are treated as repeated measurements and per-column
/// mean/min/max statistics are appended.
pub fn parse_prodigy_summary(path: &Path) -> RawMetricSet {
    let mut metrics = metric_set([
        ("buried_surface_area", MetricValue::Null),
        ("num_interface_contacts", MetricValue::Null),
        ("predicted_binding_affinity", MetricValue::Null),
        ("predicted_kd", MetricValue::Null),
    ]);

    if let Err(e) = try_parse_prodigy_summary(path, &mut metrics) {
        log::warn!("Could not parse affinity summary {}: {:#}", path.display(), e);
    }

    metrics
}

fn try_parse_prodigy_summary(path: &Path, metrics: &mut RawMetricSet) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Missing header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    // Column-family accumulators across repeated-measurement rows
    let mut numeric_rows: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut n_rows = 0usize;

    for record in reader.records() {
        let record = record.context("Malformed data row")?;
        n_rows += 1;

        for (header, field) in headers.iter().zip(record.iter()) {
            if NON_METRIC_COLUMNS.contains(&header.as_str()) {
                continue;
            }
            let name = canonical_column(header);
            let value = MetricValue::from_field(field);

            if let Some(v) = value.as_f64() {
                numeric_rows.entry(name.to_string()).or_default().push(v);
            }

            // First data row defines the candidate's primary values
            if n_rows == 1 {
                metrics.insert(name.to_string(), value);
            }
        }
    }

    if n_rows == 0 {
        anyhow::bail!("No data rows");
    }

    // Repeated measurements: append per-column statistics
    if n_rows > 1 {
        for (name, values) in numeric_rows {
            if values.is_empty() {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            metrics.insert(format!("{}_mean", name), MetricValue::Float(mean));
            metrics.insert(format!("{}_min", name), MetricValue::Float(min));
            metrics.insert(format!("{}_max", name), MetricValue::Float(max));
        }
    }

    Ok(())
}

// =============================================================================
// STRUCTURAL SIMILARITY HIT LIST (tab-delimited, fixed offsets)
// =============================================================================

/// Column offset of the target name in a hit row
const HIT_TARGET_COL: usize = 1;
/// Column offset of the e-value
const HIT_EVALUE_COL: usize = 10;
/// Column offset of the bit score
const HIT_BITS_COL: usize = 11;
/// A valid hit row carries at least this many columns
const HIT_MIN_COLS: usize = 12;

/// Parse a similarity-search summary TSV.
///
/// The first data row after the header is the top hit; relevant fields
/// sit at fixed column offsets. Every data row counts toward
/// `foldseek_num_hits`, even when the top-hit fields are unparsable.
pub fn parse_foldseek_summary(path: &Path) -> RawMetricSet {
    let mut metrics = metric_set([
        ("foldseek_top_hit", MetricValue::Null),
        ("foldseek_top_evalue", MetricValue::Null),
        ("foldseek_top_bits", MetricValue::Null),
        ("foldseek_num_hits", MetricValue::Int(0)),
    ]);

    if let Err(e) = try_parse_foldseek_summary(path, &mut metrics) {
        log::warn!("Could not parse similarity summary {}: {:#}", path.display(), e);
    }

    metrics
}

fn try_parse_foldseek_summary(path: &Path, metrics: &mut RawMetricSet) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut hit_count: i64 = 0;
    for line in content.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        hit_count += 1;

        // First non-empty data row is the top hit
        if hit_count == 1 {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() >= HIT_MIN_COLS {
                metrics.insert(
                    "foldseek_top_hit".to_string(),
                    MetricValue::Text(fields[HIT_TARGET_COL].to_string()),
                );
                match fields[HIT_EVALUE_COL].trim().parse::<f64>() {
                    Ok(evalue) => {
                        metrics.insert(
                            "foldseek_top_evalue".to_string(),
                            MetricValue::Float(evalue),
                        );
                    }
                    Err(_) => log::warn!(
                        "Malformed e-value '{}' in {}",
                        fields[HIT_EVALUE_COL],
                        path.display()
                    ),
                }
                match fields[HIT_BITS_COL].trim().parse::<f64>() {
                    Ok(bits) => {
                        metrics.insert("foldseek_top_bits".to_string(), MetricValue::Float(bits));
                    }
                    Err(_) => log::warn!(
                        "Malformed bit score '{}' in {}",
                        fields[HIT_BITS_COL],
                        path.display()
                    ),
                }
            } else {
                log::warn!(
                    "Top hit row in {} has {} columns, expected >= {}",
                    path.display(),
                    fields.len(),
                    HIT_MIN_COLS
                );
            }
        }
    }

    metrics.insert("foldseek_num_hits".to_string(), MetricValue::Int(hit_count));
    Ok(())
}

// =============================================================================
// PREDICTION CONFIDENCE (directory of JSON documents)
// =============================================================================

/// Top-level keys holding a predicted-aligned-error matrix
const PAE_KEYS: &[&str] = &["pae", "predicted_aligned_error", "token_pair_predicted_aligned_error"];

/// Nested paths holding a predicted-aligned-error matrix
const PAE_NESTED: &[(&str, &str)] = &[
    ("confidence", "pae"),
    ("confidence", "predicted_aligned_error"),
    ("scores", "pae"),
    ("scores", "predicted_aligned_error"),
];

/// Parse a directory of confidence JSON documents.
///
/// All `*.json` files are scanned in filename order; matching top-level
/// keys are extracted, with later files overwriting earlier ones on key
/// collision. Last-write-wins is the documented contract here, and the
/// filename sort pins down which write is last on every platform.
pub fn parse_confidence_dir(dir: &Path) -> RawMetricSet {
    let mut metrics = metric_set([
        ("model_confidence", MetricValue::Null),
        ("plddt_avg", MetricValue::Null),
        ("ptm_score", MetricValue::Null),
    ]);

    let mut json_files: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect(),
        Err(e) => {
            log::warn!("Could not scan confidence directory {}: {}", dir.display(), e);
            return metrics;
        }
    };
    json_files.sort();

    for file in &json_files {
        if let Err(e) = try_parse_confidence_json(file, &mut metrics) {
            log::warn!("Could not parse confidence file {}: {:#}", file.display(), e);
        }
    }

    metrics
}

fn try_parse_confidence_json(path: &Path, metrics: &mut RawMetricSet) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let data: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    for (key, metric) in [
        ("model_confidence", "model_confidence"),
        ("plddt", "plddt_avg"),
        ("ptm", "ptm_score"),
    ] {
        if let Some(v) = data.get(key).and_then(|v| v.as_f64()) {
            metrics.insert(metric.to_string(), MetricValue::Float(v));
        }
    }

    if let Some(mean) = find_pae_mean(&data, path) {
        metrics.insert("pae_mean".to_string(), MetricValue::Float(mean));
    }

    Ok(())
}

/// Search the common locations for a predicted-aligned-error matrix and
/// return its mean. The matrix must be 2D and square; anything else is
/// logged and ignored.
fn find_pae_mean(data: &serde_json::Value, path: &Path) -> Option<f64> {
    let mut candidate: Option<&serde_json::Value> = None;

    for key in PAE_KEYS {
        if let Some(v) = data.get(*key) {
            candidate = Some(v);
            break;
        }
    }
    if candidate.is_none() {
        for (outer, inner) in PAE_NESTED {
            if let Some(v) = data.get(*outer).and_then(|o| o.get(*inner)) {
                candidate = Some(v);
                break;
            }
        }
    }

    let rows = candidate?.as_array()?;
    if rows.is_empty() {
        return None;
    }

    let n = rows.len();
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for row in rows {
        let row = match row.as_array() {
            Some(r) => r,
            None => {
                log::warn!("Aligned-error matrix in {} is not 2D", path.display());
                return None;
            }
        };
        if row.len() != n {
            log::warn!(
                "Aligned-error matrix in {} is not square ({}x{})",
                path.display(),
                n,
                row.len()
            );
            return None;
        }
        for v in row {
            match v.as_f64() {
                Some(x) => {
                    sum += x;
                    count += 1;
                }
                None => {
                    log::warn!("Non-numeric aligned-error entry in {}", path.display());
                    return None;
                }
            }
        }
    }

    Some(sum / count as f64)
}

// =============================================================================
// SEQUENCE REDESIGN SCORES (multi-record FASTA, key=value headers)
// =============================================================================

/// Parse a sequence-redesign output directory.
///
/// Scans FASTA files whose record headers carry comma-separated
/// `key=value` annotations; `mpnn_score` is the arithmetic mean of the
/// per-record `score` field across all records in the directory.
pub fn parse_mpnn_dir(dir: &Path) -> RawMetricSet {
    let mut metrics = metric_set([
        ("mpnn_score", MetricValue::Null),
        ("mpnn_num_sequences", MetricValue::Int(0)),
    ]);

    let mut fasta_files: Vec<_> = match collect_fasta_files(dir) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("Could not scan redesign directory {}: {:#}", dir.display(), e);
            return metrics;
        }
    };
    fasta_files.sort();

    let mut scores = Vec::new();
    let mut global_scores = Vec::new();
    let mut n_records: i64 = 0;

    for file in &fasta_files {
        match std::fs::read_to_string(file) {
            Ok(content) => {
                for line in content.lines().filter(|l| l.starts_with('>')) {
                    n_records += 1;
                    let fields = parse_header_fields(line);
                    if let Some(score) = fields.get("score") {
                        scores.push(*score);
                    }
                    if let Some(global) = fields.get("global_score") {
                        global_scores.push(*global);
                    }
                }
            }
            Err(e) => {
                log::warn!("Could not read sequence file {}: {}", file.display(), e);
            }
        }
    }

    metrics.insert("mpnn_num_sequences".to_string(), MetricValue::Int(n_records));
    if !scores.is_empty() {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        metrics.insert("mpnn_score".to_string(), MetricValue::Float(mean));
    }
    if !global_scores.is_empty() {
        let mean = global_scores.iter().sum::<f64>() / global_scores.len() as f64;
        metrics.insert("mpnn_global_score".to_string(), MetricValue::Float(mean));
    }

    metrics
}

fn collect_fasta_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            // One level of nesting: redesign outputs often keep sequences
            // in a `seqs/` subdirectory
            if let Ok(nested) = std::fs::read_dir(&path) {
                for sub in nested.filter_map(|e| e.ok()) {
                    if is_fasta(&sub.path()) {
                        files.push(sub.path());
                    }
                }
            }
        } else if is_fasta(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn is_fasta(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("fa") | Some("fasta") | Some("fsa")
    )
}

/// Parse `key=value` fields out of a FASTA header line.
///
/// Headers look like `>name, score=2.10, global_score=2.34, seq_recovery=0.51`;
/// fields that do not parse as numbers are skipped.
fn parse_header_fields(header: &str) -> BTreeMap<String, f64> {
    let mut fields = BTreeMap::new();
    for part in header.trim_start_matches('>').split(',') {
        if let Some((key, value)) = part.split_once('=') {
            if let Ok(v) = value.trim().parse::<f64>() {
                fields.insert(key.trim().to_string(), v);
            }
        }
    }
    fields
}
