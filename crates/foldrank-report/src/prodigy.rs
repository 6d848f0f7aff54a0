//! Binding-affinity raw log scraping
//!
//! The affinity predictor prints its results as free-form progress lines.
//! This module scrapes those lines into structured metrics and writes the
//! fixed-field CSV summary the consolidation parser consumes.
//!
//! Expected log excerpt:
//! ```text
//! [+] Buried Surface Area: 1234.56 A^2
//! [+] Number of interface contacts (ICs): 123
//! [+] Predicted binding affinity (ΔG): -12.34 kcal/mol
//! [+] Predicted dissociation constant (Kd): 1.23e-09 M at 25.0˚C
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Metrics scraped from one affinity-prediction log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProdigyMetrics {
    pub buried_surface_area: Option<f64>,
    pub num_interface_contacts: Option<i64>,
    pub num_noninteracting_surface: Option<i64>,
    pub num_charged_residues: Option<i64>,
    pub percent_charged_residues: Option<f64>,
    pub num_apolar_residues: Option<i64>,
    pub percent_apolar_residues: Option<f64>,
    pub predicted_binding_affinity: Option<f64>,
    pub predicted_kd: Option<f64>,
    pub kd_temperature: Option<f64>,
}

struct Patterns {
    bsa: Regex,
    contacts: Regex,
    nis: Regex,
    charged: Regex,
    charged_pct: Regex,
    apolar: Regex,
    apolar_pct: Regex,
    affinity: Regex,
    kd: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        bsa: Regex::new(r"Buried Surface Area:\s+([\d.]+)\s+A").expect("static regex"),
        contacts: Regex::new(r"Number of interface contacts \(ICs\):\s+(\d+)")
            .expect("static regex"),
        nis: Regex::new(r"Number of non-interacting surface residues:\s+(\d+)")
            .expect("static regex"),
        charged: Regex::new(r"Number of charged residues in ICs:\s+(\d+)").expect("static regex"),
        charged_pct: Regex::new(r"Percentage of charged residues in ICs:\s+([\d.]+)%")
            .expect("static regex"),
        apolar: Regex::new(r"Number of apolar residues in ICs:\s+(\d+)").expect("static regex"),
        apolar_pct: Regex::new(r"Percentage of apolar residues in ICs:\s+([\d.]+)%")
            .expect("static regex"),
        affinity: Regex::new(r"Predicted binding affinity \(ΔG\):\s+([-\d.]+)\s+kcal/mol")
            .expect("static regex"),
        kd: Regex::new(r"Predicted dissociation constant \(Kd\):\s+([\d.eE+-]+)\s+M\s+at\s+([\d.]+)")
            .expect("static regex"),
    })
}

fn capture_f64(re: &Regex, content: &str) -> Option<f64> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_i64(re: &Regex, content: &str) -> Option<i64> {
    re.captures(content)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Scrape affinity metrics from a raw predictor log.
///
/// Lines that are absent or malformed leave the corresponding field
/// `None`; the log as a whole only fails to parse if it cannot be read.
pub fn parse_prodigy_log(path: &Path) -> Result<ProdigyMetrics> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read affinity log: {}", path.display()))?;
    Ok(scrape_metrics(&content))
}

fn scrape_metrics(content: &str) -> ProdigyMetrics {
    let p = patterns();
    let kd_caps = p.kd.captures(content);

    ProdigyMetrics {
        buried_surface_area: capture_f64(&p.bsa, content),
        num_interface_contacts: capture_i64(&p.contacts, content),
        num_noninteracting_surface: capture_i64(&p.nis, content),
        num_charged_residues: capture_i64(&p.charged, content),
        percent_charged_residues: capture_f64(&p.charged_pct, content),
        num_apolar_residues: capture_i64(&p.apolar, content),
        percent_apolar_residues: capture_f64(&p.apolar_pct, content),
        predicted_binding_affinity: capture_f64(&p.affinity, content),
        predicted_kd: kd_caps
            .as_ref()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        kd_temperature: kd_caps
            .as_ref()
            .and_then(|c| c.get(2))
            .and_then(|m| m.as_str().parse().ok()),
    }
}

/// Fixed output columns of the CSV summary, unit suffixes included
const SUMMARY_COLUMNS: &[&str] = &[
    "structure_id",
    "buried_surface_area_A2",
    "num_interface_contacts",
    "num_noninteracting_surface",
    "num_charged_residues",
    "percent_charged_residues",
    "num_apolar_residues",
    "percent_apolar_residues",
    "predicted_binding_affinity_kcal_mol",
    "predicted_kd_M",
    "kd_temperature_C",
];

fn cell_f64(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn cell_i64(v: Option<i64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Render the one-row CSV summary for a scraped log
pub fn build_summary_csv(metrics: &ProdigyMetrics, structure_id: &str) -> String {
    let mut csv = String::new();
    csv.push_str(&SUMMARY_COLUMNS.join(","));
    csv.push('\n');

    let row = [
        structure_id.to_string(),
        cell_f64(metrics.buried_surface_area),
        cell_i64(metrics.num_interface_contacts),
        cell_i64(metrics.num_noninteracting_surface),
        cell_i64(metrics.num_charged_residues),
        cell_f64(metrics.percent_charged_residues),
        cell_i64(metrics.num_apolar_residues),
        cell_f64(metrics.percent_apolar_residues),
        cell_f64(metrics.predicted_binding_affinity),
        cell_f64(metrics.predicted_kd),
        cell_f64(metrics.kd_temperature),
    ];
    csv.push_str(&row.join(","));
    csv.push('\n');
    csv
}

/// Scrape a raw log and write its CSV summary
pub fn write_summary_csv(input: &Path, output: &Path, structure_id: &str) -> Result<()> {
    let metrics = parse_prodigy_log(input)?;
    let csv = build_summary_csv(&metrics, structure_id);
    std::fs::write(output, csv)
        .with_context(|| format!("Failed to write affinity summary: {}", output.display()))?;
    Ok(())
}
