//! End-to-end consolidation over a synthetic pipeline output tree
//!
//! Builds a run tree covering all five upstream tools and verifies that
//! every metric lands on the right candidate. The association check is
//! the important one: a metric attributed to the wrong design corrupts
//! the ranking without any error surfacing.

use foldrank_report::config::ConsolidateConfig;
use foldrank_report::pipeline::ConsolidateStage;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write the full fixture tree for one design with every tool present
fn write_design_a(root: &Path) {
    let design = root.join("binder_a");

    let ipsae_dir = design.join("ipsae_scores");
    fs::create_dir_all(&ipsae_dir).unwrap();
    fs::write(
        ipsae_dir.join("binder_a_model_0_10_10.txt"),
        "Chain pair: A,B\nIPSAE: 4.235\n",
    )
    .unwrap();

    let prodigy_dir = design.join("prodigy");
    fs::create_dir_all(&prodigy_dir).unwrap();
    fs::write(
        prodigy_dir.join("binder_a_prodigy_summary.csv"),
        "buried_surface_area_A2,num_interface_contacts,predicted_binding_affinity_kcal_mol,predicted_kd_M\n\
         1234.5,87,-11.2,3.4e-09\n",
    )
    .unwrap();

    let foldseek_dir = design.join("foldseek");
    fs::create_dir_all(&foldseek_dir).unwrap();
    fs::write(
        foldseek_dir.join("binder_a_foldseek_summary.tsv"),
        "query\ttarget\tfident\talnlen\tmismatch\tgapopen\tqstart\tqend\ttstart\ttend\tevalue\tbits\n\
         binder_a\tPDB_5ABC\t0.42\t110\t60\t2\t1\t110\t5\t114\t1.2e-12\t245.0\n",
    )
    .unwrap();

    let predictions = root.join("binder_a_output").join("predictions");
    fs::create_dir_all(&predictions).unwrap();
    fs::write(
        predictions.join("binder_a_confidence.json"),
        r#"{"model_confidence": 0.85, "plddt": 88.0, "ptm": 0.81}"#,
    )
    .unwrap();

    let mpnn_seqs = root.join("binder_a_mpnn_optimized").join("seqs");
    fs::create_dir_all(&mpnn_seqs).unwrap();
    fs::write(
        mpnn_seqs.join("binder_a.fa"),
        ">binder_a, score=2.10, global_score=2.40\nMKVLAA\n\
         >binder_a_1, score=2.30, global_score=2.50\nMKVLAG\n\
         >binder_a_2, score=1.90, global_score=2.20\nMKVLAV\n",
    )
    .unwrap();
}

/// A second design with only an interface score
fn write_design_b(root: &Path) {
    let ipsae_dir = root.join("binder_b").join("ipsae_scores");
    fs::create_dir_all(&ipsae_dir).unwrap();
    fs::write(
        ipsae_dir.join("binder_b_model_0_10_10.txt"),
        "IPSAE: 9.000\n",
    )
    .unwrap();
}

fn run_consolidation(root: &Path, out: &Path) -> foldrank_report::ConsolidateResult {
    let config = ConsolidateConfig {
        root_dir: root.to_path_buf(),
        output_csv: out.join("summary.csv"),
        output_markdown: out.join("report.md"),
        output_json: out.join("summary.json"),
        ..Default::default()
    };
    ConsolidateStage::new(config).unwrap().run().unwrap()
}

#[test]
fn test_full_tree_consolidation() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("run");
    fs::create_dir(&root).unwrap();
    write_design_a(&root);
    write_design_b(&root);

    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    let result = run_consolidation(&root, &out);

    // One candidate per distinct scorable identity: binder_a/model_0 and
    // binder_b/model_0
    assert_eq!(result.n_designs, 2, "two designs expected");
    assert_eq!(result.n_candidates, 2, "one candidate per model expected");
    assert_eq!(result.n_skipped, 0);

    let csv = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "header plus two candidate rows");

    let header: Vec<&str> = lines[0].split(',').collect();
    let row_a: Vec<&str> = lines
        .iter()
        .find(|l| l.starts_with("binder_a,"))
        .expect("binder_a row missing")
        .split(',')
        .collect();
    let row_b: Vec<&str> = lines
        .iter()
        .find(|l| l.starts_with("binder_b,"))
        .expect("binder_b row missing")
        .split(',')
        .collect();

    let col = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .unwrap_or_else(|| panic!("column {} missing", name))
    };

    // binder_a carries its own metrics...
    assert_eq!(row_a[col("model_id")], "binder_a_model_0");
    assert_eq!(row_a[col("ipsae_score")], "4.235");
    assert_eq!(row_a[col("buried_surface_area")], "1234.5");
    assert_eq!(row_a[col("num_interface_contacts")], "87");
    assert_eq!(row_a[col("predicted_binding_affinity")], "-11.2");
    assert_eq!(row_a[col("predicted_kd")], "3.4e-9");
    assert_eq!(row_a[col("model_confidence")], "0.85");
    assert_eq!(row_a[col("plddt_avg")], "88");
    // ...including the redesign score mean and similarity extras
    let mpnn_score: f64 = row_a[col("mpnn_score")].parse().unwrap();
    assert!((mpnn_score - 2.10).abs() < 1e-9, "mean of 2.10/2.30/1.90 expected");
    assert_eq!(row_a[col("mpnn_num_sequences")], "3");
    assert_eq!(row_a[col("foldseek_top_hit")], "PDB_5ABC");
    assert_eq!(row_a[col("foldseek_num_hits")], "1");

    // binder_b must NOT inherit anything from binder_a
    assert_eq!(row_b[col("ipsae_score")], "9");
    assert_eq!(row_b[col("buried_surface_area")], "", "affinity bled across designs");
    assert_eq!(row_b[col("model_confidence")], "");
    assert_eq!(row_b[col("mpnn_score")], "");

    // binder_a has full coverage and the better score, so it ranks first
    assert_eq!(row_a[col("rank")], "1");
    assert_eq!(row_b[col("rank")], "2");
    assert_eq!(result.top_candidate.as_deref(), Some("binder_a/binder_a_model_0"));

    // binder_b contributed exactly one weighted metric
    assert_eq!(row_b[col("contributing_metrics")], "1");
    assert_eq!(row_a[col("contributing_metrics")], "6");

    println!("✓ Full-tree consolidation associates every metric correctly");
}

#[test]
fn test_markdown_report_content() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("run");
    fs::create_dir(&root).unwrap();
    write_design_a(&root);

    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    run_consolidation(&root, &out);

    let md = fs::read_to_string(out.join("report.md")).unwrap();
    assert!(md.contains("**Total Candidates Analyzed:** 1"));
    assert!(md.contains("**IPSAE Scores:** 1 candidates"));
    assert!(md.contains("**Binding Affinity (ΔG):** 1 candidates"));
    assert!(md.contains("| 1 | binder_a | binder_a_model_0 |"));
    assert!(md.contains("top-ranked candidate is `binder_a/binder_a_model_0`"));
    // ipsae 4.235 < 5, ΔG -11.2 < -10, BSA 1234.5 > 1000, contacts 87 > 50
    assert!(md.contains("✅ Excellent interface quality"));
    assert!(md.contains("✅ Strong predicted binding affinity"));
    assert!(md.contains("✅ Large buried surface area"));
    assert!(md.contains("✅ Good number of interface contacts"));
}

#[test]
fn test_missing_tools_leave_gaps_not_errors() {
    // Only the similarity search ran; everything else is absent
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("run");
    let foldseek_dir = root.join("binder_c").join("foldseek");
    fs::create_dir_all(&foldseek_dir).unwrap();
    fs::write(
        foldseek_dir.join("binder_c_foldseek_summary.tsv"),
        "header\nbinder_c\tPDB_1XYZ\t0.3\t90\t60\t2\t1\t90\t1\t90\t2.0e-08\t150.0\n",
    )
    .unwrap();

    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    let result = run_consolidation(&root, &out);

    assert_eq!(result.n_candidates, 1);
    let csv = fs::read_to_string(out.join("summary.csv")).unwrap();
    let row = csv.lines().nth(1).unwrap();

    // No weighted metric present: score exactly 0.0 with count 0
    assert!(row.starts_with("binder_c,,1,0,0,"));
    assert!(row.contains("PDB_1XYZ"));
}

#[test]
fn test_malformed_artifacts_degrade_to_null() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("run");

    // Malformed interface score and truncated affinity summary
    let ipsae_dir = root.join("binder_d").join("ipsae_scores");
    fs::create_dir_all(&ipsae_dir).unwrap();
    fs::write(ipsae_dir.join("binder_d_model_0_10_10.txt"), "IPSAE: not_a_number\n").unwrap();

    let prodigy_dir = root.join("binder_d").join("prodigy");
    fs::create_dir_all(&prodigy_dir).unwrap();
    fs::write(
        prodigy_dir.join("binder_d_prodigy_summary.csv"),
        "buried_surface_area_A2\n",
    )
    .unwrap();

    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    let result = run_consolidation(&root, &out);

    // The run completes; the malformed metrics are empty cells
    assert_eq!(result.n_candidates, 1);
    let csv = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    let header: Vec<&str> = lines[0].split(',').collect();
    let row: Vec<&str> = lines[1].split(',').collect();
    let col = |name: &str| header.iter().position(|h| *h == name).unwrap();

    assert_eq!(row[col("ipsae_score")], "");
    assert_eq!(row[col("buried_surface_area")], "");
    assert_eq!(row[col("contributing_metrics")], "0");
}

#[test]
fn test_model_level_and_design_level_candidates_coexist() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("run");

    // Two models of the same design, plus design-level confidence
    let ipsae_dir = root.join("binder_e").join("ipsae_scores");
    fs::create_dir_all(&ipsae_dir).unwrap();
    fs::write(ipsae_dir.join("binder_e_model_0_10_10.txt"), "IPSAE: 3.0\n").unwrap();
    fs::write(ipsae_dir.join("binder_e_model_1_10_10.txt"), "IPSAE: 7.0\n").unwrap();

    let predictions = root.join("binder_e_output").join("predictions");
    fs::create_dir_all(&predictions).unwrap();
    fs::write(predictions.join("scores.json"), r#"{"plddt": 90.0}"#).unwrap();

    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    let result = run_consolidation(&root, &out);

    assert_eq!(result.n_designs, 1);
    assert_eq!(result.n_candidates, 2, "one candidate per model");

    let csv = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    let header: Vec<&str> = lines[0].split(',').collect();
    let col = |name: &str| header.iter().position(|h| *h == name).unwrap();

    // Both models inherit the design-level confidence; the better
    // interface score ranks first
    for line in &lines[1..] {
        let row: Vec<&str> = line.split(',').collect();
        assert_eq!(row[col("plddt_avg")], "90", "design-level metric not inherited");
    }
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first[col("model_id")], "binder_e_model_0");
    assert_eq!(first[col("rank")], "1");
}
