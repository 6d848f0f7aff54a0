//! Identity resolution: mapping artifact paths to (design, model) keys
//!
//! Every upstream tool encodes the design identity differently in its
//! paths and filenames. Each tool gets exactly one resolution rule,
//! dispatched by `ToolKind`; a silent mis-association here corrupts the
//! final ranking without any error surfacing, so every rule is covered
//! by path fixture tests.

use crate::locate::ToolKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Canonical identity of an artifact: which design it belongs to, and
/// optionally which model/sequence variant of that design.
///
/// `design_id` must be stable across all tool outputs for the same
/// underlying design; that invariant is the whole contract of this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    /// Stable design identifier
    pub design_id: String,
    /// Model / sequence variant; `None` means design-level
    pub model_id: Option<String>,
}

impl Identity {
    /// Design-level identity
    pub fn design(design_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            model_id: None,
        }
    }

    /// Model-level identity
    pub fn model(design_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            model_id: Some(model_id.into()),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.model_id {
            Some(model) => write!(f, "{}/{}", self.design_id, model),
            None => write!(f, "{}", self.design_id),
        }
    }
}

/// Suffixes recognized on interface score filenames, most specific first
const IPSAE_SUFFIXES: &[&str] = &["_10_10.txt", ".txt"];

/// Suffixes recognized on binding affinity summaries, most specific first
const PRODIGY_SUFFIXES: &[&str] = &["_prodigy_summary.csv", "_summary.csv", ".csv"];

/// Suffixes recognized on similarity hit lists, most specific first
const FOLDSEEK_SUFFIXES: &[&str] = &["_foldseek_summary.tsv", "_summary.tsv", ".tsv"];

/// Intermediate directory that marks per-model interface scores
const IPSAE_DIR: &str = "ipsae_scores";

/// Intermediate directory that marks per-model affinity summaries
const PRODIGY_DIR: &str = "prodigy";

/// Suffix on sequence-redesign output directories
const MPNN_DIR_SUFFIX: &str = "_mpnn_optimized";

fn mpnn_dir_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<design>.+)_mpnn_(?P<seq>\d+)$").expect("static regex"))
}

/// Strip the longest matching suffix from `name`.
///
/// When a filename could match several suffix conventions, the most
/// specific (longest) match wins; a name consisting solely of the suffix
/// does not match.
fn strip_longest_suffix<'a>(name: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    for suffix in suffixes {
        if name.len() > suffix.len() && name.ends_with(suffix) {
            let stripped = &name[..name.len() - suffix.len()];
            if best.map_or(true, |b| stripped.len() < b.len()) {
                best = Some(stripped);
            }
        }
    }
    best
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn parent_name(path: &Path) -> Option<&str> {
    path.parent().and_then(file_name)
}

fn grandparent_name(path: &Path) -> Option<&str> {
    path.parent().and_then(|p| p.parent()).and_then(file_name)
}

/// Resolve the identity an artifact belongs to.
///
/// Returns `None` when no rule applies; the caller skips the artifact
/// with a warning rather than crashing the run.
pub fn resolve_identity(path: &Path, tool: ToolKind) -> Option<Identity> {
    match tool {
        ToolKind::Ipsae => resolve_ipsae(path),
        ToolKind::Prodigy => resolve_prodigy(path),
        ToolKind::Foldseek => resolve_foldseek(path),
        ToolKind::Confidence => resolve_confidence(path),
        ToolKind::Mpnn => resolve_mpnn(path),
    }
}

/// Interface scores live under `<design>/ipsae_scores/<model>_10_10.txt`:
/// design from the grandparent directory, model from the filename stem.
fn resolve_ipsae(path: &Path) -> Option<Identity> {
    let name = file_name(path)?;
    let stem = strip_longest_suffix(name, IPSAE_SUFFIXES)?;

    if parent_name(path) == Some(IPSAE_DIR) {
        let design = grandparent_name(path)?;
        // A stem equal to the design name carries no model information
        if stem == design {
            return Some(Identity::design(design));
        }
        return Some(Identity::model(design, stem));
    }

    // Not under the expected intermediate directory: the parent is the
    // design directory itself
    let design = parent_name(path)?;
    Some(Identity::model(design, stem))
}

/// Affinity summaries are named `<id>_prodigy_summary.csv`. Under a
/// `prodigy` intermediate directory the grandparent names the design and
/// the stem names the model (unless they coincide, which is the common
/// one-summary-per-design layout); anywhere else the stem is the design.
fn resolve_prodigy(path: &Path) -> Option<Identity> {
    let name = file_name(path)?;
    let stem = strip_longest_suffix(name, PRODIGY_SUFFIXES)?;

    if parent_name(path) == Some(PRODIGY_DIR) {
        if let Some(design) = grandparent_name(path) {
            if stem == design {
                return Some(Identity::design(design));
            }
            return Some(Identity::model(design, stem));
        }
    }

    Some(Identity::design(stem))
}

/// Similarity hit lists are named `<design>_foldseek_summary.tsv`
fn resolve_foldseek(path: &Path) -> Option<Identity> {
    let name = file_name(path)?;
    let stem = strip_longest_suffix(name, FOLDSEEK_SUFFIXES)?;
    Some(Identity::design(stem))
}

/// Confidence artifacts are `predictions` directories: one per design
/// output directory, so the parent names the design (minus the
/// `_output` convention some stages append)
fn resolve_confidence(path: &Path) -> Option<Identity> {
    let parent = parent_name(path)?;
    let design = parent.strip_suffix("_output").unwrap_or(parent);
    if design.is_empty() {
        return None;
    }
    Some(Identity::design(design))
}

/// Sequence-redesign outputs appear as `<design>_mpnn_optimized`
/// directories (design-level) or `<design>_mpnn_<n>` variant directories;
/// files inside a variant directory get a model id of directory + stem.
fn resolve_mpnn(path: &Path) -> Option<Identity> {
    let name = file_name(path)?;

    if let Some(design) = name.strip_suffix(MPNN_DIR_SUFFIX) {
        if !design.is_empty() {
            return Some(Identity::design(design));
        }
    }

    if let Some(caps) = mpnn_dir_regex().captures(name) {
        let design = caps.name("design")?.as_str();
        return Some(Identity::model(design, name));
    }

    // File inside a variant directory: `<design>_mpnn_<n>/<stem>.<ext>`
    if let Some(parent) = parent_name(path) {
        if let Some(caps) = mpnn_dir_regex().captures(parent) {
            let design = caps.name("design")?.as_str();
            let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
            return Some(Identity::model(design, format!("{}_{}", parent, stem)));
        }
        if let Some(design) = parent.strip_suffix(MPNN_DIR_SUFFIX) {
            if !design.is_empty() {
                let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
                return Some(Identity::model(design, stem));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// One row per rule: (tool, path, expected identity)
    fn fixtures() -> Vec<(ToolKind, &'static str, Option<Identity>)> {
        vec![
            // Interface scores: grandparent design, stem model
            (
                ToolKind::Ipsae,
                "run/binder_7/ipsae_scores/binder_7_model_0_10_10.txt",
                Some(Identity::model("binder_7", "binder_7_model_0")),
            ),
            // Stem equal to design collapses to design-level
            (
                ToolKind::Ipsae,
                "run/binder_7/ipsae_scores/binder_7_10_10.txt",
                Some(Identity::design("binder_7")),
            ),
            // Outside the intermediate directory the parent is the design
            (
                ToolKind::Ipsae,
                "run/binder_9/scores_10_10.txt",
                Some(Identity::model("binder_9", "scores")),
            ),
            // Affinity summary in the standard per-design layout
            (
                ToolKind::Prodigy,
                "run/binder_7/prodigy/binder_7_prodigy_summary.csv",
                Some(Identity::design("binder_7")),
            ),
            // Per-model affinity summary
            (
                ToolKind::Prodigy,
                "run/binder_7/prodigy/binder_7_model_2_prodigy_summary.csv",
                Some(Identity::model("binder_7", "binder_7_model_2")),
            ),
            // Flat layout falls back to stem-as-design
            (
                ToolKind::Prodigy,
                "run/binder_3_prodigy_summary.csv",
                Some(Identity::design("binder_3")),
            ),
            // Similarity hit list
            (
                ToolKind::Foldseek,
                "run/binder_7/foldseek/binder_7_foldseek_summary.tsv",
                Some(Identity::design("binder_7")),
            ),
            // Confidence predictions directory, with and without _output
            (
                ToolKind::Confidence,
                "run/binder_7_output/predictions",
                Some(Identity::design("binder_7")),
            ),
            (
                ToolKind::Confidence,
                "run/binder_8/predictions",
                Some(Identity::design("binder_8")),
            ),
            // Sequence redesign output directory
            (
                ToolKind::Mpnn,
                "run/binder_7_mpnn_optimized",
                Some(Identity::design("binder_7")),
            ),
            // Variant directory
            (
                ToolKind::Mpnn,
                "run/binder_7_mpnn_3",
                Some(Identity::model("binder_7", "binder_7_mpnn_3")),
            ),
            // File inside a variant directory: model = dir + stem
            (
                ToolKind::Mpnn,
                "run/binder_7_mpnn_3/seqs.fasta",
                Some(Identity::model("binder_7", "binder_7_mpnn_3_seqs")),
            ),
            // Unresolvable
            (ToolKind::Mpnn, "run/notes.txt", None),
        ]
    }

    #[test]
    fn test_identity_fixture_table() {
        for (tool, path, expected) in fixtures() {
            let resolved = resolve_identity(&PathBuf::from(path), tool);
            assert_eq!(
                resolved, expected,
                "identity mismatch for {} artifact {}",
                tool, path
            );
        }
    }

    #[test]
    fn test_longest_suffix_wins() {
        // `_prodigy_summary.csv` and `_summary.csv` both match; the more
        // specific one must win or the design id keeps a stray suffix
        let stem = strip_longest_suffix("binder_1_prodigy_summary.csv", PRODIGY_SUFFIXES);
        assert_eq!(stem, Some("binder_1"));

        let stem = strip_longest_suffix("binder_1_summary.csv", PRODIGY_SUFFIXES);
        assert_eq!(stem, Some("binder_1"));

        // A name that *is* the suffix does not resolve
        assert_eq!(strip_longest_suffix("_summary.csv", PRODIGY_SUFFIXES), None);
    }

    #[test]
    fn test_design_id_stable_across_tools() {
        // The same design seen through four different tools must resolve
        // to the same design_id
        let cases = [
            (ToolKind::Ipsae, "out/binder_x/ipsae_scores/binder_x_model_0_10_10.txt"),
            (ToolKind::Prodigy, "out/binder_x/prodigy/binder_x_prodigy_summary.csv"),
            (ToolKind::Foldseek, "out/binder_x/foldseek/binder_x_foldseek_summary.tsv"),
            (ToolKind::Confidence, "out/binder_x_output/predictions"),
        ];
        for (tool, path) in cases {
            let id = resolve_identity(&PathBuf::from(path), tool)
                .unwrap_or_else(|| panic!("unresolved {} artifact", tool));
            assert_eq!(id.design_id, "binder_x", "design drift via {}", tool);
        }
    }
}
