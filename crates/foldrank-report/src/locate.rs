//! Artifact discovery across the pipeline output tree
//!
//! Each upstream tool writes into its own directory convention; the locator
//! only finds candidate paths, it never opens them. Results are sorted by
//! path so every downstream stage sees a deterministic artifact order.

use crate::config::SearchPatterns;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upstream tool that produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Interface score files
    Ipsae,
    /// Binding affinity summary CSVs
    Prodigy,
    /// Structural similarity hit lists
    Foldseek,
    /// Structure prediction confidence directories
    Confidence,
    /// Sequence redesign output directories
    Mpnn,
}

impl ToolKind {
    /// All tools in a fixed processing order
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Ipsae,
        ToolKind::Prodigy,
        ToolKind::Foldseek,
        ToolKind::Confidence,
        ToolKind::Mpnn,
    ];
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Ipsae => write!(f, "ipsae"),
            ToolKind::Prodigy => write!(f, "prodigy"),
            ToolKind::Foldseek => write!(f, "foldseek"),
            ToolKind::Confidence => write!(f, "confidence"),
            ToolKind::Mpnn => write!(f, "mpnn"),
        }
    }
}

/// A discovered artifact: a path plus the tool it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// File-system path (file or directory, depending on the tool)
    pub path: PathBuf,
    /// Producing tool
    pub tool: ToolKind,
}

/// Find all artifacts for one tool under the root.
///
/// A pattern matching zero paths returns an empty vec, not an error:
/// absence of one tool's output is an expected, common case. Individual
/// unreadable glob entries are logged and skipped.
pub fn locate_tool(root: &Path, tool: ToolKind, pattern: &str) -> Vec<ArtifactRef> {
    let search = root.join(pattern);
    let search_str = search.to_string_lossy();

    let entries = match glob::glob(&search_str) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Invalid {} pattern '{}': {}", tool, pattern, e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => {
                log::warn!("Skipping unreadable {} entry: {}", tool, e);
            }
        }
    }

    // Deterministic order: downstream sort stability depends on it
    paths.sort();

    paths
        .into_iter()
        .map(|path| ArtifactRef { path, tool })
        .collect()
}

/// Locate artifacts for every tool.
///
/// Returns one (tool, artifacts) group per tool in `ToolKind::ALL` order,
/// including tools with no matches.
pub fn locate_all(root: &Path, patterns: &SearchPatterns) -> Vec<(ToolKind, Vec<ArtifactRef>)> {
    ToolKind::ALL
        .iter()
        .map(|&tool| {
            let pattern = match tool {
                ToolKind::Ipsae => &patterns.ipsae,
                ToolKind::Prodigy => &patterns.prodigy,
                ToolKind::Foldseek => &patterns.foldseek,
                ToolKind::Confidence => &patterns.confidence,
                ToolKind::Mpnn => &patterns.mpnn,
            };
            let found = locate_tool(root, tool, pattern);
            log::debug!("{}: {} artifact(s) for pattern '{}'", tool, found.len(), pattern);
            (tool, found)
        })
        .collect()
}
