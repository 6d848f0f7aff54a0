//! Chain-to-sequence extraction from structure files
//!
//! For binder design the target is typically the larger protein, not the
//! designed chain. This module pulls per-chain sequences out of mmCIF and
//! PDB files so downstream multimer prediction can be seeded with the
//! target sequence. It shares the parsing-robustness policy of the metric
//! parsers but is not part of the metric schema.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Chain id mapped to its one-letter amino acid sequence
pub type ChainSequences = BTreeMap<String, String>;

/// 3-letter to 1-letter residue code; unknown residues become 'X'
pub fn three_to_one(residue: &str) -> char {
    match residue.to_uppercase().as_str() {
        "ALA" => 'A',
        "CYS" => 'C',
        "ASP" => 'D',
        "GLU" => 'E',
        "PHE" => 'F',
        "GLY" => 'G',
        "HIS" => 'H',
        "ILE" => 'I',
        "LYS" => 'K',
        "LEU" => 'L',
        "MET" => 'M',
        "ASN" => 'N',
        "PRO" => 'P',
        "GLN" => 'Q',
        "ARG" => 'R',
        "SER" => 'S',
        "THR" => 'T',
        "VAL" => 'V',
        "TRP" => 'W',
        "TYR" => 'Y',
        _ => 'X',
    }
}

/// Load chain sequences from a structure file, dispatching on extension.
///
/// Supported: `.cif` (mmCIF), `.pdb` / `.ent` (SEQRES records).
pub fn load_chain_sequences(path: &Path) -> Result<ChainSequences> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "cif" => parse_cif_sequences(path),
        "pdb" | "ent" => parse_pdb_sequences(path),
        other => anyhow::bail!(
            "Unsupported structure format '.{}' for {} (supported: .cif, .pdb, .ent)",
            other,
            path.display()
        ),
    }
}

/// Parse per-chain sequences from an mmCIF file.
///
/// Uses the `_struct_asym` loop for the entity-to-chain mapping and the
/// `_entity_poly_seq` loop for per-entity residue lists.
pub fn parse_cif_sequences(path: &Path) -> Result<ChainSequences> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read structure file: {}", path.display()))?;

    let mut entity_to_chain: BTreeMap<String, String> = BTreeMap::new();
    let mut entity_seqs: BTreeMap<String, String> = BTreeMap::new();

    let mut in_struct_asym = false;
    let mut in_poly_seq = false;

    for raw in content.lines() {
        let line = raw.trim();

        if line.starts_with("_struct_asym.") {
            in_struct_asym = true;
            in_poly_seq = false;
            continue;
        }
        if line.starts_with("_entity_poly_seq.") {
            in_poly_seq = true;
            in_struct_asym = false;
            continue;
        }
        // Any new category or loop terminates the current data block
        if line.starts_with('_') || line.starts_with('#') || line.starts_with("loop_") {
            in_struct_asym = false;
            in_poly_seq = false;
            continue;
        }
        if line.is_empty() {
            continue;
        }

        if in_struct_asym {
            // Row: chain_id entity_id details
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 {
                entity_to_chain.insert(parts[1].to_string(), parts[0].to_string());
            }
        } else if in_poly_seq {
            // Row: entity_id num mon_id hetero
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                entity_seqs
                    .entry(parts[0].to_string())
                    .or_default()
                    .push(three_to_one(parts[2]));
            }
        }
    }

    let mut chains = ChainSequences::new();
    for (entity_id, seq) in entity_seqs {
        let chain_id = entity_to_chain
            .get(&entity_id)
            .cloned()
            .unwrap_or(entity_id);
        chains.insert(chain_id, seq);
    }
    Ok(chains)
}

/// Parse per-chain sequences from PDB SEQRES records.
pub fn parse_pdb_sequences(path: &Path) -> Result<ChainSequences> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read structure file: {}", path.display()))?;

    let mut chains = ChainSequences::new();
    for line in content.lines() {
        if !line.starts_with("SEQRES") {
            continue;
        }
        // SEQRES fixed columns: chain id at 11, residues from 19
        let chain_id = line.get(11..12).unwrap_or("").trim();
        if chain_id.is_empty() {
            continue;
        }
        let seq = chains.entry(chain_id.to_string()).or_default();
        for residue in line.get(19..).unwrap_or("").split_whitespace() {
            seq.push(three_to_one(residue));
        }
    }
    Ok(chains)
}

/// Pick the target chain: the longest sequence, excluding the designed
/// binder chain when one is named. Ties break on chain id so the choice
/// is deterministic. Falls back to all chains when the exclusion would
/// leave nothing.
pub fn identify_target_chain<'a>(
    sequences: &'a ChainSequences,
    designed_chain: Option<&str>,
) -> Option<(&'a str, &'a str)> {
    if sequences.is_empty() {
        return None;
    }

    let exclude = designed_chain.filter(|d| {
        let others = sequences.keys().any(|c| c.as_str() != *d);
        if !others {
            log::warn!("Only designed chain {} present; keeping it as target", d);
        }
        others
    });

    sequences
        .iter()
        .filter(|(chain, _)| exclude.map_or(true, |d| chain.as_str() != d))
        .max_by(|(ca, sa), (cb, sb)| sa.len().cmp(&sb.len()).then(cb.cmp(ca)))
        .map(|(chain, seq)| (chain.as_str(), seq.as_str()))
}

/// Render chains as FASTA records named `<stem>_chain_<id>`
pub fn format_fasta(stem: &str, chains: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (chain, seq) in chains {
        out.push_str(&format!(">{}_chain_{}\n{}\n", stem, chain, seq));
    }
    out
}
