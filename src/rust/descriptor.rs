//! Fold-input descriptor parsing, validation and serialization.
//!
//! The descriptor schema belongs to the downstream inference tool; only the
//! job name and the protein entries are interpreted here. Everything else
//! (model seeds, ligand/nucleic entries, dialect markers) is carried through
//! untouched via flattened maps so the enriched output stays a valid input
//! for the consumer.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::slice;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{PipelineError, PipelineResult, PipelineResultExt};

/// Suffix appended to the job name for the enriched descriptor file
pub const DATA_JSON_SUFFIX: &str = "_data.json";

/// Chain identifier field of a protein entry: a single chain or a group of
/// identical copies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainIds {
    One(String),
    Group(Vec<String>),
}

impl ChainIds {
    /// All identifiers carried by this entry
    pub fn all(&self) -> &[String] {
        match self {
            ChainIds::One(id) => slice::from_ref(id),
            ChainIds::Group(ids) => ids,
        }
    }

    /// The identifier used to label this entry's query record
    pub fn primary(&self) -> Option<&str> {
        self.all().first().map(String::as_str)
    }
}

/// A protein entry of the descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProteinChain {
    pub id: ChainIds,
    pub sequence: String,
    #[serde(rename = "unpairedMsa", skip_serializing_if = "Option::is_none")]
    pub unpaired_msa: Option<String>,
    #[serde(rename = "pairedMsa", skip_serializing_if = "Option::is_none")]
    pub paired_msa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of the `sequences` array; non-protein entries are opaque
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<ProteinChain>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fold-input descriptor naming one or more molecular sequences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldInput {
    pub name: String,
    pub sequences: Vec<SequenceEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FoldInput {
    /// Parse and validate a descriptor from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> PipelineResult<Self> {
        let input: FoldInput = serde_json::from_reader(reader)
            .map_err(|e| PipelineError::input(format!("invalid descriptor JSON: {}", e)))?;
        input.validate()?;
        Ok(input)
    }

    /// Validate the descriptor invariants
    pub fn validate(&self) -> PipelineResult<()> {
        if self.name.is_empty() {
            return Err(PipelineError::input("descriptor name must not be empty"));
        }
        if self.name.contains(&['/', '\\'][..]) {
            return Err(PipelineError::input(format!(
                "descriptor name `{}` must not contain path separators",
                self.name
            )));
        }

        let mut seen_ids = HashSet::new();
        let mut num_proteins = 0usize;
        for (i, entry) in self.sequences.iter().enumerate() {
            let Some(protein) = &entry.protein else {
                continue;
            };
            num_proteins += 1;

            let ids = protein.id.all();
            if ids.is_empty() {
                return Err(PipelineError::input(format!(
                    "protein entry {}: empty chain identifier group",
                    i
                )));
            }
            for id in ids {
                crate::types::ChainId::new(id)
                    .with_input_context(|| format!("protein entry {}", i))?;
                if !seen_ids.insert(id.clone()) {
                    return Err(PipelineError::input(format!(
                        "protein entry {}: duplicate chain identifier `{}`",
                        i, id
                    )));
                }
            }

            if protein.sequence.is_empty() {
                return Err(PipelineError::input(format!(
                    "protein entry {}: empty sequence",
                    i
                )));
            }
            if let Some(bad) = protein.sequence.chars().find(|c| !c.is_ascii_uppercase()) {
                return Err(PipelineError::input(format!(
                    "protein entry {}: invalid residue `{}` in sequence",
                    i, bad
                )));
            }
        }

        if num_proteins == 0 {
            return Err(PipelineError::input("descriptor contains no protein entries"));
        }

        Ok(())
    }

    /// Protein entries in descriptor order
    pub fn protein_chains(&self) -> impl Iterator<Item = &ProteinChain> {
        self.sequences.iter().filter_map(|entry| entry.protein.as_ref())
    }

    /// Mutable protein entries in descriptor order
    pub fn protein_chains_mut(&mut self) -> impl Iterator<Item = &mut ProteinChain> {
        self.sequences.iter_mut().filter_map(|entry| entry.protein.as_mut())
    }

    /// Number of protein entries
    pub fn num_protein_chains(&self) -> usize {
        self.protein_chains().count()
    }

    /// Write the combined query FASTA for all protein entries
    ///
    /// One record per protein entry, labelled `>{name}_{chain_id}` with the
    /// entry's primary chain identifier.
    pub fn write_query_fasta<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for protein in self.protein_chains() {
            let chain_id = protein.id.primary().unwrap_or_default();
            writeln!(writer, ">{}_{}", self.name, chain_id)?;
            writeln!(writer, "{}", protein.sequence)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Serialize the enriched descriptor to `<dir>/<name>_data.json`
    pub fn write_data_json<P: AsRef<Path>>(&self, dir: P) -> PipelineResult<PathBuf> {
        let path = dir.as_ref().join(format!("{}{}", self.name, DATA_JSON_SUFFIX));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(path)
    }
}
