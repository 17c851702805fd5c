//! Pipeline orchestration: query extraction, search, taxonomy attachment,
//! per-chain splitting and descriptor enrichment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::TempDir;

use crate::a3m;
use crate::descriptor::FoldInput;
use crate::errors::{PipelineError, PipelineResult};
use crate::io::open_input;
use crate::search::SearchTool;

/// File mapping chain directory index to query sequence
pub const CHAIN_SEQ_MAP_FILE: &str = "msa_chain_seq.json";

/// Whether to attach NCBI taxonomy identifiers to UniRef hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaxonomyMode {
    /// Attach for multimers, skip for monomers
    #[default]
    Auto,
    /// Always attach
    On,
    /// Never attach
    Off,
}

impl TaxonomyMode {
    /// Resolve the mode against the number of protein chains
    ///
    /// Paired MSAs are only consumed for multimers, and pairing needs the
    /// taxonomy identifiers; requesting the opposite combination is allowed
    /// but warned about.
    pub fn resolve(self, num_chains: usize) -> bool {
        match self {
            TaxonomyMode::Auto => {
                if num_chains > 1 {
                    info!("Multimer input, attaching taxonomy identifiers");
                    true
                } else {
                    false
                }
            }
            TaxonomyMode::On => {
                if num_chains == 1 {
                    warn!("Monomer input, taxonomy identifiers are only used for pairing");
                }
                true
            }
            TaxonomyMode::Off => {
                if num_chains > 1 {
                    warn!("Multimer input without taxonomy identifiers, paired MSAs cannot be built downstream");
                }
                false
            }
        }
    }
}

/// The descriptor transformer
///
/// Owns a [`SearchTool`] and a taxonomy mode; each call is a single
/// synchronous run with no state surviving it.
pub struct MsaPipeline<S: SearchTool> {
    search: S,
    taxonomy: TaxonomyMode,
}

impl<S: SearchTool> MsaPipeline<S> {
    pub fn new(search: S, taxonomy: TaxonomyMode) -> Self {
        MsaPipeline { search, taxonomy }
    }

    /// Full run: search the databases, then post-process into the enriched
    /// descriptor. Returns the path of the written descriptor.
    pub fn run(
        &self,
        input_path: &Path,
        msa_dir: &Path,
        json_dir: &Path,
    ) -> PipelineResult<PathBuf> {
        let descriptor = load_descriptor(input_path)?;
        let attach = self.taxonomy.resolve(descriptor.num_protein_chains());
        info!("Preparing MSA inputs for `{}`", descriptor.name);

        fs::create_dir_all(msa_dir)?;
        let fasta_path = msa_dir.join(format!("{}.fasta", descriptor.name));
        descriptor.write_query_fasta(&fasta_path)?;
        info!(
            "Wrote {} query records to {}",
            descriptor.num_protein_chains(),
            fasta_path.display()
        );

        self.search.run(&fasta_path, msa_dir, attach)?;

        postprocess(descriptor, msa_dir, json_dir, attach)
    }
}

/// Post-processing only: taxonomy attachment, splitting and descriptor
/// enrichment over an existing results directory, without searching
pub fn annotate(
    input_path: &Path,
    msa_dir: &Path,
    json_dir: &Path,
    taxonomy: TaxonomyMode,
) -> PipelineResult<PathBuf> {
    let descriptor = load_descriptor(input_path)?;
    let attach = taxonomy.resolve(descriptor.num_protein_chains());
    info!("Annotating existing search results for `{}`", descriptor.name);

    postprocess(descriptor, msa_dir, json_dir, attach)
}

fn postprocess(
    mut descriptor: FoldInput,
    msa_dir: &Path,
    json_dir: &Path,
    attach: bool,
) -> PipelineResult<PathBuf> {
    let raw_a3ms = collect_a3m_paths(msa_dir)?;
    if raw_a3ms.is_empty() {
        return Err(PipelineError::alignment(msa_dir, "no A3M files found"));
    }

    // Rewrite into scratch space so the raw tool output stays verbatim.
    let mut scratch: Option<TempDir> = None;
    let sources: Vec<PathBuf> = if attach {
        let taxonomy = a3m::read_taxonomy_map(msa_dir.join(a3m::TAXONOMY_MAP_FILE))?;
        info!("Loaded {} taxonomy identifiers", taxonomy.len());

        let dir = TempDir::new()?;
        let mut rewritten = Vec::with_capacity(raw_a3ms.len());
        for path in &raw_a3ms {
            rewritten.push(a3m::attach_taxids(path, &taxonomy, dir.path())?);
        }
        scratch = Some(dir);
        rewritten
    } else {
        raw_a3ms
    };

    let mut chain_map: BTreeMap<String, String> = BTreeMap::new();
    for (i, path) in sources.iter().enumerate() {
        let Some(split) = a3m::split_chain(path)? else {
            continue;
        };
        let chain_dir = msa_dir.join(i.to_string());
        split.write(&chain_dir)?;
        chain_map.insert(i.to_string(), split.query_sequence);
    }
    drop(scratch);

    if chain_map.is_empty() {
        return Err(PipelineError::alignment(msa_dir, "no usable alignments"));
    }
    write_chain_seq_map(msa_dir, &chain_map)?;

    // Inverted in key order so duplicate sequences resolve the same way
    // on every run.
    let seq_to_dir: BTreeMap<String, String> =
        chain_map.into_iter().map(|(dir, seq)| (seq, dir)).collect();

    for chain in descriptor.protein_chains_mut() {
        let Some(dir_name) = seq_to_dir.get(&chain.sequence) else {
            return Err(PipelineError::alignment(
                msa_dir,
                format!(
                    "no MSA found for chain `{}`",
                    chain.id.primary().unwrap_or_default()
                ),
            ));
        };
        let chain_dir = msa_dir.join(dir_name);

        chain.unpaired_msa = Some(read_hit_files(&[
            chain_dir.join(a3m::UNIREF_HITS_FILE),
            chain_dir.join(a3m::OTHER_HITS_FILE),
        ])?);
        chain.paired_msa =
            Some(read_hit_files(&[chain_dir.join(a3m::UNIREF_HITS_FILE)])?);
        chain.templates = Some(Vec::new());
    }

    fs::create_dir_all(json_dir)?;
    let out_path = descriptor.write_data_json(json_dir)?;
    info!("Wrote enriched descriptor to {}", out_path.display());
    Ok(out_path)
}

fn load_descriptor(input_path: &Path) -> PipelineResult<FoldInput> {
    let reader = open_input(input_path)?;
    FoldInput::from_reader(reader)
}

/// Raw A3M files of a results directory in name order
fn collect_a3m_paths(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "a3m"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn write_chain_seq_map(msa_dir: &Path, chain_map: &BTreeMap<String, String>) -> PipelineResult<()> {
    let path = msa_dir.join(CHAIN_SEQ_MAP_FILE);
    fs::write(&path, serde_json::to_string_pretty(chain_map)?)?;
    Ok(())
}

/// Concatenate the given hit files, skipping ones that were not produced,
/// and normalize header tabs to spaces for the descriptor
fn read_hit_files(paths: &[PathBuf]) -> PipelineResult<String> {
    let mut text = String::new();
    for path in paths {
        if path.exists() {
            text.push_str(&fs::read_to_string(path)?);
        }
    }
    Ok(text.replace('\t', " "))
}
