//! A3M post-processing: taxonomy attachment and per-chain splitting.
//!
//! The search tool leaves one raw A3M per query in its results directory.
//! Each file holds a UniRef section (query first, then UniRef hits) followed
//! by an environmental section that repeats the query record before its own
//! hits. UniRef hits are rewritten to the `cb|accession|accession_taxid`
//! header convention so the species code is recoverable downstream; all
//! other hits are kept verbatim.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::{PipelineError, PipelineResult};
use crate::io::open_maybe_compressed;
use crate::species::extract_species_code;
use crate::types::{SpeciesCode, TaxId};

/// File name of the pairing hit set inside a chain directory
pub const UNIREF_HITS_FILE: &str = "uniref100_hits.a3m";
/// File name of the non-pairing hit set inside a chain directory
pub const OTHER_HITS_FILE: &str = "mmseqs_other_hits.a3m";
/// Hit-name to NCBI TaxID table emitted by the search tool
pub const TAXONOMY_MAP_FILE: &str = "uniref_tax.m8";

const UNIREF_PREFIX: &str = "UniRef100";

/// One header/sequence record of search output, annotated with the species
/// code recovered from its header (empty when the header does not match the
/// database naming convention)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentHit {
    /// Header line without the leading `>`
    pub header: String,
    /// Aligned sequence text
    pub sequence: String,
    /// Species code extracted from the header, if any
    pub species: Option<SpeciesCode>,
}

impl AlignmentHit {
    pub fn new(header: String, sequence: String) -> Self {
        let species = extract_species_code(&header);
        if species.is_none() {
            debug!(
                "No species code in hit header `{}`",
                header.split('\t').next().unwrap_or_default()
            );
        }
        AlignmentHit { header, sequence, species }
    }
}

/// An A3M file as produced by the search tool
#[derive(Debug, Clone)]
pub struct A3m {
    /// Header/sequence records in file order, query first; headers are
    /// stored without the leading `>`
    pub records: Vec<(String, String)>,
    /// Record index of the duplicated query that opens the environmental
    /// section; 0 when the file has no such section
    pub uniref_boundary: usize,
}

/// Read an A3M file, locating the UniRef/environmental boundary
pub fn read_a3m<P: AsRef<Path>>(path: P) -> PipelineResult<A3m> {
    let path = path.as_ref();
    let reader = open_maybe_compressed(path)?;

    let mut headers: Vec<String> = Vec::new();
    let mut sequences: Vec<String> = Vec::new();
    let mut uniref_boundary = 0usize;

    for line in reader.lines() {
        let line = line?;
        if let Some(header) = line.strip_prefix('>') {
            if !headers.is_empty() && header == headers[0] {
                uniref_boundary = headers.len();
            }
            headers.push(header.to_string());
        } else {
            sequences.push(line);
        }
    }

    if headers.is_empty() {
        return Err(PipelineError::alignment(path, "no alignment records"));
    }
    if headers.len() != sequences.len() {
        return Err(PipelineError::alignment(
            path,
            format!(
                "header/sequence count mismatch: {} headers, {} sequences",
                headers.len(),
                sequences.len()
            ),
        ));
    }

    let records = headers.into_iter().zip(sequences).collect();
    Ok(A3m { records, uniref_boundary })
}

/// Read the hit-name to TaxID table (`uniref_tax.m8`)
///
/// Tab-separated rows of query, hit name, TaxID; further columns are
/// ignored and malformed TaxIDs are skipped with a warning.
pub fn read_taxonomy_map<P: AsRef<Path>>(path: P) -> PipelineResult<HashMap<String, TaxId>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path.as_ref())?;

    let mut map = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(hit_name), Some(taxid)) = (record.get(1), record.get(2)) else {
            continue;
        };
        match TaxId::new(taxid) {
            Ok(taxid) => {
                map.insert(hit_name.to_string(), taxid);
            }
            Err(e) => warn!("Skipping taxonomy row for `{}`: {}", hit_name, e),
        }
    }
    Ok(map)
}

/// Rewrite a raw A3M so UniRef-section hits carry their NCBI TaxID
///
/// Only hits before the environmental boundary are eligible. The rewritten
/// file is written under `out_dir` with the original file name and the
/// original is left untouched.
pub fn attach_taxids<P: AsRef<Path>, Q: AsRef<Path>>(
    a3m_path: P,
    taxonomy: &HashMap<String, TaxId>,
    out_dir: Q,
) -> PipelineResult<PathBuf> {
    let a3m_path = a3m_path.as_ref();
    let a3m = read_a3m(a3m_path)?;

    let file_name = a3m_path
        .file_name()
        .ok_or_else(|| PipelineError::alignment(a3m_path, "missing file name"))?;
    let out_path = out_dir.as_ref().join(file_name);
    let mut writer = BufWriter::new(File::create(&out_path)?);

    let mut attached = 0usize;
    for (idx, (header, sequence)) in a3m.records.iter().enumerate() {
        let mut header = header.clone();
        if idx < a3m.uniref_boundary {
            let hit_name = header.split('\t').next().unwrap_or_default().to_string();
            if !hit_name.is_empty() {
                if let Some(taxid) = taxonomy.get(&hit_name) {
                    let rewritten = if hit_name.starts_with(UNIREF_PREFIX) {
                        format!("{}_{}/", hit_name, taxid)
                    } else {
                        format!("{}_{}_{}/", UNIREF_PREFIX, hit_name, taxid)
                    };
                    header = header.replacen(&hit_name, &rewritten, 1);
                    attached += 1;
                }
            }
        }
        writeln!(writer, ">{}", header)?;
        writeln!(writer, "{}", sequence)?;
    }
    writer.flush()?;

    debug!("Attached {} TaxIDs in {}", attached, out_path.display());
    Ok(out_path)
}

/// Alignment hits of one chain split into pairing and non-pairing sets
#[derive(Debug, Clone)]
pub struct ChainSplit {
    pub query_sequence: String,
    /// UniRef-derived hits, headers rewritten to the `cb|` convention
    pub pairing: Vec<AlignmentHit>,
    /// Environmental and other hits, duplicated query record dropped
    pub other: Vec<AlignmentHit>,
}

impl ChainSplit {
    fn render(&self, hits: &[AlignmentHit]) -> String {
        let mut out = String::from(">query\n");
        out.push_str(&self.query_sequence);
        out.push('\n');
        for hit in hits {
            out.push('>');
            out.push_str(&hit.header);
            out.push('\n');
            out.push_str(&hit.sequence);
            out.push('\n');
        }
        out
    }

    /// Pairing hit set as A3M text, `None` when there are no pairing hits
    pub fn pairing_a3m(&self) -> Option<String> {
        (!self.pairing.is_empty()).then(|| self.render(&self.pairing))
    }

    /// Non-pairing hit set as A3M text, `None` when empty
    pub fn other_a3m(&self) -> Option<String> {
        (!self.other.is_empty()).then(|| self.render(&self.other))
    }

    /// Write the split hit sets into a chain directory
    ///
    /// At least one of the two sets must be non-empty.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> PipelineResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut wrote = false;
        if let Some(text) = self.pairing_a3m() {
            std::fs::write(dir.join(UNIREF_HITS_FILE), text)?;
            wrote = true;
        }
        if let Some(text) = self.other_a3m() {
            std::fs::write(dir.join(OTHER_HITS_FILE), text)?;
            wrote = true;
        }
        if !wrote {
            return Err(PipelineError::alignment(dir, "no pairing or non-pairing alignments"));
        }
        Ok(())
    }
}

/// Split one A3M into pairing and non-pairing hit sets
///
/// Returns `Ok(None)` for files that cannot be used for a chain (empty
/// query sequence, malformed records); these are logged and skipped rather
/// than aborting the whole run.
pub fn split_chain<P: AsRef<Path>>(a3m_path: P) -> PipelineResult<Option<ChainSplit>> {
    let a3m_path = a3m_path.as_ref();
    let a3m = match read_a3m(a3m_path) {
        Ok(a3m) => a3m,
        Err(PipelineError::Alignment { path, message }) => {
            warn!("Skipping {}: {}", path.display(), message);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let (_, query_sequence) = &a3m.records[0];
    if query_sequence.is_empty() {
        warn!("Skipping {}: empty query sequence", a3m_path.display());
        return Ok(None);
    }

    let mut pairing = Vec::new();
    let mut other = Vec::new();
    for (header, sequence) in a3m.records.iter().skip(1) {
        if header.starts_with(UNIREF_PREFIX) {
            let first_field = header.split('\t').next().unwrap_or_default();
            let parts: Vec<&str> = first_field.split('_').collect();
            let Some(accession) = parts.get(1).filter(|a| !a.is_empty()) else {
                warn!(
                    "Skipping {}: malformed UniRef header `{}`",
                    a3m_path.display(),
                    first_field
                );
                return Ok(None);
            };
            let rewritten = if parts.len() == 3 {
                format!("cb|{}|{}_{}", accession, accession, parts[2])
            } else {
                format!("cb|{}|{}/", accession, accession)
            };
            pairing.push(AlignmentHit::new(rewritten, sequence.clone()));
        } else {
            other.push(AlignmentHit::new(header.clone(), sequence.clone()));
        }
    }

    // The environmental section repeats the query record; drop it.
    if !other.is_empty() {
        other.remove(0);
    }

    let misses =
        pairing.iter().chain(other.iter()).filter(|hit| hit.species.is_none()).count();
    if misses > 0 {
        debug!("{}: {} hits without species code", a3m_path.display(), misses);
    }

    Ok(Some(ChainSplit { query_sequence: query_sequence.clone(), pairing, other }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const RAW_A3M: &str = "\
>job_A
MKVLA
>UniRef100_P12345\tn=1 Tax=Loxosceles laeta
MKALA
>job_A
MKVLA
>SRR5438477_1\tenv hit
MKCLA
";

    #[test]
    fn test_read_a3m_boundary() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", RAW_A3M);

        let a3m = read_a3m(&path).unwrap();
        assert_eq!(a3m.records.len(), 4);
        assert_eq!(a3m.records[0].0, "job_A");
        assert_eq!(a3m.records[0].1, "MKVLA");
        assert_eq!(a3m.uniref_boundary, 2);
    }

    #[test]
    fn test_read_a3m_without_env_section() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", ">job_A\nMKVLA\n>UniRef100_P12345\nMKALA\n");

        let a3m = read_a3m(&path).unwrap();
        assert_eq!(a3m.uniref_boundary, 0);
    }

    #[test]
    fn test_read_a3m_rejects_mismatched_records() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", ">job_A\nMKVLA\n>h1\n>h2\nMKALA\n");

        let err = read_a3m(&path).unwrap_err();
        assert!(err.to_string().contains("count mismatch"));
    }

    #[test]
    fn test_read_taxonomy_map() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(
            &dir,
            TAXONOMY_MAP_FILE,
            "job_A\tUniRef100_P12345\t9606\t0.99\njob_A\tUniRef100_Q99999\tbogus\n",
        );

        let map = read_taxonomy_map(&path).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["UniRef100_P12345"].get(), "9606");
    }

    #[test]
    fn test_attach_taxids_rewrites_uniref_section_only() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", RAW_A3M);

        let mut taxonomy = HashMap::new();
        taxonomy.insert("UniRef100_P12345".to_string(), TaxId::new("9606").unwrap());
        // Env-section hits must not be rewritten even when mapped
        taxonomy.insert("SRR5438477_1".to_string(), TaxId::new("303").unwrap());

        let rewritten = attach_taxids(&path, &taxonomy, out.path()).unwrap();
        let a3m = read_a3m(&rewritten).unwrap();
        assert_eq!(a3m.records[1].0, "UniRef100_P12345_9606/\tn=1 Tax=Loxosceles laeta");
        assert_eq!(a3m.records[3].0, "SRR5438477_1\tenv hit");
    }

    #[test]
    fn test_attach_taxids_prefixes_bare_accessions() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path =
            write_fixture(&dir, "0.a3m", ">job_A\nMKVLA\n>P12345\tx\nMKALA\n>job_A\nMKVLA\n");

        let mut taxonomy = HashMap::new();
        taxonomy.insert("P12345".to_string(), TaxId::new("9606").unwrap());

        let rewritten = attach_taxids(&path, &taxonomy, out.path()).unwrap();
        let a3m = read_a3m(&rewritten).unwrap();
        assert_eq!(a3m.records[1].0, "UniRef100_P12345_9606/\tx");
    }

    #[test]
    fn test_split_chain_rewrites_and_drops_duplicate_query() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", RAW_A3M);

        let mut taxonomy = HashMap::new();
        taxonomy.insert("UniRef100_P12345".to_string(), TaxId::new("9606").unwrap());
        let rewritten = attach_taxids(&path, &taxonomy, out.path()).unwrap();

        let split = split_chain(&rewritten).unwrap().unwrap();
        assert_eq!(split.query_sequence, "MKVLA");

        // Annotations after the first tab are discarded by the rewrite
        assert_eq!(split.pairing.len(), 1);
        assert_eq!(split.pairing[0].header, "cb|P12345|P12345_9606/");
        assert_eq!(split.pairing[0].species.as_ref().unwrap().get(), "9606");

        // Duplicated query dropped, env hit retained without a species code
        assert_eq!(split.other.len(), 1);
        assert!(split.other[0].header.starts_with("SRR5438477_1"));
        assert_eq!(split.other[0].species, None);
    }

    #[test]
    fn test_split_chain_without_taxids() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", RAW_A3M);

        let split = split_chain(&path).unwrap().unwrap();
        assert_eq!(split.pairing[0].header, "cb|P12345|P12345/");
        assert_eq!(split.pairing[0].species, None);
    }

    #[test]
    fn test_split_chain_skips_empty_query() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", ">job_A\n\n>UniRef100_P12345\nMKALA\n");

        assert!(split_chain(&path).unwrap().is_none());
    }

    #[test]
    fn test_split_chain_skips_malformed_records() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", ">job_A\nMKVLA\n>h1\n>h2\nMKALA\n");

        assert!(split_chain(&path).unwrap().is_none());
    }

    #[test]
    fn test_write_split_files() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "0.a3m", RAW_A3M);
        let split = split_chain(&path).unwrap().unwrap();

        let chain_dir = dir.path().join("0");
        split.write(&chain_dir).unwrap();

        let pairing = std::fs::read_to_string(chain_dir.join(UNIREF_HITS_FILE)).unwrap();
        assert!(pairing.starts_with(">query\nMKVLA\n"));
        assert!(pairing.contains("cb|P12345|P12345/"));

        let other = std::fs::read_to_string(chain_dir.join(OTHER_HITS_FILE)).unwrap();
        assert!(other.starts_with(">query\nMKVLA\n"));
        assert!(other.contains("SRR5438477_1"));
        assert!(!other.contains("job_A"));
    }

    #[test]
    fn test_write_split_rejects_empty_split() {
        let dir = TempDir::new().unwrap();
        let split = ChainSplit {
            query_sequence: "MKVLA".to_string(),
            pairing: Vec::new(),
            other: Vec::new(),
        };

        let err = split.write(dir.path().join("0")).unwrap_err();
        assert!(err.to_string().contains("no pairing or non-pairing"));
    }
}
