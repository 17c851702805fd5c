//! External search tool invocation.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::config::SearchConfig;
use crate::errors::{PipelineError, PipelineResult};

/// Adapter over the external MSA search tool
///
/// This is the only seam through which a subprocess is spawned; tests
/// substitute an implementation that writes canned results instead.
pub trait SearchTool {
    /// Run a search for `query_fasta`, leaving results in `results_dir`
    ///
    /// `attach_taxonomy` asks the tool to also emit its hit-name to TaxID
    /// table alongside the alignments.
    fn run(
        &self,
        query_fasta: &Path,
        results_dir: &Path,
        attach_taxonomy: bool,
    ) -> PipelineResult<()>;
}

/// Production adapter invoking the ColabFold search wrapper binary
pub struct ColabfoldSearch {
    config: SearchConfig,
}

impl ColabfoldSearch {
    pub fn new(config: SearchConfig) -> Self {
        ColabfoldSearch { config }
    }

    /// Assemble the wrapper's argument list
    ///
    /// Positionals first (query, database dir, results dir), then flags.
    /// Boolean flags are passed as `1` and omitted when off, matching the
    /// wrapper's own conventions.
    pub fn command_args(
        &self,
        query_fasta: &Path,
        results_dir: &Path,
        attach_taxonomy: bool,
    ) -> Vec<OsString> {
        let config = &self.config;
        let mut args: Vec<OsString> = vec![
            query_fasta.as_os_str().to_os_string(),
            config.colabfold_db_dir.as_os_str().to_os_string(),
            results_dir.as_os_str().to_os_string(),
        ];

        if !config.db1.is_empty() {
            args.push("--db1".into());
            args.push(config.db1.clone().into());
        }
        if let Some(db2) = &config.db2 {
            args.push("--db2".into());
            args.push(db2.clone().into());
        }
        if let Some(db3) = &config.db3 {
            args.push("--db3".into());
            args.push(db3.clone().into());
        }

        args.push("--mmseqs".into());
        args.push(config.effective_mmseqs().into_os_string());

        if config.use_env {
            args.push("--use-env".into());
            args.push("1".into());
        }
        if config.filter {
            args.push("--filter".into());
            args.push("1".into());
        }
        if config.db_load_mode != 0 {
            args.push("--db-load-mode".into());
            args.push(config.db_load_mode.to_string().into());
        }
        if attach_taxonomy {
            args.push("--add-toxid".into());
            args.push("1".into());
        }
        if config.threads != 0 {
            args.push("--threads".into());
            args.push(config.threads.to_string().into());
        }

        args
    }
}

impl SearchTool for ColabfoldSearch {
    fn run(
        &self,
        query_fasta: &Path,
        results_dir: &Path,
        attach_taxonomy: bool,
    ) -> PipelineResult<()> {
        let program = self.config.colabsearch_bin_path.display().to_string();
        info!("Running {} on {}", program, query_fasta.display());

        let output = Command::new(&self.config.colabsearch_bin_path)
            .args(self.command_args(query_fasta, results_dir, attach_taxonomy))
            .output()
            .map_err(|e| PipelineError::SearchTool {
                program: program.clone(),
                status: "spawn failure".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(PipelineError::SearchTool {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Search completed for {}", query_fasta.display());
        Ok(())
    }
}
