use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, PipelineResult};

fn default_db1() -> String {
    "uniref30_2302_db".to_string()
}

fn default_db3() -> Option<String> {
    Some("colabfold_envdb_202108_db".to_string())
}

fn default_true() -> bool {
    true
}

fn default_threads() -> u32 {
    32
}

/// Configuration for the external ColabFold search invocation
///
/// Loaded from a YAML file; every field except the binary and database
/// locations has a serde default matching the search wrapper's own
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Path to the `colabfold_search` wrapper binary
    pub colabsearch_bin_path: PathBuf,
    /// Path to the lower-level `mmseqs` binary; falls back to `mmseqs` on PATH
    #[serde(default)]
    pub mmseqs_bin_path: Option<PathBuf>,
    /// Directory holding the sequence databases
    pub colabfold_db_dir: PathBuf,
    /// Primary (UniRef) database name
    #[serde(default = "default_db1")]
    pub db1: String,
    /// Optional template database name
    #[serde(default)]
    pub db2: Option<String>,
    /// Environmental database name
    #[serde(default = "default_db3")]
    pub db3: Option<String>,
    /// Whether to search the environmental database
    #[serde(default = "default_true")]
    pub use_env: bool,
    /// Whether to apply the wrapper's diversity filter
    #[serde(default = "default_true")]
    pub filter: bool,
    /// Database load mode passed through to mmseqs (0 = disk)
    #[serde(default)]
    pub db_load_mode: u8,
    /// Worker threads for the search tool
    #[serde(default = "default_threads")]
    pub threads: u32,
}

impl SearchConfig {
    /// Load a configuration from a YAML file and validate it
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| PipelineError::Configuration {
            field: "config".to_string(),
            message: format!("cannot open {}: {}", path.as_ref().display(), e),
        })?;
        let config: SearchConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PipelineResult<()> {
        if self.colabsearch_bin_path.as_os_str().is_empty() {
            return Err(PipelineError::Configuration {
                field: "colabsearch_bin_path".to_string(),
                message: "search binary path must not be empty".to_string(),
            });
        }

        if self.colabfold_db_dir.as_os_str().is_empty() {
            return Err(PipelineError::Configuration {
                field: "colabfold_db_dir".to_string(),
                message: "database directory must not be empty".to_string(),
            });
        }

        if self.db1.is_empty() {
            return Err(PipelineError::Configuration {
                field: "db1".to_string(),
                message: "primary database name must not be empty".to_string(),
            });
        }

        if self.threads == 0 {
            return Err(PipelineError::Configuration {
                field: "threads".to_string(),
                message: "thread count must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Effective mmseqs binary: the configured path or `mmseqs` on PATH
    pub fn effective_mmseqs(&self) -> PathBuf {
        self.mmseqs_bin_path.clone().unwrap_or_else(|| PathBuf::from("mmseqs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        "colabsearch_bin_path: /opt/colabfold/colabfold_search\n\
         colabfold_db_dir: /data/colabfold_db\n"
    }

    #[test]
    fn test_defaults_from_minimal_yaml() {
        let config: SearchConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.db1, "uniref30_2302_db");
        assert_eq!(config.db2, None);
        assert_eq!(config.db3.as_deref(), Some("colabfold_envdb_202108_db"));
        assert!(config.use_env);
        assert!(config.filter);
        assert_eq!(config.db_load_mode, 0);
        assert_eq!(config.threads, 32);
        assert_eq!(config.effective_mmseqs(), PathBuf::from("mmseqs"));
    }

    #[test]
    fn test_explicit_overrides() {
        let yaml = "colabsearch_bin_path: /opt/colabfold/colabfold_search\n\
                    colabfold_db_dir: /data/colabfold_db\n\
                    mmseqs_bin_path: /opt/mmseqs/bin/mmseqs\n\
                    db1: uniref30_2202_db\n\
                    db3: null\n\
                    use_env: false\n\
                    threads: 8\n";
        let config: SearchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.db1, "uniref30_2202_db");
        assert_eq!(config.db3, None);
        assert!(!config.use_env);
        assert_eq!(config.threads, 8);
        assert_eq!(config.effective_mmseqs(), PathBuf::from("/opt/mmseqs/bin/mmseqs"));
    }

    #[test]
    fn test_validation_rejects_zero_threads() {
        let yaml = format!("{}threads: 0\n", minimal_yaml());
        let config: SearchConfig = serde_yaml::from_str(&yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = format!("{}no_such_option: 1\n", minimal_yaml());
        assert!(serde_yaml::from_str::<SearchConfig>(&yaml).is_err());
    }
}
