use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input descriptor error: {message}")]
    InputFormat { message: String },

    #[error("Search tool `{program}` failed ({status}): {stderr}")]
    SearchTool { program: String, status: String, stderr: String },

    #[error("Configuration error: {field} - {message}")]
    Configuration { field: String, message: String },

    #[error("Alignment file error in {path}: {message}")]
    Alignment { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Tabular parse error: {0}")]
    Tabular(#[from] csv::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Input-descriptor failure with a preformatted message
    pub fn input(message: impl Into<String>) -> Self {
        PipelineError::InputFormat { message: message.into() }
    }

    /// Alignment-file failure tied to a concrete path
    pub fn alignment(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Alignment { path: path.into(), message: message.into() }
    }
}

/// Extension trait for Result to add descriptor context
pub trait PipelineResultExt<T> {
    /// Wrap any error into an `InputFormat` error with a context prefix
    fn with_input_context<F>(self, f: F) -> PipelineResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> PipelineResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_input_context<F>(self, f: F) -> PipelineResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PipelineError::InputFormat { message: format!("{}: {}", f(), e) })
    }
}
