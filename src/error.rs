use std::path::PathBuf;
use thiserror::Error;


// every failure the pipeline can surface, none are retried
#[derive(Debug, Error)]
pub enum PipelineError {

    #[error("invalid configuration for `{param}`: {reason}")]
    Configuration { param: String, reason: String },

    #[error("filtered corpus holds {len} ids, a window needs at least {span}")]
    InsufficientData { len: usize, span: usize },

    #[error("negative sampling impossible: {0}")]
    Sampling(String),

    #[error("malformed vocabulary record at line {line}: {reason}")]
    MalformedVocabulary { line: u64, reason: String },

    #[error("i/o failure on {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {

    pub fn config(param: &str, reason: impl Into<String>) -> Self {
        PipelineError::Configuration { param: param.to_owned(), reason: reason.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
