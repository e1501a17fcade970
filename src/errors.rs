use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Document is not a mapping")]
    NotAMapping,
    #[error("Invalid {kind}: {source}")]
    Invalid { kind: String, source: serde_yaml::Error },
}

#[derive(Debug, Error)]
pub enum KumlError {
    #[error("Decode error in {file} (document {index}): {source}")]
    Decode { file: PathBuf, index: usize, source: DecodeError },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No manifests found under {0}")]
    NoInput(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid query: {0}")]
    Query(String),
}
