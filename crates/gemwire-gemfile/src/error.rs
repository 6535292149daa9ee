//! Error types for Gemfile parsing.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GemfileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}:{col}: {message}")]
    Syntax {
        path: PathBuf,
        line: u32,
        col: u32,
        message: String,
    },

    #[error("eval_gemfile nesting too deep at {path}")]
    TooDeep { path: PathBuf },
}
