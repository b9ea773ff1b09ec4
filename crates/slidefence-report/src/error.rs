use std::path::PathBuf;

use slidefence_backend::NodeId;
use slidefence_core::SelectorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("slide {0} is not attached to the document")]
    SlideMissing(NodeId),

    #[error("invalid ignore selector: {0}")]
    Selector(#[from] SelectorError),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
