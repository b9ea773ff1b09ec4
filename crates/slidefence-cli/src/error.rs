use std::path::PathBuf;

use slidefence_core::ConfigError;
use slidefence_report::ReportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn config(path: impl Into<PathBuf>, source: ConfigError) -> Self {
        Self::Config {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use slidefence_core::ConfigError;

    #[test]
    fn exit_constructor_preserves_code_and_message() {
        let error = CliError::exit(2, "3 slides overflow");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.to_string(), "3 slides overflow");
    }

    #[test]
    fn other_errors_exit_with_one() {
        let error = CliError::config("deck.toml", ConfigError::InvalidMaxIterations);
        assert_eq!(error.exit_code(), 1);
        assert_eq!(
            error.to_string(),
            "invalid configuration deck.toml: maxIterations must be at least 1"
        );
    }
}
