use std::path::PathBuf;

/// Errors that can occur while driving the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("staging failed: {0}")]
    Staging(String),

    #[error("{stage} failed ({status}): {command}")]
    Subprocess {
        stage: String,
        command: String,
        status: String,
    },

    #[error("{stage} failed: expected output {path} was not produced")]
    Checkpoint { stage: String, path: PathBuf },

    #[error("cannot estimate read length from {path}: no sequence records in the sampled prefix")]
    EmptyReadSample { path: PathBuf },

    #[error("result table error in {path}: {message}")]
    Table { path: PathBuf, message: String },

    #[error("I/O error: {source} ({path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Error {
    /// Convenience for wrapping an `io::Error` with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub(crate) fn table(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Table {
            path: path.into(),
            message: message.into(),
        }
    }
}
