use std::path::PathBuf;
use thiserror::Error;

/// Errors from the flat-file stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file does not exist yet. Callers treat this as "nothing stored".
    #[error("{0} does not exist")]
    NotFound(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
