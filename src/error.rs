// Error module
// エラー定義

use std::path::PathBuf;
use thiserror::Error;

use crate::prompt::PromptError;
use crate::store::StoreError;

/// Errors surfaced by server resolution and the server commands.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no server found in {0}")]
    NotAServerDirectory(PathBuf),

    #[error("no server jar found in {0}")]
    NoJarFound(PathBuf),

    #[error("jar selection aborted: {0}")]
    UserCancelled(#[source] PromptError),

    #[error("server {0} is already running")]
    AlreadyRunning(String),

    #[error("server {0} is not running")]
    NotRunning(String),

    /// The launch call returned but the session did not stay up.
    #[error("couldn't start server {0}")]
    StartFailed(String),

    #[error("invalid RAM value: {0}")]
    InvalidRam(String),

    #[error("no registered server with id {0}")]
    UnknownServer(String),

    #[error("{0}: java executable not found")]
    JavaNotFound(String),

    #[error("not defined: {0}")]
    UnknownProperty(String),

    #[error("{program} failed: {reason}")]
    ExternalProcess { program: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
