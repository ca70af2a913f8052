use std::path::PathBuf;

use thiserror::Error;

use crate::cli::COMMANDS;

#[derive(Debug, Error)]
pub enum EnvsyncError {
    #[error("{0}")]
    Message(String),
    #[error("cannot reach AWS Secrets Manager: {0}")]
    Config(String),
    #[error("secret {0} not found")]
    NotFound(String),
    #[error("secret {0} is not compatible with plaintext secrets")]
    IncompatibleFormat(String),
    #[error("invalid line {line} in {}: {content}", .path.display())]
    Parse { path: PathBuf, line: usize, content: String },
    #[error("cannot access {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Validation(String),
    #[error("failed to write secret {name}: {reason}")]
    RemoteWrite { name: String, reason: String },
    #[error("failed to retrieve secret {name}: {reason}")]
    RemoteRead { name: String, reason: String },
    #[error("{0}")]
    Usage(String),
    #[error("Unknown command\n\nAvailable commands:\n{}", command_list())]
    UnknownCommand,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EnvsyncError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File { path: path.into(), source }
    }
}

fn command_list() -> String {
    COMMANDS.iter().map(|usage| format!("  {usage}")).collect::<Vec<_>>().join("\n")
}

pub type Result<T> = std::result::Result<T, EnvsyncError>;
