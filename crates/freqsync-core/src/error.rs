use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("config not found: {0} (run 'freqsync init' to create one)")]
    ConfigNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("network error for {locator}: {message}")]
    Network { locator: String, message: String },

    #[error("unexpected listing response for {0}: expected a list of entries")]
    UnexpectedListing(String),

    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("command '{command}' exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn network(locator: impl Into<String>, message: impl ToString) -> Self {
        SyncError::Network {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    pub fn filesystem(path: &std::path::Path, source: std::io::Error) -> Self {
        SyncError::Filesystem {
            path: path.display().to_string(),
            source,
        }
    }

    /// Configuration errors are the only class that aborts a whole cycle.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigNotFound(_) | SyncError::InvalidConfig(_) | SyncError::Yaml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
