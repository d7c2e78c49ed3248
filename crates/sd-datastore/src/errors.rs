use std::path::PathBuf;

use thiserror::Error;

/// Settings store error types
#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error("No setting stored under '{namespace}/{key}'")]
    NotFound { namespace: String, key: String },

    #[error(
        "Invalid settings name '{0}' - use ASCII letters, digits, '-', '_' or '.' and do not start with '.'"
    )]
    InvalidKey(String),

    #[error(
        "Project directories are unavailable - this usually indicates an unsupported OS or missing home directory"
    )]
    ProjectDirectoriesUnavailable,

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read settings file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    ParsingFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Settings store is locked by another writer")]
    Locked,

    #[error("Settings store lock poisoned")]
    LockPoisoned,

    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    #[error("Sealed setting is corrupted or was sealed with a different key")]
    Corrupted,

    #[error("Passphrase does not unlock this sealed store")]
    WrongPassphrase,

    #[error("No passphrase available to unlock the sealed store")]
    PassphraseUnavailable,
}

impl DatastoreError {
    /// Whether the error only means that nothing is stored under the requested name
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn not_found(namespace: &str, key: &str) -> Self {
        Self::NotFound {
            namespace: namespace.to_string(),
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatastoreError>;
