use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("failed to read manifest '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("failed to write manifest '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest '{path}' has no field '{field}'")]
    FieldNotFound { path: PathBuf, field: String },

    #[error("invalid version '{version}' in manifest '{path}'")]
    InvalidVersion {
        path: PathBuf,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("manifest '{path}' has version {actual}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}
