use std::path::PathBuf;

use thiserror::Error;

/// Errors in the content of a single change file.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("package '{package}' appears in more than one severity set")]
    DuplicatePackage { package: String },

    #[error("change names no packages")]
    NoPackages,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid change file '{path}'")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },

    #[error("failed to read change file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write change file '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete change file '{path}'")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list change files in '{path}'")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize change")]
    Serialize(#[from] toml::ser::Error),

    #[error("no change staged with id '{id}'")]
    UnknownChange { id: String },
}
