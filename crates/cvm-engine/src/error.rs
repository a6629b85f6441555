use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

use cvm_core::{PrereleaseError, PublishRecord};
use cvm_graph::GraphError;
use cvm_manifest::MutationError;
use cvm_store::StoreError;
use cvm_version::VersionError;

use crate::traits::PublishError;

/// Errors from plan computation: resolvable by fixing the staged input.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("change '{descriptor}' references unknown package '{package}'")]
    UnknownPackage { descriptor: String, package: String },

    #[error("change '{descriptor}' targets a prerelease but no channel is active")]
    PrereleaseInactive { descriptor: String },

    #[error("staged changes mix prerelease and stable bumps")]
    MixedPrerelease,

    #[error("version calculation failed")]
    Version(#[from] VersionError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Prerelease(#[from] PrereleaseError),

    #[error("failed to read prerelease state file '{path}'")]
    StateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write prerelease state file '{path}'")]
    StateWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prerelease state file '{path}'")]
    StateParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize prerelease state for '{path}'")]
    StateSerialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    /// Publishing one package failed; everything after it in the plan was
    /// not attempted. `records` holds the outcomes completed before the
    /// failure.
    #[error("publishing {package} {version} failed")]
    PublishFailed {
        package: String,
        version: Version,
        #[source]
        source: PublishError,
        records: Vec<PublishRecord>,
    },

    /// The operator interrupted the run between package-publish steps.
    #[error("publish cancelled before '{package}'")]
    Cancelled {
        package: String,
        records: Vec<PublishRecord>,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_package_error_names_descriptor_and_package() {
        let err = PlanError::UnknownPackage {
            descriptor: "brave-otter".to_string(),
            package: "missing".to_string(),
        };

        let msg = err.to_string();

        assert!(msg.contains("brave-otter"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn publish_failed_error_names_package_and_version() {
        let err = EngineError::PublishFailed {
            package: "core".to_string(),
            version: Version::new(2, 0, 0),
            source: PublishError::Rejected("bad metadata".to_string()),
            records: Vec::new(),
        };

        let msg = err.to_string();

        assert!(msg.contains("core"));
        assert!(msg.contains("2.0.0"));
    }
}
