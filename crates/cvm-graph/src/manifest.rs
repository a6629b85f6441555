use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::GraphError;

#[derive(Debug, Deserialize)]
pub(crate) struct CargoManifest {
    pub(crate) package: Option<Package>,
    pub(crate) workspace: Option<WorkspaceSection>,
    #[serde(default)]
    pub(crate) dependencies: IndexMap<String, Dependency>,
    #[serde(default, rename = "dev-dependencies")]
    pub(crate) dev_dependencies: IndexMap<String, Dependency>,
    #[serde(default, rename = "build-dependencies")]
    pub(crate) build_dependencies: IndexMap<String, Dependency>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Package {
    pub(crate) name: String,
    pub(crate) version: Option<VersionField>,
    pub(crate) metadata: Option<PackageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VersionField {
    Literal(String),
    Inherited(InheritedVersion),
}

#[derive(Debug, Deserialize)]
pub(crate) struct InheritedVersion {
    pub(crate) workspace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Dependency {
    /// `foo = "1.2"`
    Requirement(String),
    /// `foo = { version = "1.2", path = "../foo" }`
    Table(DependencyTable),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DependencyTable {
    pub(crate) version: Option<String>,
    /// Real package name for renamed dependencies.
    pub(crate) package: Option<String>,
    #[serde(default)]
    pub(crate) workspace: bool,
}

impl Dependency {
    /// The package name this entry resolves to: the rename target when
    /// present, otherwise the table key.
    pub(crate) fn package_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self {
            Self::Requirement(_) => key,
            Self::Table(table) => table.package.as_deref().unwrap_or(key),
        }
    }

    /// The declared version requirement, when the entry carries one.
    /// `workspace = true` entries inherit theirs from the root manifest.
    pub(crate) fn requirement(&self) -> Option<&str> {
        match self {
            Self::Requirement(req) => Some(req),
            Self::Table(table) if table.workspace => None,
            Self::Table(table) => table.version.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceSection {
    pub(crate) members: Option<Vec<String>>,
    pub(crate) exclude: Option<Vec<String>>,
    pub(crate) package: Option<WorkspacePackage>,
    pub(crate) metadata: Option<WorkspaceMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspacePackage {
    pub(crate) version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PackageMetadata {
    pub(crate) cvm: Option<CvmMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WorkspaceMetadata {
    pub(crate) cvm: Option<CvmMetadata>,
}

/// Raw `[workspace.metadata.cvm]` / `[package.metadata.cvm]` contents.
/// Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CvmMetadata {
    pub(crate) changes_dir: Option<String>,
    pub(crate) tags: Option<bool>,
    pub(crate) tag_format: Option<crate::config::TagFormat>,
    pub(crate) keep_changes: Option<bool>,
    pub(crate) propagated_severity: Option<cvm_core::Severity>,
}

pub(crate) fn read_manifest(path: &Path) -> Result<CargoManifest, GraphError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| GraphError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}
