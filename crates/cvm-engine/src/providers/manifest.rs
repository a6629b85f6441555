use std::path::Path;

use semver::Version;

use crate::Result;
use crate::traits::ManifestMutator;

/// [`ManifestMutator`] over `toml_edit` documents on disk.
pub struct TomlManifestMutator;

impl TomlManifestMutator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TomlManifestMutator {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestMutator for TomlManifestMutator {
    fn write_version(&self, manifest_path: &Path, version: &Version) -> Result<()> {
        Ok(cvm_manifest::write_version(manifest_path, version)?)
    }

    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()> {
        Ok(cvm_manifest::verify_version(manifest_path, expected)?)
    }

    fn update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<()> {
        Ok(cvm_manifest::update_requirement(
            manifest_path,
            dependency,
            requirement,
        )?)
    }

    fn try_update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<bool> {
        Ok(cvm_manifest::try_update_requirement(
            manifest_path,
            dependency,
            requirement,
        )?)
    }
}
