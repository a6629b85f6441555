use std::path::Path;

use semver::Version;

use crate::Result;

/// Format-preserving manifest edits, applied one field at a time.
pub trait ManifestMutator: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written, or has
    /// no `[package]` table.
    fn write_version(&self, manifest_path: &Path, version: &Version) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the version on disk does not match `expected`.
    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()>;

    /// Rewrites the requirement on `dependency`; the entry is expected to
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error when no requirement was rewritten: the plan and the
    /// on-disk manifest have diverged.
    fn update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<()>;

    /// Like [`update_requirement`](Self::update_requirement) but tolerates
    /// a missing entry, reporting whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    fn try_update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<bool>;
}
