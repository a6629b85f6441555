use std::path::{Path, PathBuf};

use serde::Deserialize;

use cvm_core::Severity;

use crate::manifest::CvmMetadata;

/// How tags are named after a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagFormat {
    /// Crate-prefixed for multi-package workspaces, bare version otherwise.
    #[default]
    Auto,
    CratePrefixed,
    VersionOnly,
}

/// Workspace-level configuration from `[workspace.metadata.cvm]`
/// (or `[package.metadata.cvm]` for single-package projects).
#[derive(Debug, Clone)]
pub struct CvmConfig {
    changes_dir: PathBuf,
    tags: bool,
    tag_format: TagFormat,
    keep_changes: bool,
    propagated_severity: Severity,
}

impl Default for CvmConfig {
    fn default() -> Self {
        Self {
            changes_dir: PathBuf::from(crate::DEFAULT_CHANGES_DIR),
            tags: true,
            tag_format: TagFormat::default(),
            keep_changes: false,
            propagated_severity: Severity::Patch,
        }
    }
}

impl CvmConfig {
    pub(crate) fn from_metadata(metadata: Option<&CvmMetadata>) -> Self {
        let mut config = Self::default();

        let Some(metadata) = metadata else {
            return config;
        };

        if let Some(dir) = &metadata.changes_dir {
            config.changes_dir = PathBuf::from(dir);
        }
        if let Some(tags) = metadata.tags {
            config.tags = tags;
        }
        if let Some(tag_format) = metadata.tag_format {
            config.tag_format = tag_format;
        }
        if let Some(keep_changes) = metadata.keep_changes {
            config.keep_changes = keep_changes;
        }
        if let Some(severity) = metadata.propagated_severity {
            config.propagated_severity = severity;
        }

        config
    }

    /// Staging directory, relative to the workspace root.
    #[must_use]
    pub fn changes_dir(&self) -> &Path {
        &self.changes_dir
    }

    /// Whether a publish run creates tags and releases.
    #[must_use]
    pub fn tags(&self) -> bool {
        self.tags
    }

    #[must_use]
    pub fn tag_format(&self) -> TagFormat {
        self.tag_format
    }

    /// Whether applied descriptor files are kept instead of deleted.
    #[must_use]
    pub fn keep_changes(&self) -> bool {
        self.keep_changes
    }

    /// Severity applied to dependents of a changed package.
    #[must_use]
    pub fn propagated_severity(&self) -> Severity {
        self.propagated_severity
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_keep_changes(mut self, keep_changes: bool) -> Self {
        self.keep_changes = keep_changes;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_tags(mut self, tags: bool) -> Self {
        self.tags = tags;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_propagated_severity(mut self, severity: Severity) -> Self {
        self.propagated_severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CvmConfig::default();

        assert_eq!(config.changes_dir(), Path::new(".cvm"));
        assert!(config.tags());
        assert_eq!(config.tag_format(), TagFormat::Auto);
        assert!(!config.keep_changes());
        assert_eq!(config.propagated_severity(), Severity::Patch);
    }

    #[test]
    fn metadata_overrides_defaults() {
        let metadata = CvmMetadata {
            changes_dir: Some(".changes".to_string()),
            tags: Some(false),
            tag_format: Some(TagFormat::VersionOnly),
            keep_changes: Some(true),
            propagated_severity: Some(Severity::Minor),
        };

        let config = CvmConfig::from_metadata(Some(&metadata));

        assert_eq!(config.changes_dir(), Path::new(".changes"));
        assert!(!config.tags());
        assert_eq!(config.tag_format(), TagFormat::VersionOnly);
        assert!(config.keep_changes());
        assert_eq!(config.propagated_severity(), Severity::Minor);
    }

    #[test]
    fn absent_metadata_keeps_defaults() {
        let config = CvmConfig::from_metadata(None);

        assert_eq!(config.changes_dir(), Path::new(".cvm"));
    }
}
