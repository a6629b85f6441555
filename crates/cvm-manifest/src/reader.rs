use std::path::Path;

use semver::Version;
use toml_edit::DocumentMut;

use crate::error::MutationError;

/// # Errors
///
/// Returns `MutationError::Read` if the file cannot be read, or
/// `MutationError::Parse` if the TOML is malformed.
pub fn read_document(path: &Path) -> Result<DocumentMut, MutationError> {
    let content = std::fs::read_to_string(path).map_err(|source| MutationError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    content
        .parse::<DocumentMut>()
        .map_err(|source| MutationError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads `package.version` as a semantic version.
///
/// # Errors
///
/// Returns `MutationError::FieldNotFound` if the field is absent or not a
/// string, or `MutationError::InvalidVersion` if it is not valid semver.
pub fn read_version(path: &Path) -> Result<Version, MutationError> {
    let doc = read_document(path)?;

    let version_str = doc
        .get("package")
        .and_then(|package| package.get("version"))
        .and_then(toml_edit::Item::as_str)
        .ok_or_else(|| MutationError::FieldNotFound {
            path: path.to_path_buf(),
            field: "package.version".to_string(),
        })?;

    Version::parse(version_str).map_err(|source| MutationError::InvalidVersion {
        path: path.to_path_buf(),
        version: version_str.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_version_extracts_semver() {
        let toml = r#"
[package]
name = "test-crate"
version = "1.2.3"
"#;
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, toml).expect("write test file");

        let version = read_version(&path).expect("read version");
        assert_eq!(version, Version::new(1, 2, 3));
    }

    #[test]
    fn read_version_fails_on_missing_field() {
        let toml = r#"
[package]
name = "test-crate"
"#;
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, toml).expect("write test file");

        let err = read_version(&path).expect_err("should fail");
        assert!(matches!(err, MutationError::FieldNotFound { .. }));
    }

    #[test]
    fn read_version_fails_on_inherited_version() {
        let toml = r#"
[package]
name = "test-crate"
version.workspace = true
"#;
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, toml).expect("write test file");

        let err = read_version(&path).expect_err("should fail");
        assert!(matches!(err, MutationError::FieldNotFound { .. }));
    }

    #[test]
    fn read_version_fails_on_invalid_semver() {
        let toml = r#"
[package]
name = "test-crate"
version = "one point two"
"#;
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, toml).expect("write test file");

        let err = read_version(&path).expect_err("should fail");
        assert!(matches!(err, MutationError::InvalidVersion { .. }));
    }
}
