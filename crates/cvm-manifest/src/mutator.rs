use std::path::Path;

use semver::Version;
use toml_edit::{Item, value};

use crate::error::MutationError;
use crate::reader::{read_document, read_version};

const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Rewrites `package.version`, preserving every other byte of the file.
/// An inherited `version.workspace = true` is converted to a literal.
///
/// # Errors
///
/// Returns `MutationError::FieldNotFound` when the manifest has no
/// `[package]` table, or a read/parse/write error.
pub fn write_version(path: &Path, version: &Version) -> Result<(), MutationError> {
    let mut doc = read_document(path)?;

    let package_table = doc
        .get_mut("package")
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| MutationError::FieldNotFound {
            path: path.to_path_buf(),
            field: "package".to_string(),
        })?;

    package_table.insert("version", value(version.to_string()));

    std::fs::write(path, doc.to_string()).map_err(|source| MutationError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// # Errors
///
/// Returns `MutationError::VersionMismatch` if the version on disk does not
/// match the expected version.
pub fn verify_version(path: &Path, expected: &Version) -> Result<(), MutationError> {
    let actual = read_version(path)?;

    if actual != *expected {
        return Err(MutationError::VersionMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    Ok(())
}

/// Rewrites the declared requirement on `dependency` wherever the manifest
/// declares one: `[workspace.dependencies]`, `[dependencies]`,
/// `[dev-dependencies]`, and `[build-dependencies]`. Bare-string entries and
/// table entries with a `version` key are updated; entries with
/// `workspace = true` inherit their requirement and are left alone.
///
/// Returns whether anything changed; the file is only rewritten when it did.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read, parsed, or written.
pub fn try_update_requirement(
    path: &Path,
    dependency: &str,
    requirement: &str,
) -> Result<bool, MutationError> {
    let mut doc = read_document(path)?;
    let mut changed = false;

    if let Some(deps) = doc
        .get_mut("workspace")
        .and_then(|ws| ws.get_mut("dependencies"))
    {
        changed |= update_entry(deps, dependency, requirement);
    }

    for section in &DEPENDENCY_SECTIONS {
        if let Some(deps) = doc.get_mut(section) {
            changed |= update_entry(deps, dependency, requirement);
        }
    }

    if changed {
        std::fs::write(path, doc.to_string()).map_err(|source| MutationError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(changed)
}

/// Like [`try_update_requirement`], but an entry is expected to exist: a
/// plan derived this edge from the manifest, so finding nothing to rewrite
/// means plan and disk have diverged.
///
/// # Errors
///
/// Returns `MutationError::FieldNotFound` when no requirement was rewritten.
pub fn update_requirement(
    path: &Path,
    dependency: &str,
    requirement: &str,
) -> Result<(), MutationError> {
    if try_update_requirement(path, dependency, requirement)? {
        Ok(())
    } else {
        Err(MutationError::FieldNotFound {
            path: path.to_path_buf(),
            field: format!("version requirement for dependency '{dependency}'"),
        })
    }
}

fn update_entry(deps: &mut Item, dependency: &str, requirement: &str) -> bool {
    let Some(entry) = deps.get_mut(dependency) else {
        return false;
    };

    if entry.as_str().is_some() {
        *entry = value(requirement);
        return true;
    }

    if let Some(table) = entry.as_table_like_mut() {
        let inherits = table
            .get("workspace")
            .and_then(Item::as_bool)
            .unwrap_or(false);
        if inherits {
            return false;
        }

        if table.get("version").is_some() {
            table.insert("version", value(requirement));
            return true;
        }
    }

    false
}
