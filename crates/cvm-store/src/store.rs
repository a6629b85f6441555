use std::fs;
use std::path::{Path, PathBuf};

use cvm_core::ChangeDescriptor;

use crate::error::StoreError;
use crate::parse::{parse_descriptor, serialize_descriptor};
use crate::{CHANGES_SUBDIR, Result};

const MAX_FILENAME_ATTEMPTS: usize = 100;

/// The staging directory for change descriptor files.
///
/// Rooted at the workspace's configured staging directory (e.g. `.cvm`);
/// descriptors live one-per-file under its `changes/` subdirectory.
pub struct ChangeDir {
    root: PathBuf,
}

impl ChangeDir {
    #[must_use]
    pub fn new(staging_root: &Path) -> Self {
        Self {
            root: staging_root.to_path_buf(),
        }
    }

    #[must_use]
    pub fn changes_path(&self) -> PathBuf {
        self.root.join(CHANGES_SUBDIR)
    }

    /// Creates the staging directory hierarchy if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_exists(&self) -> Result<()> {
        let path = self.changes_path();
        fs::create_dir_all(&path).map_err(|source| StoreError::Write { path, source })
    }

    /// All staged descriptors, sorted by id for deterministic processing.
    /// A missing staging directory reads as no staged changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be read, or a
    /// file fails validation.
    pub fn list(&self) -> Result<Vec<ChangeDescriptor>> {
        let dir = self.changes_path();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::List { path: dir, source }),
        };

        let mut descriptors = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|source| StoreError::List {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }

            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            descriptors.push(self.read_file(&path, id)?);
        }

        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(descriptors)
    }

    /// Reads a single staged descriptor by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownChange` when no file with that id is
    /// staged.
    pub fn read(&self, id: &str) -> Result<ChangeDescriptor> {
        let path = self.file_path(id);
        if !path.exists() {
            return Err(StoreError::UnknownChange { id: id.to_string() });
        }
        self.read_file(&path, id)
    }

    /// Stages a new descriptor under a generated unique filename and returns
    /// its id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, descriptor: &ChangeDescriptor) -> Result<String> {
        self.ensure_exists()?;

        let id = self.generate_unique_id();
        let path = self.file_path(&id);
        let content = serialize_descriptor(descriptor)?;

        fs::write(&path, content).map_err(|source| StoreError::Write { path, source })?;
        Ok(id)
    }

    /// Deletes a consumed descriptor file. Callers invoke this only after
    /// the corresponding plan has been applied to manifests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownChange` when no file with that id is
    /// staged, or a delete error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.file_path(id);
        if !path.exists() {
            return Err(StoreError::UnknownChange { id: id.to_string() });
        }
        fs::remove_file(&path).map_err(|source| StoreError::Delete { path, source })
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.changes_path().join(format!("{id}.toml"))
    }

    fn read_file(&self, path: &Path, id: &str) -> Result<ChangeDescriptor> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        parse_descriptor(id, &content).map_err(|source| StoreError::Descriptor {
            path: path.to_path_buf(),
            source,
        })
    }

    fn generate_unique_id(&self) -> String {
        for _ in 0..MAX_FILENAME_ATTEMPTS {
            if let Some(name) = petname::petname(3, "-") {
                if !self.file_path(&name).exists() {
                    return name;
                }
            }
        }

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        format!("change-{timestamp}")
    }
}
