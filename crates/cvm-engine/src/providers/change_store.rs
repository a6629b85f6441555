use std::path::Path;

use cvm_core::ChangeDescriptor;
use cvm_store::ChangeDir;

use crate::Result;
use crate::traits::ChangeStore;

/// [`ChangeStore`] backed by the staging directory on disk.
pub struct FileSystemChangeStore {
    dir: ChangeDir,
}

impl FileSystemChangeStore {
    #[must_use]
    pub fn new(staging_root: &Path) -> Self {
        Self {
            dir: ChangeDir::new(staging_root),
        }
    }

    /// Stages a new descriptor and returns its generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, descriptor: &ChangeDescriptor) -> Result<String> {
        Ok(self.dir.write(descriptor)?)
    }
}

impl ChangeStore for FileSystemChangeStore {
    fn list(&self) -> Result<Vec<ChangeDescriptor>> {
        Ok(self.dir.list()?)
    }

    fn delete(&self, id: &str) -> Result<()> {
        Ok(self.dir.delete(id)?)
    }
}
