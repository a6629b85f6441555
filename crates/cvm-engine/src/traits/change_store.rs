use cvm_core::ChangeDescriptor;

use crate::Result;

/// Read/delete access to the staged change descriptors.
///
/// Descriptors are consumed read-only by planning; deletion happens only
/// after a plan has been applied to manifests.
pub trait ChangeStore: Send + Sync {
    /// All staged descriptors, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging directory or a file cannot be read,
    /// or a file fails validation.
    fn list(&self) -> Result<Vec<ChangeDescriptor>>;

    /// # Errors
    ///
    /// Returns an error if no descriptor with that id is staged or the
    /// delete fails.
    fn delete(&self, id: &str) -> Result<()>;
}
