use cvm_core::PrereleaseState;

use crate::Result;

/// Persistence for the prerelease state record.
///
/// The record is read at the start of an invocation and written back at the
/// end; absence of the backing file means `Inactive`.
pub trait StateStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the state file exists but cannot be read or
    /// parsed.
    fn load(&self) -> Result<PrereleaseState>;

    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &PrereleaseState) -> Result<()>;
}
