use thiserror::Error;

#[derive(Debug, Error)]
#[error("source-hosting call failed: {0}")]
pub struct HostError(pub String);

/// The injected source-hosting API (tags, releases, pull requests).
///
/// Tag and release creation after a registry publish is best-effort: a
/// failure is reported but never unwinds the publish. Pull request creation
/// belongs to the external CI wrapper; it is part of the injected surface
/// so one client covers the whole hosting interaction.
pub trait HostClient: Send + Sync {
    /// # Errors
    ///
    /// Returns a `HostError` on API failure.
    fn create_tag(&self, name: &str) -> Result<(), HostError>;

    /// Creates a release referencing `tag` and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns a `HostError` on API failure.
    fn create_release(&self, tag: &str, notes: &str) -> Result<String, HostError>;

    /// # Errors
    ///
    /// Returns a `HostError` on API failure.
    fn create_pull_request(
        &self,
        title: &str,
        labels: &[String],
        branch: &str,
    ) -> Result<(), HostError>;
}
