use std::path::Path;

use semver::Version;
use thiserror::Error;

/// Failure classes of the injected registry client.
///
/// Transient failures (network, rate limits) are retried with bounded
/// backoff; rejections abort the remaining publish sequence, since
/// packages later in the plan may depend on the failed one.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transient registry failure: {0}")]
    Transient(String),

    #[error("registry rejected the package: {0}")]
    Rejected(String),
}

impl PublishError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The injected registry transport. Implementations own per-call timeouts.
pub trait PublishClient: Send + Sync {
    /// Whether the exact `(name, version)` pair is already on the registry.
    ///
    /// # Errors
    ///
    /// Returns a `PublishError` on registry/transport failure.
    fn exists(&self, name: &str, version: &Version) -> Result<bool, PublishError>;

    /// Publishes one package. Irreversible on success.
    ///
    /// # Errors
    ///
    /// Returns a `PublishError` on registry/transport failure.
    fn publish(
        &self,
        name: &str,
        version: &Version,
        manifest_path: &Path,
    ) -> Result<(), PublishError>;
}
