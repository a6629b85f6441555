use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use semver::Version;
use tracing::{debug, info, warn};

use cvm_core::{PublishRecord, RegistryOutcome};
use cvm_graph::{TagFormat, Workspace};

use crate::Result;
use crate::error::EngineError;
use crate::retry::{RetryConfig, with_retry};
use crate::traits::{HostClient, PublishClient};

/// Cooperative cancellation, checked between package-publish steps only;
/// a step in flight is allowed to finish so no package is left
/// half-published.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Perform every read step but no registry mutation and no tag/release.
    pub dry_run: bool,
    pub retry: RetryConfig,
}

/// Drives the injected publish client over the workspace in topological
/// order, one package at a time: the registry rejects a package whose
/// internal dependencies are not yet available, so order is a correctness
/// requirement, not an optimization.
pub struct PublishOrchestrator<'a> {
    publish_client: &'a dyn PublishClient,
    host_client: &'a dyn HostClient,
    options: PublishOptions,
    cancel: CancellationToken,
}

impl<'a> PublishOrchestrator<'a> {
    #[must_use]
    pub fn new(publish_client: &'a dyn PublishClient, host_client: &'a dyn HostClient) -> Self {
        Self {
            publish_client,
            host_client,
            options: PublishOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PublishOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Walks every package in topological order. Versions already on the
    /// registry are skipped, which is what makes re-running after a partial
    /// failure safe. A rejected package aborts the remaining sequence; the
    /// error carries the records completed so far.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PublishFailed` when a publish fails after
    /// retries or is rejected, and `EngineError::Cancelled` when the
    /// operator interrupted the run.
    pub fn run(&self, workspace: &Workspace) -> Result<Vec<PublishRecord>> {
        let mut records: Vec<PublishRecord> = Vec::new();

        for name in workspace.graph.topological_order() {
            if self.cancel.is_cancelled() {
                info!(package = %name, "cancellation requested, stopping before next package");
                return Err(EngineError::Cancelled {
                    package: name.clone(),
                    records,
                });
            }

            let node = workspace
                .graph
                .get(name)
                .expect("ordered names are graph nodes");
            let version = node.info.version.clone();

            let exists = self
                .publish_client
                .exists(name, &version)
                .map_err(|source| EngineError::PublishFailed {
                    package: name.clone(),
                    version: version.clone(),
                    source,
                    records: records.clone(),
                })?;

            if exists {
                debug!(package = %name, %version, "already on registry, skipping");
                records.push(PublishRecord {
                    name: name.clone(),
                    version,
                    registry: RegistryOutcome::AlreadyPublished,
                    tag: None,
                    release: None,
                });
                continue;
            }

            if self.options.dry_run {
                info!(package = %name, %version, "dry-run: would publish");
                records.push(PublishRecord {
                    name: name.clone(),
                    version,
                    registry: RegistryOutcome::DryRun,
                    tag: None,
                    release: None,
                });
                continue;
            }

            let manifest_path = node.info.manifest_path();
            with_retry(&self.options.retry, || {
                self.publish_client.publish(name, &version, &manifest_path)
            })
            .map_err(|source| EngineError::PublishFailed {
                package: name.clone(),
                version: version.clone(),
                source,
                records: records.clone(),
            })?;

            info!(package = %name, %version, "published");

            let (tag, release) = if workspace.config.tags() {
                self.create_tag_and_release(workspace, name, &version)
            } else {
                (None, None)
            };

            records.push(PublishRecord {
                name: name.clone(),
                version,
                registry: RegistryOutcome::Published,
                tag,
                release,
            });
        }

        Ok(records)
    }

    /// Best-effort follow-up to a registry publish: the publish is
    /// irreversible and takes priority, so failures here are reported on
    /// the record, never unwound.
    fn create_tag_and_release(
        &self,
        workspace: &Workspace,
        name: &str,
        version: &Version,
    ) -> (Option<String>, Option<String>) {
        let tag = tag_name(workspace, name, version);

        if let Err(error) = self.host_client.create_tag(&tag) {
            warn!(%tag, %error, "tag creation failed; registry publish stands");
            return (None, None);
        }

        let notes = format!("{name} {version}");
        match self.host_client.create_release(&tag, &notes) {
            Ok(id) => (Some(tag), Some(id)),
            Err(error) => {
                warn!(%tag, %error, "release creation failed");
                (Some(tag), None)
            }
        }
    }
}

fn tag_name(workspace: &Workspace, name: &str, version: &Version) -> String {
    let crate_prefixed = match workspace.config.tag_format() {
        TagFormat::CratePrefixed => true,
        TagFormat::VersionOnly => false,
        TagFormat::Auto => !workspace.is_single_package(),
    };

    if crate_prefixed {
        format!("{name}-v{version}")
    } else {
        format!("v{version}")
    }
}
