use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use semver::Version;

use cvm_core::{ChangeDescriptor, PackageInfo, PrereleaseState};
use cvm_graph::{CvmConfig, DependencyEdge, EdgeKind, PackageGraph, Workspace, WorkspaceKind};
use cvm_store::StoreError;

use crate::Result;
use crate::traits::{
    ChangeStore, HostClient, HostError, ManifestMutator, PublishClient, PublishError, StateStore,
};

/// Builds an in-memory workspace: `(name, version, internal deps)` triples.
/// All edges are normal dependencies with a declared requirement.
///
/// # Panics
///
/// Panics if a version string is not valid semver or the graph is invalid.
#[must_use]
pub fn mock_workspace(packages: &[(&str, &str, &[&str])]) -> Workspace {
    let root = PathBuf::from("/mock/ws");

    let raw: Vec<(PackageInfo, Vec<DependencyEdge>)> = packages
        .iter()
        .map(|(name, version, deps)| {
            let info = PackageInfo {
                name: (*name).to_string(),
                version: version.parse().expect("valid version"),
                path: root.join("crates").join(name),
            };
            let edges = deps
                .iter()
                .map(|dep| DependencyEdge {
                    name: (*dep).to_string(),
                    requirement: Some("1.0.0".to_string()),
                    kind: EdgeKind::Normal,
                })
                .collect();
            (info, edges)
        })
        .collect();

    let kind = if packages.len() == 1 {
        WorkspaceKind::Single
    } else {
        WorkspaceKind::Virtual
    };

    Workspace {
        root,
        kind,
        config: CvmConfig::default(),
        graph: PackageGraph::build(raw).expect("valid graph"),
    }
}

pub struct MockChangeStore {
    descriptors: Mutex<Vec<ChangeDescriptor>>,
    deleted: Mutex<Vec<String>>,
}

impl MockChangeStore {
    #[must_use]
    pub fn new(descriptors: Vec<ChangeDescriptor>) -> Self {
        Self {
            descriptors: Mutex::new(descriptors),
            deleted: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("lock").clone()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.descriptors.lock().expect("lock").len()
    }
}

impl ChangeStore for MockChangeStore {
    fn list(&self) -> Result<Vec<ChangeDescriptor>> {
        let mut descriptors = self.descriptors.lock().expect("lock").clone();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(descriptors)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut descriptors = self.descriptors.lock().expect("lock");
        let before = descriptors.len();
        descriptors.retain(|d| d.id != id);

        if descriptors.len() == before {
            return Err(StoreError::UnknownChange { id: id.to_string() }.into());
        }

        self.deleted.lock().expect("lock").push(id.to_string());
        Ok(())
    }
}

pub struct InMemoryStateStore {
    state: Mutex<PrereleaseState>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new(state: PrereleaseState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    #[must_use]
    pub fn current(&self) -> PrereleaseState {
        self.state.lock().expect("lock").clone()
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> Result<PrereleaseState> {
        Ok(self.current())
    }

    fn save(&self, state: &PrereleaseState) -> Result<()> {
        *self.state.lock().expect("lock") = state.clone();
        Ok(())
    }
}

/// Records every mutation instead of touching a filesystem.
#[derive(Default)]
pub struct RecordingManifestMutator {
    writes: Mutex<Vec<(PathBuf, Version)>>,
    requirements: Mutex<Vec<(PathBuf, String, String)>>,
}

impl RecordingManifestMutator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn writes(&self) -> Vec<(PathBuf, Version)> {
        self.writes.lock().expect("lock").clone()
    }

    #[must_use]
    pub fn requirements(&self) -> Vec<(PathBuf, String, String)> {
        self.requirements.lock().expect("lock").clone()
    }
}

impl ManifestMutator for RecordingManifestMutator {
    fn write_version(&self, manifest_path: &Path, version: &Version) -> Result<()> {
        self.writes
            .lock()
            .expect("lock")
            .push((manifest_path.to_path_buf(), version.clone()));
        Ok(())
    }

    fn verify_version(&self, _manifest_path: &Path, _expected: &Version) -> Result<()> {
        Ok(())
    }

    fn update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<()> {
        self.requirements.lock().expect("lock").push((
            manifest_path.to_path_buf(),
            dependency.to_string(),
            requirement.to_string(),
        ));
        Ok(())
    }

    fn try_update_requirement(
        &self,
        manifest_path: &Path,
        dependency: &str,
        requirement: &str,
    ) -> Result<bool> {
        self.update_requirement(manifest_path, dependency, requirement)?;
        Ok(true)
    }
}

pub enum FailureMode {
    /// Fail with a transient error this many more times, then succeed.
    Transient { remaining: u32 },
    Rejected,
}

/// An in-memory registry. Tracks published versions across runs so re-run
/// idempotence can be observed.
pub struct MockPublishClient {
    published: Mutex<BTreeSet<(String, String)>>,
    failures: Mutex<HashMap<String, FailureMode>>,
    attempts: Mutex<HashMap<String, u32>>,
    order: Mutex<Vec<String>>,
}

impl MockPublishClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: Mutex::new(BTreeSet::new()),
            failures: Mutex::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
        }
    }

    pub fn mark_published(&self, name: &str, version: &str) {
        self.published
            .lock()
            .expect("lock")
            .insert((name.to_string(), version.to_string()));
    }

    pub fn fail_with(&self, name: &str, mode: FailureMode) {
        self.failures
            .lock()
            .expect("lock")
            .insert(name.to_string(), mode);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().expect("lock").clear();
    }

    #[must_use]
    pub fn published(&self, name: &str, version: &str) -> bool {
        self.published
            .lock()
            .expect("lock")
            .contains(&(name.to_string(), version.to_string()))
    }

    /// Successful registry mutations, in order.
    #[must_use]
    pub fn publish_order(&self) -> Vec<String> {
        self.order.lock().expect("lock").clone()
    }

    #[must_use]
    pub fn publish_count(&self, name: &str) -> usize {
        self.order
            .lock()
            .expect("lock")
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    /// `publish` invocations, including failed ones.
    #[must_use]
    pub fn attempt_count(&self, name: &str) -> u32 {
        self.attempts
            .lock()
            .expect("lock")
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockPublishClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishClient for MockPublishClient {
    fn exists(&self, name: &str, version: &Version) -> std::result::Result<bool, PublishError> {
        Ok(self.published(name, &version.to_string()))
    }

    fn publish(
        &self,
        name: &str,
        version: &Version,
        _manifest_path: &Path,
    ) -> std::result::Result<(), PublishError> {
        *self
            .attempts
            .lock()
            .expect("lock")
            .entry(name.to_string())
            .or_insert(0) += 1;

        if let Some(mode) = self.failures.lock().expect("lock").get_mut(name) {
            match mode {
                FailureMode::Transient { remaining } if *remaining > 0 => {
                    *remaining -= 1;
                    return Err(PublishError::Transient("connection reset".to_string()));
                }
                FailureMode::Transient { .. } => {}
                FailureMode::Rejected => {
                    return Err(PublishError::Rejected("validation failed".to_string()));
                }
            }
        }

        self.published
            .lock()
            .expect("lock")
            .insert((name.to_string(), version.to_string()));
        self.order.lock().expect("lock").push(name.to_string());
        Ok(())
    }
}

pub struct MockHostClient {
    tags: Mutex<Vec<String>>,
    releases: Mutex<Vec<(String, String)>>,
    pull_requests: Mutex<Vec<String>>,
    fail_tags: AtomicBool,
}

impl MockHostClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tags: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            pull_requests: Mutex::new(Vec::new()),
            fail_tags: AtomicBool::new(false),
        }
    }

    pub fn fail_tags(&self) {
        self.fail_tags.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().expect("lock").clone()
    }

    #[must_use]
    pub fn releases(&self) -> Vec<(String, String)> {
        self.releases.lock().expect("lock").clone()
    }

    #[must_use]
    pub fn pull_requests(&self) -> Vec<String> {
        self.pull_requests.lock().expect("lock").clone()
    }
}

impl Default for MockHostClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClient for MockHostClient {
    fn create_tag(&self, name: &str) -> std::result::Result<(), HostError> {
        if self.fail_tags.load(Ordering::SeqCst) {
            return Err(HostError("tag API unavailable".to_string()));
        }
        self.tags.lock().expect("lock").push(name.to_string());
        Ok(())
    }

    fn create_release(&self, tag: &str, notes: &str) -> std::result::Result<String, HostError> {
        let mut releases = self.releases.lock().expect("lock");
        releases.push((tag.to_string(), notes.to_string()));
        Ok(format!("release-{}", releases.len()))
    }

    fn create_pull_request(
        &self,
        title: &str,
        _labels: &[String],
        _branch: &str,
    ) -> std::result::Result<(), HostError> {
        self.pull_requests
            .lock()
            .expect("lock")
            .push(title.to_string());
        Ok(())
    }
}
