use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Requested bump severity. Ordering is significant: when several change
/// descriptors name the same package, the maximum severity wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Patch,
    Minor,
    Major,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        };
        write!(f, "{s}")
    }
}

/// One staged change unit, backed by one file in the staging directory.
///
/// The three severity sets are disjoint; the store validates this at parse
/// time. `pre` marks the change as targeting a prerelease increment on the
/// active channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDescriptor {
    /// Filename stem of the backing file; the stable identity of the change.
    pub id: String,
    pub summary: String,
    pub major: Vec<String>,
    pub minor: Vec<String>,
    pub patch: Vec<String>,
    pub pre: bool,
}

impl ChangeDescriptor {
    /// The severity this descriptor requests for `package`, if named.
    #[must_use]
    pub fn severity_for(&self, package: &str) -> Option<Severity> {
        if self.major.iter().any(|p| p == package) {
            Some(Severity::Major)
        } else if self.minor.iter().any(|p| p == package) {
            Some(Severity::Minor)
        } else if self.patch.iter().any(|p| p == package) {
            Some(Severity::Patch)
        } else {
            None
        }
    }

    /// All `(package, severity)` requests in this descriptor, major first.
    pub fn requests(&self) -> impl Iterator<Item = (&str, Severity)> {
        let major = self.major.iter().map(|p| (p.as_str(), Severity::Major));
        let minor = self.minor.iter().map(|p| (p.as_str(), Severity::Minor));
        let patch = self.patch.iter().map(|p| (p.as_str(), Severity::Patch));
        major.chain(minor).chain(patch)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.major.is_empty() && self.minor.is_empty() && self.patch.is_empty()
    }
}

/// One publishable unit discovered in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub version: Version,
    /// Directory containing the package's `Cargo.toml`.
    pub path: PathBuf,
}

impl PackageInfo {
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join("Cargo.toml")
    }
}

/// Severity actually applied to a package in a computed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliedSeverity {
    Patch,
    Minor,
    Major,
    Prerelease,
}

impl From<Severity> for AppliedSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Patch => Self::Patch,
            Severity::Minor => Self::Minor,
            Severity::Major => Self::Major,
        }
    }
}

/// Why a package appears in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpReason {
    /// Named in a change descriptor's severity sets.
    Direct,
    /// Pulled in because the named internal dependency changed.
    Propagated { dependency: String },
}

/// The computed version change for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRelease {
    pub name: String,
    pub previous: Version,
    pub new: Version,
    pub severity: AppliedSeverity,
    pub reason: BumpReason,
}

/// A dependency requirement rewrite a plan asks of the manifest mutator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementUpdate {
    /// Package whose manifest declares the requirement.
    pub dependent: String,
    /// Internal dependency whose version changed.
    pub dependency: String,
    /// New requirement string, the dependency's new version.
    pub requirement: String,
}

/// Serializable summary entry for one planned release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub previous_version: Version,
    pub new_version: Version,
    pub severity: AppliedSeverity,
}

/// The computed outcome of one plan/apply cycle. Releases are ordered
/// topologically (dependencies before dependents).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPlan {
    pub releases: Vec<PlannedRelease>,
    pub requirement_updates: Vec<RequirementUpdate>,
}

impl VersionPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PlannedRelease> {
        self.releases.iter().find(|r| r.name == name)
    }

    /// The externally observable shape of the plan: package name to
    /// previous/new version and applied severity, in plan order.
    #[must_use]
    pub fn summary(&self) -> IndexMap<String, PlanEntry> {
        self.releases
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    PlanEntry {
                        previous_version: r.previous.clone(),
                        new_version: r.new.clone(),
                        severity: r.severity,
                    },
                )
            })
            .collect()
    }
}

/// Registry-side outcome of one publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryOutcome {
    /// The exact (name, version) pair was already on the registry.
    AlreadyPublished,
    Published,
    /// Dry-run: the package would have been published.
    DryRun,
}

/// Per-package, per-version outcome of one orchestrator run. Never mutated
/// after the run completes; a re-run produces fresh records reconciled
/// against registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub name: String,
    pub version: Version,
    pub registry: RegistryOutcome,
    /// Tag name, when one was created.
    pub tag: Option<String>,
    /// Release identifier, when one was created.
    pub release: Option<String>,
}

impl PublishRecord {
    #[must_use]
    pub fn already_published(&self) -> bool {
        self.registry == RegistryOutcome::AlreadyPublished
    }
}
