use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use semver::Version;

use cvm_core::PackageInfo;

use crate::config::CvmConfig;
use crate::error::GraphError;
use crate::graph::{DependencyEdge, EdgeKind, PackageGraph};
use crate::manifest::{CargoManifest, VersionField, read_manifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    /// `[workspace]` with no root `[package]`.
    Virtual,
    /// `[workspace]` plus a root `[package]`.
    WithRoot,
    /// A lone `[package]`.
    Single,
}

/// A discovered workspace: root path, kind, configuration, and the internal
/// dependency graph of its packages.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub kind: WorkspaceKind,
    pub config: CvmConfig,
    pub graph: PackageGraph,
}

impl Workspace {
    #[must_use]
    pub fn root_manifest_path(&self) -> PathBuf {
        self.root.join("Cargo.toml")
    }

    /// The staging directory root (e.g. `<root>/.cvm`).
    #[must_use]
    pub fn staging_root(&self) -> PathBuf {
        self.root.join(self.config.changes_dir())
    }

    #[must_use]
    pub fn is_single_package(&self) -> bool {
        self.kind == WorkspaceKind::Single
    }
}

/// Discovers all packages under `root` and builds the dependency graph.
/// Read-only: no side effects on the tree.
///
/// # Errors
///
/// Returns `GraphError` when the root manifest is missing or malformed,
/// a member manifest fails to parse, a package name is duplicated, or the
/// internal dependency graph is cyclic.
pub fn load_workspace(root: &Path) -> Result<Workspace, GraphError> {
    let root = root
        .canonicalize()
        .map_err(|source| GraphError::ManifestRead {
            path: root.to_path_buf(),
            source,
        })?;

    let manifest_path = root.join("Cargo.toml");
    if !manifest_path.exists() {
        return Err(GraphError::NotFound { root });
    }

    let manifest = read_manifest(&manifest_path)?;
    let kind = determine_kind(&manifest);
    let config = resolve_config(&manifest);
    let packages = collect_packages(&root, &manifest, kind)?;
    let graph = PackageGraph::build(packages)?;

    Ok(Workspace {
        root,
        kind,
        config,
        graph,
    })
}

fn determine_kind(manifest: &CargoManifest) -> WorkspaceKind {
    match (&manifest.workspace, &manifest.package) {
        (Some(_), Some(_)) => WorkspaceKind::WithRoot,
        (None, Some(_)) => WorkspaceKind::Single,
        (Some(_) | None, None) => WorkspaceKind::Virtual,
    }
}

fn resolve_config(manifest: &CargoManifest) -> CvmConfig {
    let workspace_metadata = manifest
        .workspace
        .as_ref()
        .and_then(|ws| ws.metadata.as_ref())
        .and_then(|m| m.cvm.as_ref());

    let package_metadata = manifest
        .package
        .as_ref()
        .and_then(|pkg| pkg.metadata.as_ref())
        .and_then(|m| m.cvm.as_ref());

    CvmConfig::from_metadata(workspace_metadata.or(package_metadata))
}

type DiscoveredPackage = (PackageInfo, Vec<DependencyEdge>);

fn collect_packages(
    root: &Path,
    manifest: &CargoManifest,
    kind: WorkspaceKind,
) -> Result<Vec<DiscoveredPackage>, GraphError> {
    let workspace_version = manifest
        .workspace
        .as_ref()
        .and_then(|ws| ws.package.as_ref())
        .and_then(|pkg| pkg.version.as_ref());

    let mut packages = Vec::new();

    if let Some(pkg) = &manifest.package {
        let version = resolve_version(
            pkg.version.as_ref(),
            workspace_version,
            &root.join("Cargo.toml"),
        )?;
        packages.push((
            PackageInfo {
                name: pkg.name.clone(),
                version,
                path: root.to_path_buf(),
            },
            declared_edges(manifest),
        ));

        if kind == WorkspaceKind::Single {
            return Ok(packages);
        }
    }

    if let Some(workspace) = &manifest.workspace {
        let members = workspace.members.as_deref().unwrap_or(&[]);
        let excludes = workspace.exclude.as_deref().unwrap_or(&[]);

        for pattern in members {
            for member_dir in expand_glob_pattern(root, pattern, excludes)? {
                let member_manifest_path = member_dir.join("Cargo.toml");
                if !member_manifest_path.exists() {
                    continue;
                }

                let member_manifest = read_manifest(&member_manifest_path)?;
                let Some(pkg) = &member_manifest.package else {
                    continue;
                };

                let version = resolve_version(
                    pkg.version.as_ref(),
                    workspace_version,
                    &member_manifest_path,
                )?;
                packages.push((
                    PackageInfo {
                        name: pkg.name.clone(),
                        version,
                        path: member_dir,
                    },
                    declared_edges(&member_manifest),
                ));
            }
        }
    }

    Ok(packages)
}

fn declared_edges(manifest: &CargoManifest) -> Vec<DependencyEdge> {
    let sections = [
        (&manifest.dependencies, EdgeKind::Normal),
        (&manifest.dev_dependencies, EdgeKind::Dev),
        (&manifest.build_dependencies, EdgeKind::Build),
    ];

    let mut edges = Vec::new();
    for (section, kind) in sections {
        for (key, dependency) in section {
            edges.push(DependencyEdge {
                name: dependency.package_name(key).to_string(),
                requirement: dependency.requirement().map(ToString::to_string),
                kind,
            });
        }
    }
    edges
}

fn resolve_version(
    version_field: Option<&VersionField>,
    workspace_version: Option<&String>,
    manifest_path: &Path,
) -> Result<Version, GraphError> {
    let version_str = match version_field {
        Some(VersionField::Literal(v)) => v.clone(),
        Some(VersionField::Inherited(inherited)) if inherited.workspace => workspace_version
            .ok_or_else(|| GraphError::MissingField {
                path: manifest_path.to_path_buf(),
                field: "workspace.package.version",
            })?
            .clone(),
        Some(VersionField::Inherited(_)) | None => {
            return Err(GraphError::MissingField {
                path: manifest_path.to_path_buf(),
                field: "package.version",
            });
        }
    };

    version_str
        .parse()
        .map_err(|source| GraphError::InvalidVersion {
            path: manifest_path.to_path_buf(),
            version: version_str,
            source,
        })
}

fn expand_glob_pattern(
    root: &Path,
    pattern: &str,
    excludes: &[String],
) -> Result<Vec<PathBuf>, GraphError> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| GraphError::GlobPattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let exclude_matchers: Vec<_> = excludes
        .iter()
        .filter_map(|ex| {
            GlobBuilder::new(ex)
                .literal_separator(true)
                .build()
                .ok()
                .map(|g| g.compile_matcher())
        })
        .collect();

    let mut dirs = Vec::new();
    collect_matching_dirs(root, root, &glob, &exclude_matchers, &mut dirs)?;
    dirs.sort();

    Ok(dirs)
}

fn collect_matching_dirs(
    base: &Path,
    current: &Path,
    glob: &globset::GlobMatcher,
    excludes: &[globset::GlobMatcher],
    results: &mut Vec<PathBuf>,
) -> Result<(), GraphError> {
    let entries = std::fs::read_dir(current)?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }

        let relative = path.strip_prefix(base).unwrap_or(&path);

        if excludes.iter().any(|ex| ex.is_match(relative)) {
            continue;
        }

        if glob.is_match(relative) {
            results.push(path.clone());
        }

        collect_matching_dirs(base, &path, glob, excludes, results)?;
    }

    Ok(())
}
