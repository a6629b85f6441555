use indexmap::IndexMap;

use cvm_core::{
    AppliedSeverity, BumpReason, ChangeDescriptor, PlannedRelease, PrereleaseState,
    RequirementUpdate, Severity, VersionPlan,
};
use cvm_graph::PackageGraph;

use crate::error::PlanError;

/// Computes a [`VersionPlan`] from the graph and the staged descriptors.
pub struct Planner;

impl Planner {
    /// Descriptors are processed in ascending id order; a package named by
    /// several takes the maximum severity. Packages whose internal
    /// dependencies changed receive `propagated` at minimum, transitively
    /// in topological order, so every release sees its dependencies' final
    /// versions. Propagation never downgrades a stronger direct bump.
    ///
    /// # Errors
    ///
    /// Returns `PlanError` for an unknown package name, a `pre` change
    /// while no channel is active, or a batch mixing prerelease and stable
    /// changes.
    pub fn plan(
        graph: &PackageGraph,
        descriptors: &[ChangeDescriptor],
        state: &PrereleaseState,
        propagated: Severity,
    ) -> Result<VersionPlan, PlanError> {
        let mut ordered: Vec<&ChangeDescriptor> = descriptors.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let channel = Self::resolve_channel(&ordered, state)?;
        let direct = Self::direct_bumps(graph, &ordered)?;

        if direct.is_empty() {
            return Ok(VersionPlan::default());
        }

        let bumps = Self::propagate(graph, &direct, propagated);
        let releases = Self::compute_releases(graph, &bumps, channel)?;
        let requirement_updates = Self::requirement_updates(graph, &releases);

        Ok(VersionPlan {
            releases,
            requirement_updates,
        })
    }

    /// A batch is either entirely prerelease or entirely stable. Prerelease
    /// batches require an active channel.
    fn resolve_channel<'a>(
        ordered: &[&ChangeDescriptor],
        state: &'a PrereleaseState,
    ) -> Result<Option<&'a str>, PlanError> {
        let Some(first_pre) = ordered.iter().find(|d| d.pre) else {
            return Ok(None);
        };

        if ordered.iter().any(|d| !d.pre) {
            return Err(PlanError::MixedPrerelease);
        }

        match state.channel() {
            Some(channel) => Ok(Some(channel)),
            None => Err(PlanError::PrereleaseInactive {
                descriptor: first_pre.id.clone(),
            }),
        }
    }

    fn direct_bumps(
        graph: &PackageGraph,
        ordered: &[&ChangeDescriptor],
    ) -> Result<IndexMap<String, Severity>, PlanError> {
        let mut direct: IndexMap<String, Severity> = IndexMap::new();

        for descriptor in ordered {
            for (package, severity) in descriptor.requests() {
                if !graph.contains(package) {
                    return Err(PlanError::UnknownPackage {
                        descriptor: descriptor.id.clone(),
                        package: package.to_string(),
                    });
                }
                direct
                    .entry(package.to_string())
                    .and_modify(|s| *s = (*s).max(severity))
                    .or_insert(severity);
            }
        }

        Ok(direct)
    }

    /// Walks the topological order (producers first), so by the time a
    /// package is examined all of its dependencies' bumps are settled.
    fn propagate(
        graph: &PackageGraph,
        direct: &IndexMap<String, Severity>,
        propagated: Severity,
    ) -> IndexMap<String, (Severity, BumpReason)> {
        let mut bumps: IndexMap<String, (Severity, BumpReason)> = IndexMap::new();

        for name in graph.topological_order() {
            let node = graph.get(name).expect("ordered names are graph nodes");

            let changed_dependency = node
                .dependencies
                .iter()
                .filter(|edge| edge.kind.orders_publish())
                .find(|edge| bumps.contains_key(&edge.name));

            if let Some(&severity) = direct.get(name.as_str()) {
                let severity = if changed_dependency.is_some() {
                    severity.max(propagated)
                } else {
                    severity
                };
                bumps.insert(name.clone(), (severity, BumpReason::Direct));
            } else if let Some(edge) = changed_dependency {
                bumps.insert(
                    name.clone(),
                    (
                        propagated,
                        BumpReason::Propagated {
                            dependency: edge.name.clone(),
                        },
                    ),
                );
            }
        }

        bumps
    }

    fn compute_releases(
        graph: &PackageGraph,
        bumps: &IndexMap<String, (Severity, BumpReason)>,
        channel: Option<&str>,
    ) -> Result<Vec<PlannedRelease>, PlanError> {
        let mut releases = Vec::with_capacity(bumps.len());

        for (name, (severity, reason)) in bumps {
            let node = graph.get(name).expect("bumped names are graph nodes");
            let current = &node.info.version;

            let (new, applied) = if let Some(channel) = channel {
                (
                    cvm_version::prerelease_increment(current, channel, *severity)?,
                    AppliedSeverity::Prerelease,
                )
            } else if cvm_version::is_prerelease(current) {
                (
                    cvm_version::stabilize(current, *severity),
                    AppliedSeverity::from(*severity),
                )
            } else {
                (
                    cvm_version::bump(current, *severity),
                    AppliedSeverity::from(*severity),
                )
            };

            releases.push(PlannedRelease {
                name: name.clone(),
                previous: current.clone(),
                new,
                severity: applied,
                reason: reason.clone(),
            });
        }

        Ok(releases)
    }

    /// Every dependent that declares a version requirement on a changed
    /// package gets a rewrite, across all edge kinds; dev-only dependents
    /// are rewritten without being bumped.
    fn requirement_updates(
        graph: &PackageGraph,
        releases: &[PlannedRelease],
    ) -> Vec<RequirementUpdate> {
        let mut updates = Vec::new();

        for release in releases {
            for dependent in graph.dependents_of(&release.name) {
                let declares_requirement = graph.get(dependent).is_some_and(|node| {
                    node.dependencies
                        .iter()
                        .any(|edge| edge.name == release.name && edge.requirement.is_some())
                });

                if declares_requirement {
                    updates.push(RequirementUpdate {
                        dependent: dependent.clone(),
                        dependency: release.name.clone(),
                        requirement: release.new.to_string(),
                    });
                }
            }
        }

        updates
    }
}
