use std::collections::BTreeSet;

use indexmap::IndexMap;

use cvm_core::PackageInfo;

use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Normal,
    Dev,
    Build,
}

impl EdgeKind {
    /// Dev edges do not constrain publish order or carry bumps; a dev-edge
    /// cycle is how workspaces legitimately test themselves.
    #[must_use]
    pub fn orders_publish(self) -> bool {
        !matches!(self, Self::Dev)
    }
}

/// A declared dependency of one workspace package on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub name: String,
    /// Declared requirement string, when the entry carries a `version` key.
    pub requirement: Option<String>,
    pub kind: EdgeKind,
}

/// One workspace package with its resolved internal edges.
#[derive(Debug, Clone)]
pub struct PackageNode {
    pub info: PackageInfo,
    /// Internal dependencies (edges to other workspace packages).
    pub dependencies: Vec<DependencyEdge>,
    /// Names of workspace packages that depend on this one, sorted.
    pub dependents: Vec<String>,
}

/// The internal dependency graph of a workspace, with a precomputed stable
/// topological order (dependencies before dependents, ties broken by name).
#[derive(Debug, Clone)]
pub struct PackageGraph {
    nodes: IndexMap<String, PackageNode>,
    order: Vec<String>,
}

impl PackageGraph {
    /// Builds the graph from discovered packages and their declared
    /// dependency entries. Entries naming packages outside the workspace are
    /// dropped; self-references are ignored.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateName` when two manifests declare the
    /// same package name and `GraphError::Cycle` when the internal subgraph
    /// (dev edges excluded) is cyclic.
    pub fn build(packages: Vec<(PackageInfo, Vec<DependencyEdge>)>) -> Result<Self, GraphError> {
        let mut nodes: IndexMap<String, PackageNode> = IndexMap::new();

        for (info, _) in &packages {
            if let Some(existing) = nodes.get(&info.name) {
                return Err(GraphError::DuplicateName {
                    name: info.name.clone(),
                    first: existing.info.manifest_path(),
                    second: info.manifest_path(),
                });
            }
            nodes.insert(
                info.name.clone(),
                PackageNode {
                    info: info.clone(),
                    dependencies: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        for (info, declared) in packages {
            let internal: Vec<DependencyEdge> = declared
                .into_iter()
                .filter(|edge| edge.name != info.name && nodes.contains_key(&edge.name))
                .collect();

            for edge in &internal {
                if let Some(target) = nodes.get_mut(&edge.name) {
                    target.dependents.push(info.name.clone());
                }
            }

            if let Some(node) = nodes.get_mut(&info.name) {
                node.dependencies = internal;
            }
        }

        for node in nodes.values_mut() {
            node.dependents.sort();
            node.dependents.dedup();
        }

        check_acyclic(&nodes)?;
        let order = topological_sort(&nodes);

        Ok(Self { nodes, order })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.values()
    }

    /// Package names in a stable topological order: every package appears
    /// after all workspace packages it depends on.
    #[must_use]
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    /// Names of the packages that depend on `name`, across all edge kinds.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes.get(name).map_or(&[], |node| &node.dependents)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Cycle check over publish-ordering edges, as an iterative depth-first
/// traversal with an explicit stack so very large workspaces cannot
/// overflow the call stack.
fn check_acyclic(nodes: &IndexMap<String, PackageNode>) -> Result<(), GraphError> {
    let index_of: IndexMap<&str, usize> = nodes
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let adjacency: Vec<Vec<usize>> = nodes
        .values()
        .map(|node| {
            node.dependencies
                .iter()
                .filter(|edge| edge.kind.orders_publish())
                .filter_map(|edge| index_of.get(edge.name.as_str()).copied())
                .collect()
        })
        .collect();

    let names: Vec<&str> = nodes.keys().map(String::as_str).collect();
    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        // (node, next edge index to explore)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;

        while let Some((node, edge_idx)) = stack.last_mut() {
            let node = *node;
            if let Some(&next) = adjacency[node].get(*edge_idx) {
                *edge_idx += 1;
                match marks[next] {
                    Mark::Unvisited => {
                        marks[next] = Mark::InProgress;
                        stack.push((next, 0));
                    }
                    Mark::InProgress => {
                        let pos = stack
                            .iter()
                            .position(|&(n, _)| n == next)
                            .expect("in-progress nodes are on the traversal stack");
                        let mut cycle: Vec<String> = stack[pos..]
                            .iter()
                            .map(|&(n, _)| names[n].to_string())
                            .collect();
                        cycle.push(names[next].to_string());
                        return Err(GraphError::Cycle { cycle });
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }

    Ok(())
}

/// Kahn's algorithm over publish-ordering edges. The ready set is a sorted
/// set of names so ties among unconstrained packages break deterministically.
fn topological_sort(nodes: &IndexMap<String, PackageNode>) -> Vec<String> {
    // Distinct names: the same dependency may appear under several sections.
    let mut in_degree: IndexMap<&str, usize> = nodes
        .iter()
        .map(|(name, node)| {
            let degree = node
                .dependencies
                .iter()
                .filter(|edge| edge.kind.orders_publish() && nodes.contains_key(&edge.name))
                .map(|edge| edge.name.as_str())
                .collect::<BTreeSet<_>>()
                .len();
            (name.as_str(), degree)
        })
        .collect();

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&name, _)| name)
        .collect();

    let mut order = Vec::with_capacity(nodes.len());

    while let Some(name) = ready.pop_first() {
        order.push(name.to_string());

        if let Some(node) = nodes.get(name) {
            for dependent in &node.dependents {
                let constrains = nodes
                    .get(dependent)
                    .is_some_and(|d| {
                        d.dependencies
                            .iter()
                            .any(|e| e.name == name && e.kind.orders_publish())
                    });
                if !constrains {
                    continue;
                }
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;
    use std::path::PathBuf;

    fn info(name: &str, version: &str) -> PackageInfo {
        PackageInfo {
            name: name.to_string(),
            version: version.parse().expect("valid version"),
            path: PathBuf::from(format!("/ws/crates/{name}")),
        }
    }

    fn edge(name: &str, kind: EdgeKind) -> DependencyEdge {
        DependencyEdge {
            name: name.to_string(),
            requirement: Some("1.0.0".to_string()),
            kind,
        }
    }

    #[test]
    fn build_resolves_internal_edges_only() {
        let graph = PackageGraph::build(vec![
            (info("core", "1.0.0"), vec![]),
            (
                info("cli", "2.3.1"),
                vec![edge("core", EdgeKind::Normal), edge("serde", EdgeKind::Normal)],
            ),
        ])
        .expect("build should succeed");

        let cli = graph.get("cli").expect("cli present");
        assert_eq!(cli.dependencies.len(), 1);
        assert_eq!(cli.dependencies[0].name, "core");
        assert_eq!(graph.dependents_of("core"), ["cli"]);
    }

    #[test]
    fn build_rejects_duplicate_names() {
        let result = PackageGraph::build(vec![
            (info("core", "1.0.0"), vec![]),
            (info("core", "2.0.0"), vec![]),
        ]);

        assert!(matches!(
            result,
            Err(GraphError::DuplicateName { name, .. }) if name == "core"
        ));
    }

    #[test]
    fn build_rejects_cycles() {
        let result = PackageGraph::build(vec![
            (info("a", "1.0.0"), vec![edge("b", EdgeKind::Normal)]),
            (info("b", "1.0.0"), vec![edge("c", EdgeKind::Normal)]),
            (info("c", "1.0.0"), vec![edge("a", EdgeKind::Normal)]),
        ]);

        let Err(GraphError::Cycle { cycle }) = result else {
            panic!("expected cycle error");
        };
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.len() >= 3);
    }

    #[test]
    fn dev_edge_cycle_is_allowed() {
        let graph = PackageGraph::build(vec![
            (info("lib", "1.0.0"), vec![edge("harness", EdgeKind::Dev)]),
            (info("harness", "0.1.0"), vec![edge("lib", EdgeKind::Normal)]),
        ])
        .expect("dev cycles are legal");

        assert_eq!(graph.topological_order(), ["lib", "harness"]);
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let graph = PackageGraph::build(vec![
            (info("app", "0.1.0"), vec![edge("lib", EdgeKind::Normal)]),
            (info("lib", "0.1.0"), vec![edge("util", EdgeKind::Normal)]),
            (info("util", "0.1.0"), vec![]),
        ])
        .expect("build should succeed");

        assert_eq!(graph.topological_order(), ["util", "lib", "app"]);
    }

    #[test]
    fn topological_order_breaks_ties_by_name() {
        let graph = PackageGraph::build(vec![
            (info("zeta", "0.1.0"), vec![]),
            (info("alpha", "0.1.0"), vec![]),
            (info("mid", "0.1.0"), vec![]),
        ])
        .expect("build should succeed");

        assert_eq!(graph.topological_order(), ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn diamond_dependency_orders_correctly() {
        let graph = PackageGraph::build(vec![
            (
                info("top", "0.1.0"),
                vec![edge("left", EdgeKind::Normal), edge("right", EdgeKind::Normal)],
            ),
            (info("left", "0.1.0"), vec![edge("base", EdgeKind::Normal)]),
            (info("right", "0.1.0"), vec![edge("base", EdgeKind::Build)]),
            (info("base", "0.1.0"), vec![]),
        ])
        .expect("build should succeed");

        let order = graph.topological_order();
        let pos = |name: &str| {
            order
                .iter()
                .position(|n| n == name)
                .expect("package in order")
        };

        assert!(pos("base") < pos("left"));
        assert!(pos("base") < pos("right"));
        assert!(pos("left") < pos("top"));
        assert!(pos("right") < pos("top"));
    }

    #[test]
    fn self_reference_is_ignored() {
        let graph = PackageGraph::build(vec![(
            info("solo", "1.0.0"),
            vec![edge("solo", EdgeKind::Dev)],
        )])
        .expect("build should succeed");

        let solo = graph.get("solo").expect("solo present");
        assert!(solo.dependencies.is_empty());
        assert!(solo.dependents.is_empty());
    }

    #[test]
    fn dependents_are_sorted_and_deduped() {
        let graph = PackageGraph::build(vec![
            (info("base", "1.0.0"), vec![]),
            (
                info("zeta", "1.0.0"),
                vec![edge("base", EdgeKind::Normal), edge("base", EdgeKind::Dev)],
            ),
            (info("alpha", "1.0.0"), vec![edge("base", EdgeKind::Normal)]),
        ])
        .expect("build should succeed");

        assert_eq!(graph.dependents_of("base"), ["alpha", "zeta"]);
    }
}
