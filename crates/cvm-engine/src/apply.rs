use tracing::{debug, info};

use cvm_core::{AppliedSeverity, PrereleaseState, VersionPlan};
use cvm_graph::Workspace;

use crate::Result;
use crate::planner::Planner;
use crate::traits::{ChangeStore, ManifestMutator, StateStore};

#[derive(Debug, Clone)]
pub struct ApplyOutput {
    pub plan: VersionPlan,
    /// Ids of the descriptor files deleted after application.
    pub deleted_changes: Vec<String>,
    pub state: PrereleaseState,
}

#[derive(Debug)]
pub enum ApplyOutcome {
    /// Nothing staged; distinct from an error.
    NoChanges,
    DryRun(ApplyOutput),
    Applied(ApplyOutput),
}

/// Plans the staged changes and applies the plan: package versions and
/// dependency requirements are rewritten in place, consumed descriptor
/// files are deleted (after mutation, never before), and the prerelease
/// counter is advanced and persisted for prerelease batches.
///
/// Dry-run stops after planning and mutates nothing.
///
/// # Errors
///
/// Returns an error when listing/planning fails or any manifest mutation
/// fails; mutation errors abort the run so the operator can fix the tree
/// and re-run.
pub fn apply_changes(
    workspace: &Workspace,
    store: &dyn ChangeStore,
    state_store: &dyn StateStore,
    mutator: &dyn ManifestMutator,
    dry_run: bool,
) -> Result<ApplyOutcome> {
    let descriptors = store.list()?;
    if descriptors.is_empty() {
        debug!("no staged changes");
        return Ok(ApplyOutcome::NoChanges);
    }

    let mut state = state_store.load()?;
    let plan = Planner::plan(
        &workspace.graph,
        &descriptors,
        &state,
        workspace.config.propagated_severity(),
    )?;

    if plan.is_empty() {
        return Ok(ApplyOutcome::NoChanges);
    }

    info!(
        releases = plan.releases.len(),
        dry_run, "computed version plan"
    );

    if dry_run {
        return Ok(ApplyOutcome::DryRun(ApplyOutput {
            plan,
            deleted_changes: Vec::new(),
            state,
        }));
    }

    for release in &plan.releases {
        let node = workspace
            .graph
            .get(&release.name)
            .expect("planned names are graph nodes");
        let manifest_path = node.info.manifest_path();

        debug!(package = %release.name, from = %release.previous, to = %release.new, "writing version");
        mutator.write_version(&manifest_path, &release.new)?;
    }

    for update in &plan.requirement_updates {
        let node = workspace
            .graph
            .get(&update.dependent)
            .expect("dependents are graph nodes");

        mutator.update_requirement(
            &node.info.manifest_path(),
            &update.dependency,
            &update.requirement,
        )?;
    }

    // Root [workspace.dependencies] may pin internal versions too; entries
    // are optional there, so a miss is fine.
    if !workspace.is_single_package() {
        let root_manifest = workspace.root_manifest_path();
        for release in &plan.releases {
            mutator.try_update_requirement(
                &root_manifest,
                &release.name,
                &release.new.to_string(),
            )?;
        }
    }

    for release in &plan.releases {
        let node = workspace
            .graph
            .get(&release.name)
            .expect("planned names are graph nodes");
        mutator.verify_version(&node.info.manifest_path(), &release.new)?;
    }

    let mut deleted_changes = Vec::new();
    if workspace.config.keep_changes() {
        debug!("keep_changes set; leaving descriptor files in place");
    } else {
        for descriptor in &descriptors {
            store.delete(&descriptor.id)?;
            deleted_changes.push(descriptor.id.clone());
        }
    }

    if let Some(channel) = state.channel() {
        let applied_counter = highest_applied_counter(&plan, channel)?;
        if let Some(counter) = applied_counter {
            state.advance(counter);
            state_store.save(&state)?;
        }
    }

    info!(releases = plan.releases.len(), "applied version plan");

    Ok(ApplyOutcome::Applied(ApplyOutput {
        plan,
        deleted_changes,
        state,
    }))
}

fn highest_applied_counter(plan: &VersionPlan, channel: &str) -> Result<Option<u64>> {
    let mut highest = None;

    for release in &plan.releases {
        if release.severity != AppliedSeverity::Prerelease {
            continue;
        }
        if let Some(counter) =
            cvm_version::prerelease_counter(&release.new, channel).map_err(crate::PlanError::from)?
        {
            highest = Some(highest.map_or(counter, |h: u64| h.max(counter)));
        }
    }

    Ok(highest)
}
