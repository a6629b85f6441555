mod prerelease;
mod types;

pub use prerelease::{PrereleaseError, PrereleaseState};
pub use types::{
    AppliedSeverity, BumpReason, ChangeDescriptor, PackageInfo, PlanEntry, PlannedRelease,
    PublishRecord, RegistryOutcome, RequirementUpdate, Severity, VersionPlan,
};
