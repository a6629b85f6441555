mod apply;
mod error;
mod orchestrator;
mod planner;
mod prerelease;
mod retry;

pub mod providers;
pub mod traits;

#[cfg(test)]
pub mod mocks;

pub use apply::{ApplyOutcome, ApplyOutput, apply_changes};
pub use error::{EngineError, PlanError, Result};
pub use orchestrator::{CancellationToken, PublishOptions, PublishOrchestrator};
pub use planner::Planner;
pub use prerelease::{exit_prerelease, start_prerelease};
pub use retry::RetryConfig;
