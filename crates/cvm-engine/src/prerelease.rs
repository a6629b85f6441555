use tracing::info;

use cvm_core::PrereleaseState;

use crate::Result;
use crate::traits::StateStore;

/// Enters a prerelease channel and persists the new state.
///
/// # Errors
///
/// Returns `PrereleaseError::AlreadyActive` when a channel is active;
/// switching channels requires an explicit exit first.
pub fn start_prerelease(state_store: &dyn StateStore, channel: &str) -> Result<PrereleaseState> {
    let mut state = state_store.load()?;
    state.start(channel)?;
    state_store.save(&state)?;

    info!(channel, "entered prerelease channel");
    Ok(state)
}

/// Leaves the active prerelease channel. A no-op success when already
/// inactive.
///
/// # Errors
///
/// Returns an error if the state cannot be loaded or persisted.
pub fn exit_prerelease(state_store: &dyn StateStore) -> Result<PrereleaseState> {
    let mut state = state_store.load()?;

    if let Some(channel) = state.channel() {
        info!(channel, "exiting prerelease channel");
    }

    state.exit();
    state_store.save(&state)?;
    Ok(state)
}
