use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrereleaseError {
    #[error("prerelease channel '{current}' is already active; run exit before starting '{requested}'")]
    AlreadyActive { current: String, requested: String },

    #[error("no prerelease channel is active")]
    NotActive,
}

/// Whether the workspace is on a prerelease channel.
///
/// Persisted alongside the workspace (absence of the state file means
/// `Inactive`) so sequential invocations across process runs agree on the
/// channel and counter. Mutated only through [`start`](Self::start),
/// [`exit`](Self::exit), and [`advance`](Self::advance), never implicitly
/// by a bump computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PrereleaseState {
    #[default]
    Inactive,
    Active {
        channel: String,
        /// Highest prerelease counter applied on this channel so far.
        counter: u64,
    },
}

impl PrereleaseState {
    /// Enters the given channel.
    ///
    /// # Errors
    ///
    /// Returns `PrereleaseError::AlreadyActive` if a channel is active,
    /// including the same one; switching channels requires an explicit
    /// `exit` first.
    pub fn start(&mut self, channel: &str) -> Result<(), PrereleaseError> {
        match self {
            Self::Inactive => {
                *self = Self::Active {
                    channel: channel.to_string(),
                    counter: 0,
                };
                Ok(())
            }
            Self::Active { channel: current, .. } => Err(PrereleaseError::AlreadyActive {
                current: current.clone(),
                requested: channel.to_string(),
            }),
        }
    }

    /// Leaves the active channel. A no-op when already inactive.
    pub fn exit(&mut self) {
        *self = Self::Inactive;
    }

    /// Records that a plan applied prerelease counters up to `counter`.
    /// Counters never move backwards. No-op when inactive.
    pub fn advance(&mut self, counter: u64) {
        if let Self::Active { counter: current, .. } = self {
            *current = (*current).max(counter);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::Inactive => None,
            Self::Active { channel, .. } => Some(channel),
        }
    }

    #[must_use]
    pub fn counter(&self) -> Option<u64> {
        match self {
            Self::Inactive => None,
            Self::Active { counter, .. } => Some(*counter),
        }
    }
}
