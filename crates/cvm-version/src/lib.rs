use cvm_core::Severity;
use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version '{version}' is on channel '{found}', expected '{expected}'")]
    ChannelMismatch {
        version: String,
        found: String,
        expected: String,
    },

    #[error("malformed prerelease counter in '{version}'")]
    MalformedCounter { version: String },

    #[error("invalid prerelease channel '{channel}'")]
    InvalidChannel {
        channel: String,
        #[source]
        source: semver::Error,
    },
}

/// Applies a stable bump. Major zeroes minor and patch; minor zeroes patch.
/// Any prerelease suffix or build metadata on the input is cleared.
#[must_use]
pub fn bump(version: &Version, severity: Severity) -> Version {
    let mut new_version = version.clone();

    match severity {
        Severity::Major => {
            new_version.major += 1;
            new_version.minor = 0;
            new_version.patch = 0;
        }
        Severity::Minor => {
            new_version.minor += 1;
            new_version.patch = 0;
        }
        Severity::Patch => {
            new_version.patch += 1;
        }
    }

    new_version.pre = Prerelease::EMPTY;
    new_version.build = BuildMetadata::EMPTY;
    new_version
}

#[must_use]
pub fn is_prerelease(version: &Version) -> bool {
    !version.pre.is_empty()
}

#[must_use]
pub fn max_severity(severities: &[Severity]) -> Option<Severity> {
    severities.iter().copied().max()
}

/// The strongest bump already encoded in a stable version's shape: `x.0.0`
/// reads as a major bump, `x.y.0` as minor, anything else as patch.
fn encoded_severity(version: &Version) -> Severity {
    if version.minor == 0 && version.patch == 0 {
        Severity::Major
    } else if version.patch == 0 {
        Severity::Minor
    } else {
        Severity::Patch
    }
}

/// The prerelease counter of `version` on `channel`, when it carries one.
/// A bare `-<channel>` identifier counts as 0.
///
/// # Errors
///
/// Returns `ChannelMismatch` when the version is on a different channel and
/// `MalformedCounter` when the trailing segment is not a number.
pub fn prerelease_counter(version: &Version, channel: &str) -> Result<Option<u64>, VersionError> {
    if version.pre.is_empty() {
        return Ok(None);
    }

    let pre = version.pre.as_str();
    if pre == channel {
        return Ok(Some(0));
    }

    if let Some(rest) = pre.strip_prefix(channel) {
        if let Some(counter) = rest.strip_prefix('.') {
            return counter
                .parse::<u64>()
                .map(Some)
                .map_err(|_| VersionError::MalformedCounter {
                    version: version.to_string(),
                });
        }
    }

    let found = pre.split('.').next().unwrap_or(pre);
    Err(VersionError::ChannelMismatch {
        version: version.to_string(),
        found: found.to_string(),
        expected: channel.to_string(),
    })
}

/// Computes the next prerelease version on `channel`.
///
/// Entering the channel from a stable version applies the requested stable
/// bump and appends `-<channel>.1`. A version already on the channel keeps
/// its numeric base and increments the counter; the severity was consumed
/// when the base moved.
///
/// # Errors
///
/// Returns an error for an invalid channel identifier, a version on a
/// different channel, or a malformed counter.
pub fn prerelease_increment(
    version: &Version,
    channel: &str,
    severity: Severity,
) -> Result<Version, VersionError> {
    let (mut base, counter) = match prerelease_counter(version, channel)? {
        Some(counter) => {
            let mut stripped = version.clone();
            stripped.pre = Prerelease::EMPTY;
            stripped.build = BuildMetadata::EMPTY;
            (stripped, counter + 1)
        }
        None => (bump(version, severity), 1),
    };

    base.pre = Prerelease::new(&format!("{channel}.{counter}")).map_err(|source| {
        VersionError::InvalidChannel {
            channel: channel.to_string(),
            source,
        }
    })?;

    Ok(base)
}

/// Applies a stable bump to a version that may carry a prerelease suffix.
///
/// The suffix is cleared and the requested severity is compared against the
/// bump already encoded in the stripped base: equal or weaker requests yield
/// the base alone, stronger requests bump on top of it.
#[must_use]
pub fn stabilize(version: &Version, severity: Severity) -> Version {
    if !is_prerelease(version) {
        return bump(version, severity);
    }

    let mut stripped = version.clone();
    stripped.pre = Prerelease::EMPTY;
    stripped.build = BuildMetadata::EMPTY;

    if severity <= encoded_severity(&stripped) {
        stripped
    } else {
        bump(&stripped, severity)
    }
}
