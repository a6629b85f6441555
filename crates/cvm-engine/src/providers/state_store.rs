use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cvm_core::PrereleaseState;

use crate::error::EngineError;
use crate::traits::StateStore;
use crate::Result;

const PRERELEASE_STATE_FILE: &str = "pre.toml";

/// On-disk form of an active prerelease channel.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    channel: String,
    counter: u64,
}

/// [`StateStore`] persisting the prerelease record at
/// `<staging_root>/pre.toml`. Absence of the file means `Inactive`; saving
/// `Inactive` removes it. Writes go through a temp file and rename so a
/// crashed invocation never leaves a half-written record.
pub struct FileSystemStateStore {
    staging_root: PathBuf,
}

impl FileSystemStateStore {
    #[must_use]
    pub fn new(staging_root: &Path) -> Self {
        Self {
            staging_root: staging_root.to_path_buf(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.staging_root.join(PRERELEASE_STATE_FILE)
    }
}

impl StateStore for FileSystemStateStore {
    fn load(&self) -> Result<PrereleaseState> {
        let path = self.state_path();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PrereleaseState::Inactive);
            }
            Err(source) => return Err(EngineError::StateRead { path, source }),
        };

        let file: StateFile =
            toml::from_str(&content).map_err(|source| EngineError::StateParse { path, source })?;

        Ok(PrereleaseState::Active {
            channel: file.channel,
            counter: file.counter,
        })
    }

    fn save(&self, state: &PrereleaseState) -> Result<()> {
        let path = self.state_path();

        match state {
            PrereleaseState::Inactive => {
                match fs::remove_file(&path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(source) => Err(EngineError::StateWrite { path, source }),
                }
            }
            PrereleaseState::Active { channel, counter } => {
                fs::create_dir_all(&self.staging_root).map_err(|source| {
                    EngineError::StateWrite {
                        path: self.staging_root.clone(),
                        source,
                    }
                })?;

                let content = toml::to_string(&StateFile {
                    channel: channel.clone(),
                    counter: *counter,
                })
                .map_err(|source| EngineError::StateSerialize {
                    path: path.clone(),
                    source,
                })?;

                let tmp = path.with_extension("toml.tmp");
                fs::write(&tmp, content).map_err(|source| EngineError::StateWrite {
                    path: tmp.clone(),
                    source,
                })?;
                fs::rename(&tmp, &path)
                    .map_err(|source| EngineError::StateWrite { path, source })
            }
        }
    }
}
