// Level unlock progress
//
// The session only sees the `ProgressStore` trait. Loading and saving belong to
// whoever owns the concrete store (the host), never to first use.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// The first level is always playable
pub const FIRST_LEVEL: u32 = 1;

/// Errors raised by persisted progress
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Failed to access progress file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt progress file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read/unlock access to level progress
pub trait ProgressStore {
    /// Whether `level` may be started
    fn is_unlocked(&self, level: u32) -> bool;

    /// Record that `level` was cleared, unlocking `level + 1`
    fn mark_complete(&mut self, level: u32);

    /// All unlocked levels, ascending
    fn unlocked_levels(&self) -> Vec<u32>;
}

impl<T: ProgressStore + ?Sized> ProgressStore for &mut T {
    fn is_unlocked(&self, level: u32) -> bool {
        (**self).is_unlocked(level)
    }

    fn mark_complete(&mut self, level: u32) {
        (**self).mark_complete(level)
    }

    fn unlocked_levels(&self) -> Vec<u32> {
        (**self).unlocked_levels()
    }
}

/// Unlocked levels kept in memory only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryProgressStore {
    unlocked: BTreeSet<u32>,
}

impl InMemoryProgressStore {
    /// Only the first level unlocked
    pub fn new() -> Self {
        Self::from_levels([FIRST_LEVEL])
    }

    /// Start from a set of unlocked levels. The first level is always included.
    pub fn from_levels(levels: impl IntoIterator<Item = u32>) -> Self {
        let mut unlocked: BTreeSet<u32> = levels.into_iter().collect();
        unlocked.insert(FIRST_LEVEL);
        Self { unlocked }
    }

    /// Unlock a specific level. Returns true if it was newly unlocked.
    pub fn unlock(&mut self, level: u32) -> bool {
        self.unlocked.insert(level)
    }
}

impl Default for InMemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for InMemoryProgressStore {
    fn is_unlocked(&self, level: u32) -> bool {
        self.unlocked.contains(&level)
    }

    fn mark_complete(&mut self, level: u32) {
        match level.checked_add(1) {
            Some(next) => {
                if self.unlock(next) {
                    info!("Level {} complete, level {} unlocked", level, next);
                }
            }
            None => warn!("Level {} complete, no level after it to unlock", level),
        }
    }

    fn unlocked_levels(&self) -> Vec<u32> {
        self.unlocked.iter().copied().collect()
    }
}

/// On-disk record: `{"unlocked_levels": [1, 2]}`
#[derive(Debug, Serialize, Deserialize)]
struct ProgressRecord {
    #[serde(default = "default_unlocked")]
    unlocked_levels: Vec<u32>,
}

fn default_unlocked() -> Vec<u32> {
    vec![FIRST_LEVEL]
}

/// Progress persisted as a JSON file
#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    levels: InMemoryProgressStore,
    dirty: bool,
}

impl JsonProgressStore {
    /// Default file name next to the executable's working directory
    pub const DEFAULT_FILE: &'static str = "progress.json";

    /// Fresh progress that will be written to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            levels: InMemoryProgressStore::new(),
            dirty: false,
        }
    }

    /// Load progress, failing on unreadable or malformed files
    ///
    /// A missing file is not an error: it means nothing was unlocked yet.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ProgressError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !path.exists() {
            return Ok(Self::new(path));
        }

        let text = fs::read_to_string(path).map_err(|source| ProgressError::Io {
            path: display.clone(),
            source,
        })?;
        let record: ProgressRecord =
            serde_json::from_str(&text).map_err(|err| ProgressError::Corrupt {
                path: display,
                reason: err.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            levels: InMemoryProgressStore::from_levels(record.unlocked_levels),
            dirty: false,
        })
    }

    /// Load progress, falling back to only the first level on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(store) => store,
            Err(err) => {
                warn!("{}; resetting progress to level {}", err, FIRST_LEVEL);
                Self::new(path)
            }
        }
    }

    /// Write the unlocked set to disk
    pub fn save(&mut self) -> Result<(), ProgressError> {
        let record = ProgressRecord {
            unlocked_levels: self.levels.unlocked_levels(),
        };
        let text = serde_json::to_string(&record)?;
        fs::write(&self.path, text).map_err(|source| ProgressError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        self.dirty = false;
        Ok(())
    }

    /// Whether there are unlocks not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonProgressStore {
    fn is_unlocked(&self, level: u32) -> bool {
        self.levels.is_unlocked(level)
    }

    fn mark_complete(&mut self, level: u32) {
        let before = self.levels.unlocked_levels().len();
        self.levels.mark_complete(level);
        if self.levels.unlocked_levels().len() != before {
            self.dirty = true;
        }
    }

    fn unlocked_levels(&self) -> Vec<u32> {
        self.levels.unlocked_levels()
    }
}
