//! Seen-set — ids of every posting already reported.
//!
//! Persisted as a pretty-printed JSON array of strings, sorted ascending.
//! Loading never fails: a missing or unreadable file is "no prior state".
//! Writes are atomic (write-to-temp then rename).
//!
//! There is no lock around the file; two concurrent runs can race on the
//! read-modify-write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::types::Job;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Grows monotonically: ids are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    ids: BTreeSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. Absent, unreadable or corrupt files yield an empty set.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("seen_store: {} not found, starting empty", path.display());
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!("seen_store: failed to read {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<SeenSet>(&content) {
            Ok(set) => {
                info!(
                    "seen_store: loaded {} ids from {}",
                    set.len(),
                    path.display()
                );
                set
            }
            Err(e) => {
                warn!(
                    "seen_store: failed to parse {}: {} — treating as empty",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Persist to `path` atomically.
    ///
    /// Writes to `{path}.tmp` first, then renames over the final path so a
    /// reader never observes a partially written file.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::write(parent, e))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json).map_err(|e| StoreError::write(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::write(path, e))?;

        info!("seen_store: saved {} ids to {}", self.len(), path.display());
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the id was not present yet.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Jobs whose id is not in the set, in their original order.
    pub fn unseen(&self, jobs: &[Job]) -> Vec<Job> {
        jobs.iter()
            .filter(|j| !self.contains(&j.id))
            .cloned()
            .collect()
    }

    /// Add the ids of `jobs`.
    pub fn merge(&mut self, jobs: &[Job]) {
        for job in jobs {
            self.insert(job.id.clone());
        }
    }
}

impl<S: Into<String>> FromIterator<S> for SeenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
