//! Waiting for a browser download to land on disk.
//!
//! Browsers write a download under a temporary name and rename it when
//! done, so only files with the wanted extension count. A file is
//! reported once two evaluations in a row see the same non-zero size.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::driver::WebDriver;
use crate::error::Result;

use super::condition::Condition;
use super::poller::Observation;

/// Met when a new file with the given extension has finished writing.
///
/// Files already in the directory when the condition is created are
/// ignored. A missing directory reads as empty.
#[derive(Debug)]
pub struct Downloaded {
    dir: PathBuf,
    extension: String,
    existing: FxHashSet<PathBuf>,
    sizes: Mutex<FxHashMap<PathBuf, u64>>,
}

impl Downloaded {
    /// Records the files in `dir` now and waits for a new `*.{extension}`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` exists but cannot be listed.
    pub fn capture(dir: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let dir = dir.into();
        let existing = list(&dir)?.into_iter().collect();
        Ok(Self {
            dir,
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
            existing,
            sizes: Mutex::new(FxHashMap::default()),
        })
    }

    fn wanted(&self, path: &Path) -> bool {
        !self.existing.contains(path)
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

#[async_trait]
impl Condition for Downloaded {
    type Value = PathBuf;

    fn describe(&self) -> String {
        format!("*.{} downloaded to {}", self.extension, self.dir.display())
    }

    async fn evaluate(&self, _driver: &dyn WebDriver) -> Result<Observation<PathBuf>> {
        let mut sizes = self.sizes.lock();
        let mut seen = None;
        for path in list(&self.dir)?.into_iter().filter(|p| self.wanted(p)) {
            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let previous = sizes.insert(path.clone(), size);
            trace!(path = %path.display(), size, ?previous, "Download candidate");
            if size > 0 && previous == Some(size) {
                return Ok(Observation::Met(path));
            }
            seen = Some(path);
        }
        Ok(Observation::Unmet(seen))
    }
}

fn list(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}
