use crate::error::Result;
use crate::plan::{shard_file_name, SplitPlan};
use crate::record::RecordSink;
use std::fs;
use std::path::{Path, PathBuf};

/// One open output per shard.
///
/// Every sink is opened up front so a bad output path fails before any input
/// is consumed. Dropping the pool releases every sink; `finish` closes them
/// explicitly and reports the first error.
pub struct ShardPool<K> {
    paths: Vec<PathBuf>,
    sinks: Vec<K>,
}

/// Paths of all the shards for `plan` inside `dir`.
pub fn shard_paths(dir: &Path, prefix: &str, ext: &str, plan: &SplitPlan) -> Vec<PathBuf> {
    (0..plan.shard_count)
        .map(|idx| dir.join(shard_file_name(prefix, idx, plan.shard_count, ext)))
        .collect()
}

impl<K> ShardPool<K> {
    /// Open a sink for each path with `opener`.
    /// If any open fails, the files created so far are removed.
    pub fn open<F>(paths: Vec<PathBuf>, mut opener: F) -> Result<ShardPool<K>>
    where
        F: FnMut(&Path) -> Result<K>,
    {
        let mut sinks = Vec::with_capacity(paths.len());
        for path in &paths {
            match opener(path) {
                Ok(sink) => {
                    log::debug!("Opened shard {}", path.display());
                    sinks.push(sink);
                }
                Err(e) => {
                    let created = sinks.len();
                    drop(sinks);
                    remove_created(&paths[..created]);
                    return Err(e);
                }
            }
        }
        Ok(ShardPool { paths, sinks })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn sinks_mut(&mut self) -> &mut [K] {
        &mut self.sinks
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Close every sink exactly once.
    /// All sinks are closed even if an earlier one fails.
    pub fn finish(self) -> Result<()>
    where
        K: RecordSink,
    {
        let mut first_err = None;
        for (path, sink) in self.paths.iter().zip(self.sinks) {
            if let Err(e) = sink.close() {
                log::error!("Failed to close {}: {}", path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn remove_created(paths: &[PathBuf]) {
    for path in paths.iter().filter(|p| p.exists()) {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Unable to remove partial shard {}: {}", path.display(), e);
        }
    }
}
