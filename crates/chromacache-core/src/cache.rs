//! Disk-backed fingerprint cache
//!
//! One text file per item identity under a configured base directory, one
//! decimal u32 per line. The enable flag and the directory are consulted
//! live on every operation through the injected [`ConfigSource`].
//!
//! A present entry is authoritative while caching is enabled: there is no
//! staleness check and no re-validation against the source media. A corrupt
//! entry is a hard [`FingerprintError::CacheCorruption`], never a silent
//! fall-back to recomputation, so systemic cache damage cannot go unnoticed.

use crate::config::ConfigSource;
use crate::error::FingerprintError;
use crate::item::{Fingerprint, ItemId, QueuedItem};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tempfile::NamedTempFile;

pub struct FingerprintCache {
    config: Arc<dyn ConfigSource>,
}

impl FingerprintCache {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self { config }
    }

    /// Cache entry path for an item identity. Pure function of the identity;
    /// distinct ids never collide.
    pub fn entry_path(base: &Path, id: ItemId) -> PathBuf {
        base.join(id.cache_token())
    }

    /// Look up a cached fingerprint.
    ///
    /// Returns `None` without touching the filesystem when caching is
    /// disabled, and `None` when no entry exists for the item.
    pub fn try_load(&self, item: &QueuedItem) -> Result<Option<Fingerprint>, FingerprintError> {
        let config = self.config.cache_config();
        if !config.enabled {
            return Ok(None);
        }

        let path = Self::entry_path(&config.directory, item.id);
        if !path.exists() {
            log::debug!("fingerprint cache miss for {}", item.id);
            return Ok(None);
        }

        let text = fs::read_to_string(&path)?;
        let mut values = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value = line
                .parse::<u32>()
                .map_err(|_| FingerprintError::CacheCorruption {
                    path: path.clone(),
                    line: index + 1,
                })?;
            values.push(value);
        }

        log::debug!(
            "fingerprint cache hit for {} ({} values)",
            item.id,
            values.len()
        );
        Ok(Some(Fingerprint::new(values)))
    }

    /// Persist a fingerprint, best-effort.
    ///
    /// A no-op when caching is disabled. Otherwise the entry is written by a
    /// background task; write failures are logged inside the task and never
    /// reach the caller, whose freshly computed fingerprint stays valid
    /// regardless.
    pub fn store(&self, item: &QueuedItem, fingerprint: &Fingerprint) -> CacheWriteTask {
        let config = self.config.cache_config();
        if !config.enabled {
            return CacheWriteTask::noop();
        }

        let directory = config.directory;
        let path = Self::entry_path(&directory, item.id);
        let values = fingerprint.as_slice().to_vec();
        let id = item.id;

        let handle = thread::Builder::new()
            .name("fp-cache-write".to_string())
            .spawn(move || {
                if let Err(e) = write_entry(&directory, &path, &values) {
                    log::warn!("failed to persist fingerprint cache entry for {}: {}", id, e);
                }
            });

        match handle {
            Ok(handle) => CacheWriteTask {
                handle: Some(handle),
            },
            Err(e) => {
                log::warn!("failed to spawn cache write task for {}: {}", id, e);
                CacheWriteTask::noop()
            }
        }
    }
}

/// One decimal per line, written to a temp file in the cache directory and
/// atomically renamed into place, so concurrent readers see either no entry
/// or a complete one.
fn write_entry(directory: &Path, path: &Path, values: &[u32]) -> io::Result<()> {
    fs::create_dir_all(directory)?;
    let mut tmp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for value in values {
            writeln!(writer, "{}", value)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Handle for a best-effort background cache write.
///
/// Callers are never required to await it; [`CacheWriteTask::join`] exists
/// for tests and shutdown paths.
pub struct CacheWriteTask {
    handle: Option<JoinHandle<()>>,
}

impl CacheWriteTask {
    pub(crate) fn noop() -> Self {
        Self { handle: None }
    }

    /// True when the write was skipped (caching disabled)
    pub fn is_noop(&self) -> bool {
        self.handle.is_none()
    }

    /// Block until the write has finished. Surfaces nothing; failures were
    /// already logged by the task.
    pub fn join(self) {
        if let Some(handle) = self.handle {
            let _ = handle.join();
        }
    }
}
