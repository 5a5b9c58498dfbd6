//! Chromacache Core - Acoustic Fingerprint Acquisition & Cache
//!
//! This crate acquires Chromaprint fingerprints for media items by invoking
//! the external `fpcalc` tool, and persists the results in a disk-backed
//! cache keyed by stable item identity.

pub mod cache;
pub mod config;
pub mod error;
pub mod item;
pub mod parser;
pub mod service;
pub mod tool;

pub use cache::{CacheWriteTask, FingerprintCache};
pub use config::{CacheConfig, ChromacacheConfig, ConfigSource, StaticConfig, TomlConfigSource};
pub use error::FingerprintError;
pub use item::{Fingerprint, ItemId, QueuedItem};
pub use parser::parse_tool_output;
pub use service::{FingerprintOrigin, FingerprintService};
pub use tool::{FpcalcRunner, ToolRunner, FINGERPRINT_TIMEOUT, PROBE_TIMEOUT};

use std::sync::Arc;

/// Fingerprint a single item with the default `fpcalc` runner
pub fn fingerprint_item(
    item: &QueuedItem,
    config: Arc<dyn ConfigSource>,
) -> Result<Fingerprint, FingerprintError> {
    let service = FingerprintService::new(
        Box::new(FpcalcRunner::default()),
        FingerprintCache::new(config),
    );
    service.fingerprint(item)
}
