//! Fingerprint acquisition service
//!
//! Orchestrates cache lookup, tool invocation, output parsing and
//! best-effort cache persistence for a queued item.

use crate::cache::{CacheWriteTask, FingerprintCache};
use crate::error::FingerprintError;
use crate::item::{Fingerprint, QueuedItem};
use crate::parser::parse_tool_output;
use crate::tool::{ToolRunner, FINGERPRINT_TIMEOUT, PROBE_TIMEOUT};
use std::ffi::OsString;

/// Where an acquired fingerprint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintOrigin {
    Cache,
    Tool,
}

pub struct FingerprintService {
    runner: Box<dyn ToolRunner>,
    cache: FingerprintCache,
}

impl FingerprintService {
    pub fn new(runner: Box<dyn ToolRunner>, cache: FingerprintCache) -> Self {
        Self { runner, cache }
    }

    /// Acquire the fingerprint for an item.
    ///
    /// A cache hit returns immediately without invoking the tool. On a miss
    /// the tool is run against the item's media path, its output parsed, and
    /// the result handed to a background cache write before being returned.
    /// Cache read corruption propagates; cache write failures never do.
    pub fn fingerprint(&self, item: &QueuedItem) -> Result<Fingerprint, FingerprintError> {
        self.fingerprint_with_origin(item).map(|(fp, _)| fp)
    }

    /// Like [`fingerprint`](Self::fingerprint), additionally reporting
    /// whether the result came from the cache.
    pub fn fingerprint_with_origin(
        &self,
        item: &QueuedItem,
    ) -> Result<(Fingerprint, FingerprintOrigin), FingerprintError> {
        let (fingerprint, origin, _task) = self.acquire(item)?;
        Ok((fingerprint, origin))
    }

    /// Like [`fingerprint_with_origin`](Self::fingerprint_with_origin), but
    /// blocks until the cache write has finished. For short-lived processes
    /// that would otherwise exit before the background write completes.
    pub fn fingerprint_blocking_store(
        &self,
        item: &QueuedItem,
    ) -> Result<(Fingerprint, FingerprintOrigin), FingerprintError> {
        let (fingerprint, origin, task) = self.acquire(item)?;
        task.join();
        Ok((fingerprint, origin))
    }

    fn acquire(
        &self,
        item: &QueuedItem,
    ) -> Result<(Fingerprint, FingerprintOrigin, CacheWriteTask), FingerprintError> {
        if let Some(cached) = self.cache.try_load(item)? {
            return Ok((cached, FingerprintOrigin::Cache, CacheWriteTask::noop()));
        }

        log::info!(
            "fingerprinting {} ({}s) via external tool",
            item.media_path.display(),
            item.fingerprint_duration_s
        );

        let raw = self
            .runner
            .run(&fingerprint_args(item), FINGERPRINT_TIMEOUT)?;
        let fingerprint = parse_tool_output(&raw, &item.media_path)?;

        // Persistence is best-effort; failures stay inside the task.
        let task = self.cache.store(item, &fingerprint);

        Ok((fingerprint, FingerprintOrigin::Tool, task))
    }

    /// Probe whether the external tool is available.
    ///
    /// True only when the version query answers with the expected banner.
    /// Never fails: any invocation error reads as "not installed".
    pub fn check_tool_installed(&self) -> bool {
        match self.runner.run(&[OsString::from("-version")], PROBE_TIMEOUT) {
            Ok(output) => output
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("fpcalc version"),
            Err(e) => {
                log::debug!("fingerprint tool probe failed: {}", e);
                false
            }
        }
    }
}

/// Argument list for a fingerprinting run. The media path travels as its own
/// argument, so paths containing quotes or spaces need no escaping.
fn fingerprint_args(item: &QueuedItem) -> Vec<OsString> {
    vec![
        OsString::from("-raw"),
        OsString::from("-length"),
        OsString::from(item.fingerprint_duration_s.to_string()),
        item.media_path.clone().into_os_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfig;
    use crate::item::ItemId;
    use crate::tool::FpcalcRunner;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Runner returning canned output, counting invocations
    struct StubRunner {
        output: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl StubRunner {
        fn ok(output: &str) -> Self {
            Self {
                output: Ok(output.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                output: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ToolRunner for StubRunner {
        fn run(&self, _args: &[OsString], _timeout: Duration) -> Result<String, FingerprintError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.output {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(FingerprintError::ToolInvocation(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "stub",
                ))),
            }
        }
    }

    fn item(id: u128) -> QueuedItem {
        QueuedItem::new(ItemId::new(id), "/media/episode.mkv", 600)
    }

    fn service_with(
        runner: Arc<StubRunner>,
        config: Arc<StaticConfig>,
    ) -> FingerprintService {
        struct Shared(Arc<StubRunner>);
        impl ToolRunner for Shared {
            fn run(
                &self,
                args: &[OsString],
                timeout: Duration,
            ) -> Result<String, FingerprintError> {
                self.0.run(args, timeout)
            }
        }
        FingerprintService::new(Box::new(Shared(runner)), FingerprintCache::new(config))
    }

    #[test]
    fn test_miss_runs_tool_and_returns_parsed_values() {
        let runner = Arc::new(StubRunner::ok("DURATION=120\nFINGERPRINT=4,5,6"));
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(runner.clone(), StaticConfig::enabled(dir.path()));

        let (fp, origin) = service.fingerprint_with_origin(&item(1)).unwrap();
        assert_eq!(fp.as_slice(), &[4, 5, 6]);
        assert_eq!(origin, FingerprintOrigin::Tool);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hit_skips_tool() {
        let runner = Arc::new(StubRunner::ok("DURATION=120\nFINGERPRINT=4,5,6"));
        let dir = tempfile::tempdir().unwrap();
        let config = StaticConfig::enabled(dir.path());
        let cache = FingerprintCache::new(config.clone());
        cache
            .store(&item(2), &Fingerprint::new(vec![9, 8, 7]))
            .join();

        let service = service_with(runner.clone(), config);
        let (fp, origin) = service.fingerprint_with_origin(&item(2)).unwrap();
        assert_eq!(fp.as_slice(), &[9, 8, 7]);
        assert_eq!(origin, FingerprintOrigin::Cache);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blocking_store_persists_before_returning() {
        let runner = Arc::new(StubRunner::ok("DURATION=120\nFINGERPRINT=4,5,6"));
        let dir = tempfile::tempdir().unwrap();
        let config = StaticConfig::enabled(dir.path());
        let service = service_with(runner.clone(), config.clone());

        let (_, origin) = service.fingerprint_blocking_store(&item(6)).unwrap();
        assert_eq!(origin, FingerprintOrigin::Tool);

        // The write has completed by the time the call returns, so a fresh
        // cache sees the entry without any settling delay.
        let cache = FingerprintCache::new(config);
        let loaded = cache.try_load(&item(6)).unwrap().unwrap();
        assert_eq!(loaded.as_slice(), &[4, 5, 6]);
    }

    #[test]
    fn test_malformed_tool_output_propagates() {
        let runner = Arc::new(StubRunner::ok("garbage"));
        let service = service_with(runner, StaticConfig::disabled());

        assert!(matches!(
            service.fingerprint(&item(3)),
            Err(FingerprintError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_tool_failure_propagates() {
        let runner = Arc::new(StubRunner::failing());
        let service = service_with(runner, StaticConfig::disabled());

        assert!(matches!(
            service.fingerprint(&item(4)),
            Err(FingerprintError::ToolInvocation(_))
        ));
    }

    #[test]
    fn test_probe_matches_banner_case_insensitively() {
        let runner = Arc::new(StubRunner::ok("FPCALC Version 1.5.1\n"));
        let service = service_with(runner, StaticConfig::disabled());
        assert!(service.check_tool_installed());
    }

    #[test]
    fn test_probe_rejects_other_output() {
        let runner = Arc::new(StubRunner::ok("usage: something else\n"));
        let service = service_with(runner, StaticConfig::disabled());
        assert!(!service.check_tool_installed());
    }

    #[test]
    fn test_probe_is_false_when_binary_is_missing() {
        let service = FingerprintService::new(
            Box::new(FpcalcRunner::new("/nonexistent/fpcalc-binary")),
            FingerprintCache::new(StaticConfig::disabled()),
        );
        assert!(!service.check_tool_installed());
    }

    #[test]
    fn test_fingerprint_args_shape() {
        let args = fingerprint_args(&item(5));
        assert_eq!(
            args,
            vec![
                OsString::from("-raw"),
                OsString::from("-length"),
                OsString::from("600"),
                OsString::from("/media/episode.mkv"),
            ]
        );
    }
}
