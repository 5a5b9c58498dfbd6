//! fpfetch - Acquire the fingerprint for a single media item
//!
//! Usage: fpfetch --id <hex> [--duration <secs>] <media_path>

use anyhow::{Context, Result};
use chromacache_core::{
    CacheConfig, ChromacacheConfig, ConfigSource, FingerprintCache, FingerprintOrigin,
    FingerprintService, FpcalcRunner, ItemId, QueuedItem, StaticConfig, TomlConfigSource,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "fpfetch")]
#[command(about = "Acquire and cache the acoustic fingerprint of a media item", long_about = None)]
struct Args {
    /// Media file to fingerprint
    media_path: PathBuf,

    /// Item identity as a hex token (GUID-style hyphens allowed)
    #[arg(long)]
    id: String,

    /// Fingerprint duration in seconds
    #[arg(long, default_value_t = 600)]
    duration: u32,

    /// TOML config file; its [cache] section is re-read on every operation
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory (ignored when --config is given)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Disable the fingerprint cache (ignored when --config is given)
    #[arg(long)]
    no_cache: bool,

    /// Path to the fpcalc binary (overrides the config file)
    #[arg(long)]
    fpcalc: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    // Verbose: show Info level logs for debugging
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    run_fpfetch(&args)
}

fn run_fpfetch(args: &Args) -> Result<()> {
    let id: ItemId = args
        .id
        .parse()
        .with_context(|| format!("Invalid item id: {}", args.id))?;

    let config_source: Arc<dyn ConfigSource> = match &args.config {
        Some(path) => Arc::new(TomlConfigSource::new(path)),
        None => {
            let mut cache = CacheConfig::default();
            if let Some(dir) = &args.cache_dir {
                cache.directory = dir.clone();
            }
            if args.no_cache {
                cache.enabled = false;
            }
            Arc::new(StaticConfig::new(cache))
        }
    };

    let binary = match &args.fpcalc {
        Some(path) => path.clone(),
        None => match &args.config {
            Some(path) => ChromacacheConfig::load(path)?.tool.binary,
            None => PathBuf::from("fpcalc"),
        },
    };

    let service = FingerprintService::new(
        Box::new(FpcalcRunner::new(binary)),
        FingerprintCache::new(config_source),
    );

    let item = QueuedItem::new(id, &args.media_path, args.duration);
    // Blocking variant: this process exits right after printing, so the
    // cache write must not be left to a detached thread.
    let (fingerprint, origin) = service
        .fingerprint_blocking_store(&item)
        .with_context(|| format!("Failed to fingerprint {}", args.media_path.display()))?;

    let result = serde_json::json!({
        "status": "success",
        "item_id": item.id.to_string(),
        "media_path": args.media_path.display().to_string(),
        "duration_s": args.duration,
        "cache_hit": origin == FingerprintOrigin::Cache,
        "num_values": fingerprint.len(),
        "fingerprint": fingerprint.as_slice(),
    });

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
