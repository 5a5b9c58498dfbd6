//! fpprobe - Check whether the fpcalc binary is available
//!
//! Exit code 0 when the tool answers the version probe, 1 otherwise.

use anyhow::Result;
use chromacache_core::{FingerprintCache, FingerprintService, FpcalcRunner, StaticConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fpprobe")]
#[command(about = "Probe availability of the fpcalc fingerprinting tool", long_about = None)]
struct Args {
    /// Path to the fpcalc binary
    #[arg(long, default_value = "fpcalc")]
    fpcalc: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    let service = FingerprintService::new(
        Box::new(FpcalcRunner::new(&args.fpcalc)),
        FingerprintCache::new(StaticConfig::disabled()),
    );

    let installed = service.check_tool_installed();

    let result = serde_json::json!({
        "installed": installed,
        "binary": args.fpcalc.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&result)?);

    std::process::exit(if installed { 0 } else { 1 });
}
