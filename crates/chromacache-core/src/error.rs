//! Error types for fingerprint acquisition and caching

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the fingerprint pipeline
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The tool produced output that does not match the expected grammar
    #[error("malformed fpcalc output for {media_path}")]
    MalformedOutput { media_path: PathBuf },

    /// A fingerprint token could not be parsed as an unsigned 32-bit integer
    #[error("invalid fingerprint value {token:?} for {media_path}")]
    NumberFormat { token: String, media_path: PathBuf },

    /// A cache entry contains a line that is not an unsigned 32-bit integer
    #[error("corrupt fingerprint cache entry {path} (line {line})")]
    CacheCorruption { path: PathBuf, line: usize },

    /// The external tool could not be started or waited on
    #[error("failed to invoke fingerprint tool")]
    ToolInvocation(#[source] io::Error),

    /// Configuration file could not be read or parsed
    #[error("failed to load config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}
