//! External analysis tool runner
//!
//! Spawns the fpcalc process with a structured argument list and a bounded
//! wait, capturing standard output as text. Has no knowledge of fingerprint
//! semantics.

use crate::error::FingerprintError;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout for fingerprinting invocations
pub const FINGERPRINT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Timeout for the availability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Abstraction over the external tool invocation, stubbed in tests
pub trait ToolRunner: Send + Sync {
    /// Run the tool and return whatever stdout text was captured, even if
    /// empty or truncated by the timeout.
    fn run(&self, args: &[OsString], timeout: Duration) -> Result<String, FingerprintError>;
}

/// Runs the real fpcalc binary
pub struct FpcalcRunner {
    binary: PathBuf,
}

impl FpcalcRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for FpcalcRunner {
    fn default() -> Self {
        Self::new("fpcalc")
    }
}

impl ToolRunner for FpcalcRunner {
    fn run(&self, args: &[OsString], timeout: Duration) -> Result<String, FingerprintError> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(FingerprintError::ToolInvocation)?;

        // Drain stdout on a separate thread so a full pipe cannot stall the
        // child while we wait on it.
        let mut stdout = child.stdout.take().ok_or_else(|| {
            FingerprintError::ToolInvocation(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "child stdout was not captured",
            ))
        })?;
        let reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });

        match child
            .wait_timeout(timeout)
            .map_err(FingerprintError::ToolInvocation)?
        {
            Some(status) => {
                log::debug!("{} exited with {}", self.binary.display(), status);
            }
            None => {
                // Timed out. Kill and reap the child; whatever output it
                // managed to produce is still returned (best-effort).
                log::warn!(
                    "{} did not exit within {:?}, killing",
                    self.binary.display(),
                    timeout
                );
                let _ = child.kill();
                let _ = child.wait();
            }
        }

        let captured = reader.join().unwrap_or_default();
        Ok(String::from_utf8_lossy(&captured).into_owned())
    }
}
