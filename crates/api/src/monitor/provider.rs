//! System load provider.
//!
//! Reads the host's 1-minute load average: `/proc/loadavg` on Linux,
//! `sysctl -n vm.loadavg` on macOS. The core count comes from
//! `std::thread::available_parallelism`.

use async_trait::async_trait;

use loadwatch_core::error::CoreError;
use loadwatch_core::load::LoadProvider;

/// [`LoadProvider`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoadProvider;

impl SystemLoadProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LoadProvider for SystemLoadProvider {
    async fn load_average(&self) -> Result<f64, CoreError> {
        let raw = read_load_average().await?;
        parse_load_average(&raw)
    }

    async fn num_cores(&self) -> Result<usize, CoreError> {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .map_err(|e| CoreError::Provider(format!("core count unavailable: {e}")))
    }
}

#[cfg(target_os = "linux")]
async fn read_load_average() -> Result<String, CoreError> {
    tokio::fs::read_to_string("/proc/loadavg")
        .await
        .map_err(|e| CoreError::Provider(format!("/proc/loadavg: {e}")))
}

/// `sysctl -n vm.loadavg` prints `{ 2.49 2.15 2.12 }`; the braces are
/// stripped by the parser.
#[cfg(target_os = "macos")]
async fn read_load_average() -> Result<String, CoreError> {
    let output = tokio::process::Command::new("sysctl")
        .args(["-n", "vm.loadavg"])
        .output()
        .await
        .map_err(|e| CoreError::Provider(format!("sysctl vm.loadavg: {e}")))?;

    String::from_utf8(output.stdout)
        .map_err(|e| CoreError::Provider(format!("sysctl output not UTF-8: {e}")))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
async fn read_load_average() -> Result<String, CoreError> {
    Err(CoreError::Provider(
        "load average is not available on this platform".into(),
    ))
}

/// Parse the first (1-minute) field of the provider output.
fn parse_load_average(raw: &str) -> Result<f64, CoreError> {
    let trimmed = raw
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim();

    let first = trimmed
        .split_whitespace()
        .next()
        .ok_or_else(|| CoreError::Malformed(raw.trim().to_string()))?;

    first
        .parse::<f64>()
        .map_err(|_| CoreError::Malformed(first.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
