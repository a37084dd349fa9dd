//! Logging initialization built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Initialize logging for a consuming process. Filter comes from
/// `JOBPIPE_LOG` (falling back to `warn`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("JOBPIPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
    Ok(())
}

/// Test-friendly init: captures output per test, ignores double installs.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
