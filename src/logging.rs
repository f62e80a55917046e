use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr, filtered by `RUST_LOG` (default `info`).
///
/// Stdout is left to command output so `track` can be piped.
pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}
