use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (normally
/// `RefundConfig::log_level`) is used. Safe to call once per process;
/// subsequent calls fail with an error rather than panicking, so tests can
/// race to install it.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_filter() {
        // An unparsable directive should surface as an error, not install a
        // broken subscriber.
        let result = init_tracing("this is not [ a filter");
        if std::env::var("RUST_LOG").is_err() {
            assert!(result.is_err());
        }
    }
}
