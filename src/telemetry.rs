//! Log output setup
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. `RUST_LOG` takes precedence over `default_filter`.
///
/// Returns an error if a global subscriber is already set.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Default filter: verbose for this crate, quiet for sled.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tutoring_subscriptions=debug,sled=warn"
    } else {
        "tutoring_subscriptions=info,sled=warn"
    }
}
