//! Tracing subscriber setup for the service binary.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Install the global tracing subscriber.
pub fn init_tracing(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| Error::invalid_input(format!("invalid log filter {filter:?}: {err}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| Error::other(format!("failed to install tracing subscriber: {err}")))
}
