use tracing_subscriber::EnvFilter;

use crate::domain::{ApplicationState, LogLevel};
use crate::error::{CmdlineError, Result};

/// Filter for `level`; `RUST_LOG` takes precedence when set.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Installs a global fmt subscriber writing to stderr.
pub fn init(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level))
        .try_init()
        .map_err(|e| CmdlineError::Logging(e.to_string()))
}

/// Installs the subscriber at the level the parsed options resolved to.
pub fn init_from_state(state: &ApplicationState) -> Result<()> {
    init(state.log_level())
}
