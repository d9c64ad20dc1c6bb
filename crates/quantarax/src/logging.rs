//! Logging initialization

use std::io;

use tracing_subscriber::EnvFilter;

/// Initialize logging based on verbosity level. `-v`/`-vv`/`-vvv` raise the
/// default level from `warn` up through `trace`; `--quiet` forces `error`
/// and overrides verbosity. `QUANTARAX_LOG` overrides both when set.
pub fn init_logging(verbosity: u8, quiet: bool) -> io::Result<()> {
    let default_level = if quiet {
        "error"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env("QUANTARAX_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
