//! Diagnostic logging
//!
//! Everything the library reports (dropped mutations, rejected rows, mode
//! changes) goes through `tracing`. The binary installs one fmt layer on
//! stderr so stdout stays free for command output.

use tracing::metadata::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Variable holding an `EnvFilter` directive, e.g. `workdesk=debug`
pub const LOG_ENV: &str = "WORKDESK_LOG";

pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Install the global subscriber. `WORKDESK_LOG` wins over `verbosity`.
/// Calling this twice is harmless; the second call is ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbosity).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = Registry::default().with(layer).with(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0), LevelFilter::WARN);
        assert_eq!(level_from_verbosity(1), LevelFilter::INFO);
        assert_eq!(level_from_verbosity(5), LevelFilter::DEBUG);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(0);
        init(2);
        tracing::warn!("still logging");
    }
}
